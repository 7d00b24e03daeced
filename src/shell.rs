//! Menu-driven front end: one blocking prompt per cycle, one command at a time.

use std::io::{self, BufRead, Write};

use crate::manager::Manager;
use crate::manager::operations::ProcessController;
use crate::process::{Pid, ProcessSnapshot};
use crate::provider::ProcessInfoProvider;

const MENU: &str = "\n1. List processes\n\
                    2. Kill process\n\
                    3. CPU Usage\n\
                    4. Number Of CPUs\n\
                    5. Set Process Priority\n\
                    6. Get Process Priority\n\
                    7. Quit\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

pub struct Shell<'a, P, C, R, W> {
    manager: &'a Manager<P, C>,
    input: R,
    output: W,
    show_cpu: bool,
}

impl<'a, P, C, R, W> Shell<'a, P, C, R, W>
where
    P: ProcessInfoProvider,
    C: ProcessController,
    R: BufRead,
    W: Write,
{
    pub fn new(manager: &'a Manager<P, C>, input: R, output: W) -> Self {
        Shell {
            manager,
            input,
            output,
            show_cpu: false,
        }
    }

    /// Adds a CPU column to listings.
    pub fn with_cpu_column(mut self, show_cpu: bool) -> Self {
        self.show_cpu = show_cpu;
        self
    }

    /// Runs until the quit command or end of input. Only I/O errors on the
    /// shell's own streams end it early; command failures are printed.
    pub fn run(&mut self) -> io::Result<()> {
        writeln!(self.output, "\n\n\n\t\t\t\t\t\tTASK MANAGER")?;
        loop {
            write!(self.output, "{MENU}")?;
            let Some(line) = self.prompt("Choose an option: ")? else {
                return self.farewell();
            };

            let flow = match line.trim().parse::<u32>() {
                Ok(1) => self.list_processes()?,
                Ok(2) => self.kill_process()?,
                Ok(3) => self.cpu_usage()?,
                Ok(4) => self.num_cpus()?,
                Ok(5) => self.set_priority()?,
                Ok(6) => self.get_priority()?,
                Ok(7) => Flow::Quit,
                _ => {
                    writeln!(self.output, "Invalid Choice Re-try")?;
                    Flow::Continue
                }
            };

            if flow == Flow::Quit {
                return self.farewell();
            }
            writeln!(self.output)?;
        }
    }

    fn farewell(&mut self) -> io::Result<()> {
        writeln!(self.output, "Thank You for using Task Manager")?;
        self.output.flush()
    }

    /// `None` at end of input.
    fn prompt(&mut self, text: &str) -> io::Result<Option<String>> {
        write!(self.output, "{text}")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn prompt_pid(&mut self, text: &str) -> io::Result<Option<Result<Pid, String>>> {
        Ok(self
            .prompt(text)?
            .map(|line| line.parse::<Pid>().map_err(|e| e.to_string())))
    }

    fn error(&mut self, message: impl std::fmt::Display) -> io::Result<Flow> {
        writeln!(self.output, "Error: {message}")?;
        Ok(Flow::Continue)
    }

    fn list_processes(&mut self) -> io::Result<Flow> {
        let listing = if self.show_cpu {
            self.manager.list_with_cpu()
        } else {
            self.manager.list()
        };
        let rows = match listing {
            Ok(rows) => rows,
            Err(e) => return self.error(e),
        };

        // The prompt leaves the cursor on its line when input is piped
        writeln!(self.output)?;
        let cpu_header = if self.show_cpu { format!("{:>8}  ", "CPU(%)") } else { String::new() };
        writeln!(
            self.output,
            "{:<8} {:<7} {:>10} {:>10}  {cpu_header}{}",
            "PID", "STATUS", "RSS(KB)", "VSZ(KB)", "NAME"
        )?;
        for row in &rows {
            let line = self.format_row(row);
            writeln!(self.output, "{line}")?;
        }
        Ok(Flow::Continue)
    }

    fn format_row(&self, row: &ProcessSnapshot) -> String {
        let cpu = if self.show_cpu {
            match row.cpu_percent() {
                Some(pct) => format!("{pct:>8.2}  "),
                None => format!("{:>8}  ", "n/a"),
            }
        } else {
            String::new()
        };
        format!(
            "{:<8} {:<7} {:>10} {:>10}  {cpu}{}",
            row.pid(),
            row.state(),
            row.resident_kb(),
            row.virtual_kb(),
            row.name()
        )
    }

    fn kill_process(&mut self) -> io::Result<Flow> {
        let pid = match self.prompt_pid("Enter the PID of the process to kill: ")? {
            None => return Ok(Flow::Quit),
            Some(Err(e)) => return self.error(e),
            Some(Ok(pid)) => pid,
        };
        match self.manager.kill(pid) {
            Ok(()) => Ok(Flow::Continue),
            Err(e) => self.error(e),
        }
    }

    fn cpu_usage(&mut self) -> io::Result<Flow> {
        let pid = match self.prompt_pid("Enter PID to check CPU Usage: ")? {
            None => return Ok(Flow::Quit),
            Some(Err(e)) => return self.error(e),
            Some(Ok(pid)) => pid,
        };
        match self.manager.cpu_usage(pid) {
            Ok(pct) => {
                writeln!(self.output, "CPU Usage for PID {pid}: {pct:.2}%")?;
                Ok(Flow::Continue)
            }
            Err(e) => self.error(format!("CPU usage unavailable for PID {pid}: {e}")),
        }
    }

    fn num_cpus(&mut self) -> io::Result<Flow> {
        match self.manager.num_cpus() {
            Ok(n) => {
                writeln!(self.output, "No. of CPUs: {n}")?;
                Ok(Flow::Continue)
            }
            Err(e) => self.error(e),
        }
    }

    fn set_priority(&mut self) -> io::Result<Flow> {
        let pid = match self.prompt_pid("Enter PID to set its priority: ")? {
            None => return Ok(Flow::Quit),
            Some(Err(e)) => return self.error(e),
            Some(Ok(pid)) => pid,
        };
        let Some(line) = self.prompt("Enter Priority: ")? else {
            return Ok(Flow::Quit);
        };
        let nice_value = match line.parse::<i32>() {
            Ok(value) => value,
            Err(_) => return self.error(format!("invalid priority `{line}`")),
        };
        match self.manager.set_priority(pid, nice_value) {
            Ok(()) => Ok(Flow::Continue),
            Err(e) => self.error(e),
        }
    }

    fn get_priority(&mut self) -> io::Result<Flow> {
        let pid = match self.prompt_pid("Enter PID to check its priority: ")? {
            None => return Ok(Flow::Quit),
            Some(Err(e)) => return self.error(e),
            Some(Ok(pid)) => pid,
        };
        match self.manager.get_priority(pid) {
            Ok(priority) => {
                writeln!(self.output, "Process Priority: {priority}")?;
                Ok(Flow::Continue)
            }
            Err(e) => self.error(e),
        }
    }
}
