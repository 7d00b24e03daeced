//! In-memory stand-ins for the provider and the controller.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::io;

use crate::error::{ControlError, ProviderError, RecordError};
use crate::manager::operations::{Priority, ProcessController};
use crate::process::Pid;
use crate::provider::{NamespaceEntry, ProcessInfoProvider, Record};

/// One synthetic process. Records default to a sleeping process with
/// 1 resident page and 2 virtual pages.
#[derive(Debug, Clone)]
pub struct FakeProcess {
    pid: u32,
    records: HashMap<Record, String>,
    denied: HashSet<Record>,
}

impl FakeProcess {
    pub fn new(pid: u32, name: &str) -> Self {
        let mut records = HashMap::new();
        records.insert(Record::Name, format!("{name}\n"));
        records.insert(
            Record::Status,
            format!("Name:\t{name}\nUmask:\t0022\nState:\tS (sleeping)\nPid:\t{pid}\n"),
        );
        records.insert(Record::Memory, "1 2".to_string());
        records.insert(Record::Stat, stat_line(pid, name, 0, 0));
        FakeProcess {
            pid,
            records,
            denied: HashSet::new(),
        }
    }

    pub fn state(mut self, code: char) -> Self {
        self.records
            .insert(Record::Status, format!("Name:\tfake\nState:\t{code} (fake)\n"));
        self
    }

    pub fn status(mut self, raw: &str) -> Self {
        self.records.insert(Record::Status, raw.to_string());
        self
    }

    pub fn pages(mut self, resident: u64, virt: u64) -> Self {
        self.records.insert(Record::Memory, format!("{resident} {virt}"));
        self
    }

    pub fn memory(mut self, raw: &str) -> Self {
        self.records.insert(Record::Memory, raw.to_string());
        self
    }

    pub fn ticks(mut self, user: u64, system: u64) -> Self {
        self.records
            .insert(Record::Stat, stat_line(self.pid, "fake", user, system));
        self
    }

    pub fn stat(mut self, raw: &str) -> Self {
        self.records.insert(Record::Stat, raw.to_string());
        self
    }

    /// The record reads as if the process exited.
    pub fn missing(mut self, record: Record) -> Self {
        self.records.remove(&record);
        self
    }

    pub fn denied(mut self, record: Record) -> Self {
        self.denied.insert(record);
        self
    }
}

fn stat_line(pid: u32, name: &str, user: u64, system: u64) -> String {
    format!("{pid} ({name}) S 1 {pid} {pid} 0 -1 4194304 100 0 0 0 {user} {system} 0 0 20 0 1 0 100 1000000 1 18446744073709551615\n")
}

/// Provider serving records from memory. Host records default to a 2-core
/// machine up for 100 seconds, 4 KiB pages and 100 ticks per second.
#[derive(Debug, Clone)]
pub struct FakeProvider {
    processes: HashMap<u32, FakeProcess>,
    extra_entries: Vec<NamespaceEntry>,
    namespace_readable: bool,
    cpuinfo: Option<String>,
    uptime: Option<String>,
    page_size: u64,
    clock_ticks: u64,
}

impl Default for FakeProvider {
    fn default() -> Self {
        FakeProvider {
            processes: HashMap::new(),
            extra_entries: Vec::new(),
            namespace_readable: true,
            cpuinfo: Some("processor\t: 0\n\nprocessor\t: 1\n".to_string()),
            uptime: Some("100.00 150.00\n".to_string()),
            page_size: 4096,
            clock_ticks: 100,
        }
    }
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_process(mut self, process: FakeProcess) -> Self {
        self.processes.insert(process.pid, process);
        self
    }

    pub fn with_entry(mut self, entry: NamespaceEntry) -> Self {
        self.extra_entries.push(entry);
        self
    }

    pub fn without_namespace(mut self) -> Self {
        self.namespace_readable = false;
        self
    }

    pub fn with_cpuinfo(mut self, raw: &str) -> Self {
        self.cpuinfo = Some(raw.to_string());
        self
    }

    pub fn without_cpuinfo(mut self) -> Self {
        self.cpuinfo = None;
        self
    }

    pub fn with_uptime(mut self, raw: &str) -> Self {
        self.uptime = Some(raw.to_string());
        self
    }

    pub fn without_uptime(mut self) -> Self {
        self.uptime = None;
        self
    }

    pub fn with_page_size(mut self, page_size: u64) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_clock_ticks(mut self, hz: u64) -> Self {
        self.clock_ticks = hz;
        self
    }
}

fn not_found(path: &str) -> ProviderError {
    ProviderError::from_io(path, io::Error::from(io::ErrorKind::NotFound))
}

impl ProcessInfoProvider for FakeProvider {
    fn namespace_entries(&self) -> Result<Vec<NamespaceEntry>, ProviderError> {
        if !self.namespace_readable {
            return Err(ProviderError::from_io(
                "fake",
                io::Error::from(io::ErrorKind::PermissionDenied),
            ));
        }
        let mut entries: Vec<_> = self
            .processes
            .keys()
            .map(|pid| NamespaceEntry::dir(pid.to_string()))
            .collect();
        entries.extend(self.extra_entries.iter().cloned());
        Ok(entries)
    }

    fn read_record(&self, pid: Pid, record: Record) -> Result<String, RecordError> {
        let path = format!("fake/{pid}/{record:?}");
        let process = self
            .processes
            .get(&pid.as_u32())
            .ok_or_else(|| not_found(&path))?;
        if process.denied.contains(&record) {
            return Err(ProviderError::from_io(
                path,
                io::Error::from(io::ErrorKind::PermissionDenied),
            )
            .into());
        }
        process
            .records
            .get(&record)
            .cloned()
            .ok_or_else(|| not_found(&path).into())
    }

    fn cpu_descriptor(&self) -> Result<String, ProviderError> {
        self.cpuinfo.clone().ok_or_else(|| not_found("fake/cpuinfo"))
    }

    fn uptime(&self) -> Result<String, ProviderError> {
        self.uptime.clone().ok_or_else(|| not_found("fake/uptime"))
    }

    fn page_size(&self) -> u64 {
        self.page_size
    }

    fn clock_ticks_per_second(&self) -> u64 {
        self.clock_ticks
    }
}

/// Controller that records commands instead of issuing them.
///
/// Unknown PIDs fail with `NotFound`; PIDs marked protected fail with
/// `PermissionDenied`, as an unprivileged caller would see for another
/// user's process.
#[derive(Debug, Default)]
pub struct FakeController {
    priorities: RefCell<HashMap<Pid, Priority>>,
    protected: HashSet<Pid>,
    terminated: RefCell<Vec<Pid>>,
}

impl FakeController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_process(self, pid: u32, priority: i32) -> Self {
        let (pid, priority) = (pid_of(pid), priority_of(priority));
        self.priorities.borrow_mut().insert(pid, priority);
        self
    }

    pub fn with_protected(mut self, pid: u32) -> Self {
        let pid = pid_of(pid);
        self.priorities.borrow_mut().entry(pid).or_insert(priority_of(0));
        self.protected.insert(pid);
        self
    }

    pub fn terminated(&self) -> Vec<Pid> {
        self.terminated.borrow().clone()
    }

    fn check(&self, pid: Pid) -> Result<(), ControlError> {
        if !self.priorities.borrow().contains_key(&pid) {
            return Err(ControlError::NotFound(pid));
        }
        if self.protected.contains(&pid) {
            return Err(ControlError::PermissionDenied(pid));
        }
        Ok(())
    }
}

fn pid_of(raw: u32) -> Pid {
    Pid::new(raw).expect("fake pid must be positive")
}

fn priority_of(value: i32) -> Priority {
    Priority::new(value).expect("fake priority must be in range")
}

impl ProcessController for FakeController {
    fn terminate(&self, pid: Pid) -> Result<(), ControlError> {
        self.check(pid)?;
        self.priorities.borrow_mut().remove(&pid);
        self.terminated.borrow_mut().push(pid);
        Ok(())
    }

    fn set_priority(&self, pid: Pid, priority: Priority) -> Result<(), ControlError> {
        self.check(pid)?;
        self.priorities.borrow_mut().insert(pid, priority);
        Ok(())
    }

    fn get_priority(&self, pid: Pid) -> Result<Priority, ControlError> {
        // Reading another user's priority is allowed; only changes are refused
        self.priorities
            .borrow()
            .get(&pid)
            .copied()
            .ok_or(ControlError::NotFound(pid))
    }
}
