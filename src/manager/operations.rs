use std::fmt;

use nix::errno::Errno;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid as NixPid;

use libc::{getpriority, id_t, setpriority, PRIO_PROCESS};

use crate::error::ControlError;
use crate::process::Pid;

pub const MIN_PRIORITY: i32 = -20;
pub const MAX_PRIORITY: i32 = 19;

/// Scheduling niceness; lower is scheduled more favorably.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Priority(i32);

impl Priority {
    pub fn new(value: i32) -> Result<Priority, ControlError> {
        if (MIN_PRIORITY..=MAX_PRIORITY).contains(&value) {
            Ok(Priority(value))
        } else {
            Err(ControlError::InvalidPriority(value))
        }
    }

    pub fn value(self) -> i32 {
        self.0
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Single request/response commands against a process.
pub trait ProcessController {
    /// Sends an uncatchable kill. Success means the OS accepted the signal,
    /// not that the process is already gone.
    fn terminate(&self, pid: Pid) -> Result<(), ControlError>;

    fn set_priority(&self, pid: Pid, priority: Priority) -> Result<(), ControlError>;

    fn get_priority(&self, pid: Pid) -> Result<Priority, ControlError>;
}

/// Controller that talks to the kernel through signals and the priority syscalls.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemController;

fn raw_pid(pid: Pid) -> Result<i32, ControlError> {
    // Anything that does not fit a positive pid_t cannot name a live process
    i32::try_from(pid.as_u32()).map_err(|_| ControlError::NotFound(pid))
}

impl ProcessController for SystemController {
    //Kill (Force terminate)
    fn terminate(&self, pid: Pid) -> Result<(), ControlError> {
        let nix_pid = NixPid::from_raw(raw_pid(pid)?);

        signal::kill(nix_pid, Signal::SIGKILL).map_err(|errno| ControlError::from_errno(pid, errno))
    }

    fn set_priority(&self, pid: Pid, priority: Priority) -> Result<(), ControlError> {
        let raw = raw_pid(pid)?;

        let res = unsafe { setpriority(PRIO_PROCESS, raw as id_t, priority.value()) };

        if res == 0 {
            Ok(())
        } else {
            Err(ControlError::from_errno(pid, Errno::last()))
        }
    }

    fn get_priority(&self, pid: Pid) -> Result<Priority, ControlError> {
        let raw = raw_pid(pid)?;

        // -1 is a valid niceness, so errno is the only failure signal
        Errno::clear();
        let value = unsafe { getpriority(PRIO_PROCESS, raw as id_t) };

        if value == -1 {
            let errno = Errno::last();
            if errno != Errno::UnknownErrno {
                return Err(ControlError::from_errno(pid, errno));
            }
        }
        Ok(Priority(value))
    }
}
