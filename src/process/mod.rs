use std::fmt;
use std::str::FromStr;

pub mod record;

/// Identifier of a process at the time it was sampled.
///
/// Always positive. A `Pid` is only a key: the process it names may be gone by
/// the time it is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pid(u32);

impl Pid {
    pub fn new(raw: u32) -> Option<Pid> {
        if raw == 0 { None } else { Some(Pid(raw)) }
    }

    pub fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidPid(pub String);

impl fmt::Display for InvalidPid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid PID `{}`", self.0)
    }
}

impl std::error::Error for InvalidPid {}

impl FromStr for Pid {
    type Err = InvalidPid;

    /// Accepts decimal digits only, so `+5`, `-1` or `0x10` are rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(InvalidPid(s.to_string()));
        }
        s.parse::<u32>()
            .ok()
            .and_then(Pid::new)
            .ok_or_else(|| InvalidPid(s.to_string()))
    }
}

/// Point-in-time view of one process, produced fresh for every listing.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessSnapshot {
    pid: Pid,
    name: String,
    state: char,
    resident_kb: u64,
    virtual_kb: u64,
    cpu_percent: Option<f64>,
}

impl ProcessSnapshot {
    pub fn new(pid: Pid, name: String, state: char, resident_kb: u64, virtual_kb: u64) -> Self {
        ProcessSnapshot {
            pid,
            name,
            state,
            resident_kb,
            virtual_kb,
            cpu_percent: None,
        }
    }

    /// Returns a copy carrying the CPU utilization computed by the caller.
    pub fn with_cpu_percent(self, cpu_percent: f64) -> Self {
        ProcessSnapshot {
            cpu_percent: Some(cpu_percent),
            ..self
        }
    }

    pub fn pid(&self) -> Pid {
        self.pid
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> char {
        self.state
    }

    pub fn resident_kb(&self) -> u64 {
        self.resident_kb
    }

    pub fn virtual_kb(&self) -> u64 {
        self.virtual_kb
    }

    /// Average utilization since boot, if it was attached.
    pub fn cpu_percent(&self) -> Option<f64> {
        self.cpu_percent
    }
}
