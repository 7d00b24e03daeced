//! Source of raw per-process and host-wide records.
//!
//! The real implementation reads a `/proc`-style directory tree; tests swap in
//! the in-memory double from `crate::testing` or point `ProcFs` at a temp dir.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ParseError, ProviderError, RecordError};
use crate::process::Pid;

/// The per-process records a provider exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Record {
    /// Executable name, one line.
    Name,
    /// Multi-line `Key: value` block holding a `State:` line.
    Status,
    /// `"<resident> <virtual>"` page counts.
    Memory,
    /// Single space-delimited line; fields 14 and 15 are user and system ticks.
    Stat,
}

/// One entry of the provider's process namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceEntry {
    pub name: String,
    pub is_dir: bool,
}

impl NamespaceEntry {
    pub fn dir(name: impl Into<String>) -> Self {
        NamespaceEntry {
            name: name.into(),
            is_dir: true,
        }
    }

    pub fn file(name: impl Into<String>) -> Self {
        NamespaceEntry {
            name: name.into(),
            is_dir: false,
        }
    }
}

pub trait ProcessInfoProvider {
    /// Every entry at the top of the namespace, processes and otherwise.
    fn namespace_entries(&self) -> Result<Vec<NamespaceEntry>, ProviderError>;

    /// Raw text of one record for `pid`. A missing record is `ProviderError::NotFound`.
    fn read_record(&self, pid: Pid, record: Record) -> Result<String, RecordError>;

    /// Host CPU descriptor with one `processor` entry per logical core.
    fn cpu_descriptor(&self) -> Result<String, ProviderError>;

    /// Host uptime record; its first field is seconds since boot.
    fn uptime(&self) -> Result<String, ProviderError>;

    fn page_size(&self) -> u64;

    fn clock_ticks_per_second(&self) -> u64;
}

/// Provider backed by a procfs mount (or any directory laid out like one).
#[derive(Debug, Clone)]
pub struct ProcFs {
    root: PathBuf,
}

impl ProcFs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        ProcFs { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn read(&self, path: PathBuf) -> Result<String, ProviderError> {
        fs::read_to_string(&path).map_err(|e| ProviderError::from_io(path, e))
    }
}

impl Default for ProcFs {
    fn default() -> Self {
        ProcFs::new("/proc")
    }
}

impl ProcessInfoProvider for ProcFs {
    fn namespace_entries(&self) -> Result<Vec<NamespaceEntry>, ProviderError> {
        let dir = fs::read_dir(&self.root).map_err(|e| ProviderError::from_io(&self.root, e))?;

        let mut entries = Vec::new();
        for entry in dir {
            // An entry vanishing mid-walk is the same race as a process exiting
            let Ok(entry) = entry else { continue };
            let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
            entries.push(NamespaceEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                is_dir,
            });
        }
        Ok(entries)
    }

    fn read_record(&self, pid: Pid, record: Record) -> Result<String, RecordError> {
        let dir = self.root.join(pid.to_string());
        match record {
            Record::Name => Ok(self.read(dir.join("comm"))?),
            Record::Status => Ok(self.read(dir.join("status"))?),
            Record::Stat => Ok(self.read(dir.join("stat"))?),
            Record::Memory => {
                // statm lists total program size before resident set size
                let statm = self.read(dir.join("statm"))?;
                let mut fields = statm.split_whitespace();
                let size = fields.next().ok_or(ParseError::MissingField("size"))?;
                let resident = fields.next().ok_or(ParseError::MissingField("resident"))?;
                Ok(format!("{resident} {size}"))
            }
        }
    }

    fn cpu_descriptor(&self) -> Result<String, ProviderError> {
        self.read(self.root.join("cpuinfo"))
    }

    fn uptime(&self) -> Result<String, ProviderError> {
        self.read(self.root.join("uptime"))
    }

    fn page_size(&self) -> u64 {
        procfs::page_size()
    }

    fn clock_ticks_per_second(&self) -> u64 {
        procfs::ticks_per_second()
    }
}
