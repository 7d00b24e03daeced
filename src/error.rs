use std::io;
use std::path::PathBuf;

use nix::errno::Errno;
use thiserror::Error;

use crate::process::Pid;

/// Failure to read a record from the process information provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The record is gone, usually because the process exited after it was listed.
    #[error("{}: no such record", .path.display())]
    NotFound { path: PathBuf },

    #[error("{}: permission denied", .path.display())]
    PermissionDenied { path: PathBuf },

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ProviderError {
    pub fn from_io(path: impl Into<PathBuf>, err: io::Error) -> Self {
        let path = path.into();
        // Reading /proc/<pid>/* of a process that exits mid-read yields ESRCH, not ENOENT
        if err.kind() == io::ErrorKind::NotFound || err.raw_os_error() == Some(libc::ESRCH) {
            ProviderError::NotFound { path }
        } else if err.kind() == io::ErrorKind::PermissionDenied {
            ProviderError::PermissionDenied { path }
        } else {
            ProviderError::Io { path, source: err }
        }
    }

    /// True for the expected race where a process disappeared between listing and reading.
    pub fn is_absent(&self) -> bool {
        matches!(self, ProviderError::NotFound { .. })
    }
}

/// A record was read but did not have the expected shape.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("record is empty")]
    Empty,

    #[error("missing `{0}` field")]
    MissingField(&'static str),

    #[error("invalid {field} value `{value}`")]
    InvalidValue { field: &'static str, value: String },
}

/// Errors from a single process read during enumeration.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl RecordError {
    pub fn is_absent(&self) -> bool {
        matches!(self, RecordError::Provider(e) if e.is_absent())
    }
}

/// A derived metric (CPU utilization, core count) could not be produced.
#[derive(Debug, Error)]
pub enum MetricError {
    #[error(transparent)]
    Record(#[from] RecordError),

    #[error("no logical cores reported")]
    NoCores,

    #[error("uptime {0}s is not positive")]
    NonPositiveUptime(f64),

    #[error("clock tick rate is zero")]
    ZeroTickRate,

    #[error("sampling interval is zero")]
    ZeroInterval,

    #[error("utilization {0} is not a finite value")]
    NotFinite(f64),
}

impl MetricError {
    /// True when the process vanished before its record could be read.
    pub fn is_absent(&self) -> bool {
        matches!(self, MetricError::Record(e) if e.is_absent())
    }
}

impl From<ProviderError> for MetricError {
    fn from(e: ProviderError) -> Self {
        MetricError::Record(RecordError::Provider(e))
    }
}

impl From<ParseError> for MetricError {
    fn from(e: ParseError) -> Self {
        MetricError::Record(RecordError::Parse(e))
    }
}

/// A control command (kill, priority) was refused.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ControlError {
    #[error("no such process: {0}")]
    NotFound(Pid),

    #[error("permission denied for PID {0}")]
    PermissionDenied(Pid),

    #[error("priority {0} is outside the range -20..=19")]
    InvalidPriority(i32),

    #[error("PID {pid}: {errno}")]
    Os { pid: Pid, errno: Errno },
}

impl ControlError {
    pub fn from_errno(pid: Pid, errno: Errno) -> Self {
        match errno {
            Errno::ESRCH => ControlError::NotFound(pid),
            Errno::EPERM | Errno::EACCES => ControlError::PermissionDenied(pid),
            errno => ControlError::Os { pid, errno },
        }
    }
}
