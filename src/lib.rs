//! Point-in-time inspection and control of the processes on one host.
//!
//! Processes are read through a [`provider::ProcessInfoProvider`] (normally
//! `/proc`), turned into [`process::ProcessSnapshot`] values, and controlled
//! through a [`manager::operations::ProcessController`]. Nothing is kept
//! between commands.

pub mod cli;
pub mod error;
pub mod manager;
pub mod process;
pub mod provider;
pub mod shell;
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use error::{ControlError, MetricError, ParseError, ProviderError, RecordError};
pub use manager::Manager;
pub use process::{Pid, ProcessSnapshot};
