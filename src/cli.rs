use std::path::PathBuf;

use clap::Parser;
use log::LevelFilter;

/// Point-in-time process inspector and controller.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Root of the process information namespace.
    #[arg(long, value_name = "DIR", default_value = "/proc")]
    pub proc_root: PathBuf,

    /// Show average CPU utilization since boot in process listings.
    #[arg(long)]
    pub cpu: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cli = Cli::parse_from(["lpm-inspector"]);
        assert_eq!(cli.proc_root, PathBuf::from("/proc"));
        assert!(!cli.cpu);
        assert_eq!(cli.log_level(), LevelFilter::Warn);
    }

    #[test]
    fn flags() {
        let cli = Cli::parse_from(["lpm-inspector", "--proc-root", "/tmp/fake", "--cpu", "-vv"]);
        assert_eq!(cli.proc_root, PathBuf::from("/tmp/fake"));
        assert!(cli.cpu);
        assert_eq!(cli.log_level(), LevelFilter::Debug);
    }
}
