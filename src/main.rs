use std::io;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use lpm_inspector::Manager;
use lpm_inspector::cli::Cli;
use lpm_inspector::manager::operations::SystemController;
use lpm_inspector::provider::{ProcFs, ProcessInfoProvider};
use lpm_inspector::shell::Shell;

fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level())
        .init();

    let provider = ProcFs::new(&cli.proc_root);

    // Only startup failure exits non-zero; later errors are reported per command
    provider
        .namespace_entries()
        .with_context(|| format!("cannot read process namespace at {}", cli.proc_root.display()))?;
    info!("Reading processes from {}", provider.root().display());

    let manager = Manager::new(provider, SystemController);

    let stdin = io::stdin();
    let stdout = io::stdout();
    Shell::new(&manager, stdin.lock(), stdout.lock())
        .with_cpu_column(cli.cpu)
        .run()?;

    Ok(())
}
