//! Command dispatch functions
//!
//! Opens the target kernel once and routes each subcommand to its handler.

use anyhow::{Context, Result};
use kview::Program;

use crate::cli::{Cli, Commands, TargetArgs};
use crate::commands;
use crate::config::Config;

pub fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Configure { key, value, show } => commands::configure::handle(key, value, show),
        command => {
            let prog = open_program(&cli.target)?;
            dispatch_lookup(&prog, command)
        }
    }
}

fn open_program(target: &TargetArgs) -> Result<Program> {
    let paths = Config::load()?.target_paths(target);
    tracing::debug!(?paths, "opening kernel");
    Program::open(&paths).with_context(|| {
        format!(
            "Failed to open kernel (core {}, symbols {}, types {})",
            paths.core.display(),
            paths.kallsyms.display(),
            paths.btf.display()
        )
    })
}

/// Dispatch the subcommands that read the kernel
fn dispatch_lookup(prog: &Program, command: Commands) -> Result<()> {
    match command {
        Commands::Task { pid } => commands::task::handle(prog, pid),

        Commands::Kexpr { pid, device, path } => {
            commands::kexpr::handle(prog, pid, device.as_ref(), &path)
        }

        Commands::Busdev { bus, name, drvdata } => {
            commands::bus::devices(prog, bus, name.as_deref(), drvdata.as_deref())
        }

        Commands::Busdrv { bus, name } => commands::bus::drivers(prog, bus, name.as_deref()),

        Commands::Irq { irq } => commands::irq::handle(prog, irq),

        Commands::Offsetof { ty, member } => commands::offsetof::handle(prog, &ty, &member),

        Commands::Read { address, size } => commands::read::handle(prog, &address, size),

        Commands::Sym { addresses } => commands::sym::handle(prog, &addresses),

        Commands::Configure { key, value, show } => commands::configure::handle(key, value, show),
    }
}
