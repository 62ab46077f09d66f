//! Core CLI definitions

use clap::{ArgGroup, Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use kview::{BusKind, DeviceSelector, FieldPath};

#[derive(Parser, Debug)]
#[command(name = "kview", version)]
#[command(about = "Inspect live Linux kernel structures", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Log lookups to stderr (same as RUST_LOG=debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Where kernel memory, symbols and types are read from
///
/// Unset values fall back to the config file, then to the live system.
#[derive(Args, Debug, Default, Clone)]
pub struct TargetArgs {
    /// ELF core image of kernel memory [default: /proc/kcore]
    #[arg(long, global = true, env = "KVIEW_CORE", value_name = "FILE")]
    pub core: Option<PathBuf>,

    /// Symbol table in kallsyms or System.map format [default: /proc/kallsyms]
    #[arg(long, global = true, env = "KVIEW_KALLSYMS", value_name = "FILE")]
    pub kallsyms: Option<PathBuf>,

    /// Kernel BTF blob [default: /sys/kernel/btf/vmlinux]
    #[arg(long, global = true, env = "KVIEW_BTF", value_name = "FILE")]
    pub btf: Option<PathBuf>,

    /// Kernel release of the target, e.g. 6.7.0 [default: detected]
    #[arg(long, global = true, env = "KVIEW_RELEASE")]
    pub release: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List tasks, or dump one task_struct
    #[command(visible_alias = "t")]
    Task {
        /// pid of the task_struct
        #[arg(short, long)]
        pid: Option<i64>,
    },

    /// Print the address (or, with a leading '*', the value) of a field
    #[command(visible_alias = "k")]
    #[command(group(ArgGroup::new("selector").required(true).args(["pid", "device"])))]
    Kexpr {
        /// Resolve the path against the task with this pid
        #[arg(short, long)]
        pid: Option<i64>,

        /// Resolve the path against a bus device, e.g. 0000:00:1f.2@pci
        #[arg(short, long, value_name = "NAME@BUS")]
        device: Option<DeviceSelector>,

        /// Field path such as '*se.vruntime' or 'signal->thread_head'
        #[arg(default_value = "")]
        path: FieldPath,
    },

    /// List the devices on a bus, or dump one
    #[command(visible_alias = "dev")]
    Busdev {
        bus: BusKind,

        /// Name of the device
        #[arg(short = 'd', long = "dev")]
        name: Option<String>,

        /// Also dump dev->driver_data as this type, e.g. 'struct uart_8250_port'
        #[arg(long, value_name = "TYPE", requires = "name")]
        drvdata: Option<String>,
    },

    /// Dump the drivers registered on a bus
    #[command(visible_alias = "drv")]
    Busdrv {
        bus: BusKind,

        /// Only this driver
        #[arg(short = 'd', long = "drv")]
        name: Option<String>,
    },

    /// Dump the irq_desc of an interrupt and its trigger type
    Irq {
        /// Number of the irq
        irq: u32,
    },

    /// Print the offset of a member in a structure
    #[command(visible_alias = "off")]
    Offsetof {
        /// Structure, e.g. "struct task_struct"
        #[arg(value_name = "STRUCT")]
        ty: String,

        /// Member, possibly dotted (e.g. se.vruntime)
        member: String,
    },

    /// Hex dump kernel memory
    #[command(visible_alias = "r")]
    Read {
        /// Address (hex or decimal) or symbol name
        address: String,

        /// Number of bytes
        #[arg(short, long, default_value_t = 64)]
        size: usize,
    },

    /// Name the kernel symbol each address falls in
    Sym {
        /// Addresses, hex or decimal
        #[arg(required = true)]
        addresses: Vec<String>,
    },

    /// Configure default target paths
    #[command(visible_alias = "c")]
    Configure {
        /// Setting to change
        key: Option<ConfigKey>,

        /// New value; omit to clear the setting
        value: Option<String>,

        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    Core,
    Kallsyms,
    Btf,
    Release,
}
