use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(
    name = "manta",
    version,
    about = "A keyboard-driven terminal explorer for virtualization inventory."
)]
pub struct CliArgs {
    /// Inventory file (YAML) with the materialized resource catalog
    #[arg(short, long, default_value = "inventory.yaml")]
    pub inventory: PathBuf,

    /// Resource kind to open first (vm, host, cluster, ds, ...)
    #[arg(short, long, default_value = "vm")]
    pub resource: String,

    /// Start in read-only mode
    #[arg(long)]
    pub read_only: bool,

    /// Context name for the loaded inventory
    #[arg(long, default_value = "default")]
    pub context: String,

    /// Actor recorded in the action audit trail
    #[arg(long, default_value = "operator")]
    pub actor: String,

    /// Optional config file with extra aliases and action tuning
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// tracing filter (for example: info,debug,trace)
    #[arg(long, default_value = "info")]
    pub log_filter: String,
}
