use clap::{Args as ClapArgs, Parser, Subcommand};

#[derive(Parser, Debug, Clone)]
#[command(name = "toolrun", version, about = "Run an operation under timeouts, validation and retry")]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file; defaults to ./config.toml when present.
    #[arg(long, global = true)]
    pub config: Option<String>,
}

#[derive(ClapArgs, Debug, Clone, Default)]
pub struct RunArgs {
    /// Replay events from a JSONL file instead of the configured operation.
    #[arg(long, group = "source")]
    pub replay: Option<String>,

    /// Run this program instead of the configured operation.
    /// Its arguments follow `--`.
    #[arg(long, group = "source")]
    pub program: Option<String>,

    #[arg(last = true)]
    pub program_args: Vec<String>,

    /// Operation name used in results and events-out records.
    #[arg(long)]
    pub name: Option<String>,

    /// Operation arguments as a JSON object.
    #[arg(long, default_value = "{}")]
    pub args: String,

    /// Execution context as a JSON object.
    #[arg(long, default_value = "{}")]
    pub context: String,

    /// Write events as JSONL to this file (or `stdout:`).
    #[arg(long)]
    pub events_out: Option<String>,

    #[arg(long)]
    pub max_attempts: Option<u32>,

    #[arg(long)]
    pub idle_timeout: Option<u64>,

    #[arg(long)]
    pub hard_timeout: Option<u64>,
}

#[derive(ClapArgs, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// Only check the configuration; print warnings but not the config.
    #[arg(long, default_value_t = false)]
    pub check: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run one operation and print its result as JSON.
    Run(RunArgs),
    /// Print the effective configuration.
    Config(ConfigArgs),
}
