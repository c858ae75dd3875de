use std::process::ExitCode;

use clap::Parser;
use toolrun_core::api::{load_default, load_from_path, AppConfig};

mod commands;
mod error;
mod logging;

use commands::cli;
use error::CliError;

#[tokio::main]
async fn main() -> ExitCode {
    let args = cli::Args::parse();
    match real_main(args).await {
        Ok(code) => ExitCode::from(code.clamp(0, 255) as u8),
        Err(e) => {
            eprintln!("error: {}", e);
            let mut source = std::error::Error::source(&e);
            while let Some(cause) = source {
                eprintln!("  caused by: {}", cause);
                source = cause.source();
            }
            ExitCode::from(2)
        }
    }
}

async fn real_main(args: cli::Args) -> Result<i32, CliError> {
    let cfg = load_config(args.config.as_deref())?;
    let _log_guard = logging::init_logging(&cfg.logging)?;
    dispatch(args.command, cfg).await
}

fn load_config(path: Option<&str>) -> Result<AppConfig, CliError> {
    let cfg = match path {
        Some(p) => load_from_path(p)?,
        None => load_default()?,
    };
    Ok(cfg)
}

async fn dispatch(cmd: cli::Commands, cfg: AppConfig) -> Result<i32, CliError> {
    match cmd {
        cli::Commands::Run(run_args) => commands::run::run_cmd(cfg, run_args).await,
        cli::Commands::Config(config_args) => {
            commands::config::config_cmd(&cfg, config_args.check)?;
            Ok(0)
        }
    }
}
