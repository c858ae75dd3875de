use serde_json::{Map, Value};
use toolrun_core::api::{
    AppConfig, AppContext, CommandOperationConfig, OperationConfig, ReplayOperationConfig,
    RunResult,
};
use toolrun_plugins::build_operation;

use crate::commands::cli::RunArgs;
use crate::error::CliError;

/// Exit code for a run stopped by Ctrl-C.
pub const EXIT_INTERRUPTED: i32 = 130;

/// Runs one operation and prints its [`RunResult`] to stdout.
/// Returns the process exit code: 0 on success, 1 on failure.
pub async fn run_cmd(mut cfg: AppConfig, args: RunArgs) -> Result<i32, CliError> {
    apply_run_flags(&mut cfg, &args);
    let op_cfg = select_operation(&cfg, &args)?;
    let op = build_operation(&op_cfg).map_err(CliError::Operation)?;
    let op_args = parse_object("args", &args.args)?;
    let op_ctx = parse_object("context", &args.context)?;

    let app = AppContext::new(cfg).await?;
    let mut runner = app.runner()?;
    let run_id = AppContext::new_run_id();
    let sink = app.sink(&run_id, op.name());

    tracing::info!(target: "toolrun.cli", run_id = %run_id, operation = op.name(), "run started");

    let result = tokio::select! {
        result = runner.run(op.as_ref(), op_args, &op_ctx, sink.as_ref()) => Some(result),
        _ = tokio::signal::ctrl_c() => None,
    };

    drop(sink);
    app.shutdown().await;

    let Some(result) = result else {
        tracing::warn!(target: "toolrun.cli", run_id = %run_id, "run interrupted");
        return Ok(EXIT_INTERRUPTED);
    };
    println!("{}", render(&result));
    Ok(exit_code(&result))
}

fn apply_run_flags(cfg: &mut AppConfig, args: &RunArgs) {
    if let Some(path) = &args.events_out {
        cfg.events_out.enabled = true;
        cfg.events_out.path = path.clone();
    }
    if let Some(n) = args.max_attempts {
        cfg.retry.max_attempts = n;
    }
    if let Some(s) = args.idle_timeout {
        cfg.timeout.idle_timeout_s = s;
    }
    if let Some(s) = args.hard_timeout {
        cfg.timeout.hard_timeout_s = s;
    }
}

/// Flags win over the config's `[operation]` section.
fn select_operation(cfg: &AppConfig, args: &RunArgs) -> Result<OperationConfig, CliError> {
    if let Some(file) = &args.replay {
        return Ok(OperationConfig::Replay(ReplayOperationConfig {
            name: args.name.clone(),
            events_file: file.clone(),
        }));
    }
    if let Some(program) = &args.program {
        return Ok(OperationConfig::Command(CommandOperationConfig {
            name: args.name.clone(),
            program: program.clone(),
            args: args.program_args.clone(),
            ..CommandOperationConfig::default()
        }));
    }
    let mut op_cfg = cfg.operation.clone().ok_or(CliError::NoOperation)?;
    if let Some(name) = &args.name {
        match &mut op_cfg {
            OperationConfig::Replay(c) => c.name = Some(name.clone()),
            OperationConfig::Command(c) => c.name = Some(name.clone()),
        }
    }
    Ok(op_cfg)
}

fn parse_object(flag: &'static str, raw: &str) -> Result<Map<String, Value>, CliError> {
    serde_json::from_str(raw).map_err(|source| CliError::InvalidJson { flag, source })
}

fn render(result: &RunResult) -> String {
    serde_json::to_string_pretty(&result.to_value()).unwrap_or_else(|_| "null".to_string())
}

fn exit_code(result: &RunResult) -> i32 {
    if result.is_success() {
        0
    } else {
        1
    }
}
