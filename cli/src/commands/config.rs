use toolrun_core::api::AppConfig;

use crate::error::CliError;

/// Prints the effective configuration as TOML; warnings go to stderr.
pub fn config_cmd(cfg: &AppConfig, check: bool) -> Result<(), CliError> {
    for warning in warnings(cfg)? {
        eprintln!("warning: {}", warning);
    }
    if !check {
        print!("{}", toml::to_string_pretty(cfg)?);
    }
    Ok(())
}

/// Validates every policy and collects non-fatal findings.
pub fn warnings(cfg: &AppConfig) -> Result<Vec<String>, CliError> {
    cfg.build_runner()?;
    let mut out = cfg.timeout.to_policy()?.warnings();
    if cfg.operation.is_none() {
        out.push("no [operation] section; `run` will need --replay or --program".to_string());
    }
    Ok(out)
}
