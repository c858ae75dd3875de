use std::path::Path;
use std::str::FromStr;

use crate::error::ConfigError;

use super::types::AppConfig;

pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Loads `./config.toml` when present (defaults otherwise), then applies
/// `TOOLRUN_*` environment overrides.
pub fn load_default() -> Result<AppConfig, ConfigError> {
    let mut cfg = if Path::new(DEFAULT_CONFIG_FILE).exists() {
        read_file(Path::new(DEFAULT_CONFIG_FILE))?
    } else {
        AppConfig::default()
    };
    apply_env_overrides(&mut cfg)?;
    Ok(cfg)
}

/// Like [`load_default`] but the file must exist.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<AppConfig, ConfigError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ConfigError::NotFound(path.display().to_string()));
    }
    let mut cfg = read_file(path)?;
    apply_env_overrides(&mut cfg)?;
    Ok(cfg)
}

fn read_file(path: &Path) -> Result<AppConfig, ConfigError> {
    let s = std::fs::read_to_string(path).map_err(|e| ConfigError::Parse(e.into()))?;
    let cfg = toml::from_str::<AppConfig>(&s).map_err(|e| ConfigError::Parse(e.into()))?;
    tracing::debug!(target: "toolrun.config", path = %path.display(), "config loaded");
    Ok(cfg)
}

pub fn apply_env_overrides(cfg: &mut AppConfig) -> Result<(), ConfigError> {
    apply_overrides(cfg, |key| std::env::var(key).ok())
}

/// Applies overrides from `lookup`; blank values are ignored.
pub fn apply_overrides<F>(cfg: &mut AppConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(v) = get("TOOLRUN_MAX_ATTEMPTS") {
        cfg.retry.max_attempts = parse_env("TOOLRUN_MAX_ATTEMPTS", &v)?;
    }
    if let Some(v) = get("TOOLRUN_BACKOFF_MS") {
        cfg.retry.backoff_ms = parse_env("TOOLRUN_BACKOFF_MS", &v)?;
    }
    if let Some(v) = get("TOOLRUN_START_TIMEOUT_S") {
        cfg.timeout.start_timeout_s = parse_env("TOOLRUN_START_TIMEOUT_S", &v)?;
    }
    if let Some(v) = get("TOOLRUN_IDLE_TIMEOUT_S") {
        cfg.timeout.idle_timeout_s = parse_env("TOOLRUN_IDLE_TIMEOUT_S", &v)?;
    }
    if let Some(v) = get("TOOLRUN_HARD_TIMEOUT_S") {
        cfg.timeout.hard_timeout_s = parse_env("TOOLRUN_HARD_TIMEOUT_S", &v)?;
    }
    if let Some(v) = get("TOOLRUN_EVENTS_OUT") {
        cfg.events_out.enabled = true;
        cfg.events_out.path = v;
    }
    Ok(())
}

fn parse_env<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::EnvInvalid {
            key: key.to_string(),
            source: e.into(),
        })
}
