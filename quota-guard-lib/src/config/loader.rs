use std::fs;
use std::path::Path;

use crate::config::env::apply_env_overrides;
use crate::config::validator::validate;
use crate::config::Config;
use crate::error::{GuardError, Result};

/// Load a TOML config file, then apply `GA4_*` environment overrides.
pub fn load_from_path<P: AsRef<Path>>(p: P) -> Result<Config> {
    let txt = fs::read_to_string(p)
        .map_err(|e| GuardError::Config(format!("Failed to read config file: {e}")))?;
    let mut cfg: Config = toml::from_str(&txt)
        .map_err(|e| GuardError::Config(format!("Failed to parse config: {e}")))?;

    apply_env_overrides(&mut cfg)?;
    validate(&cfg)?;

    Ok(cfg)
}

/// Defaults plus `GA4_*` environment overrides, for deployments without a file.
pub fn load_from_env() -> Result<Config> {
    let mut cfg = Config::default();
    apply_env_overrides(&mut cfg)?;
    validate(&cfg)?;
    Ok(cfg)
}
