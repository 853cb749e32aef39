use crate::config::types::Config;
use crate::error::{GuardError, Result};

pub fn validate(config: &Config) -> Result<()> {
    if config.concurrency.max_concurrent == 0 {
        return Err(GuardError::Config("concurrency.max_concurrent must be > 0".into()));
    }
    if config.rate_limit.is_enabled() && config.rate_limit.window_ms == 0 {
        return Err(GuardError::Config(
            "rate_limit.window_ms must be > 0 when rate_limit.max > 0".into(),
        ));
    }
    if config.logging.level.trim().is_empty() {
        return Err(GuardError::Config("logging.level cannot be empty".into()));
    }
    Ok(())
}
