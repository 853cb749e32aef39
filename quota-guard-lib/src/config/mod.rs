mod env;
mod loader;
mod types;
mod validator;

pub use env::{apply_env_overrides, apply_overrides_from};
pub use loader::{load_from_env, load_from_path};
pub use types::{CacheConfig, ConcurrencyConfig, Config, LoggingConfig, RateLimitConfig};
pub use validator::validate;
