pub mod metrics;
pub mod tracing;

pub use self::metrics::{init_metrics, render_metrics, Metrics};
pub use self::tracing::init_tracing;
