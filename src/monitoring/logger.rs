use tracing_subscriber::{fmt, EnvFilter};

use crate::config::MonitoringConfig;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the `info` default.
pub fn init(config: &MonitoringConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if config.json_logs {
        fmt().json().with_env_filter(filter).init();
    } else {
        fmt().with_env_filter(filter).init();
    }
}
