use crate::config::EngineConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Install the global tracing subscriber: rolling file output, optional
/// stdout mirror, JSON or text per config. The returned guard must be held
/// for the process lifetime or buffered log lines are dropped.
pub fn init_logging(config: &EngineConfig) -> WorkerGuard {
    let file_appender = match config.rotation.as_str() {
        "hourly" => tracing_appender::rolling::hourly(&config.log_dir, &config.log_file),
        "daily" => tracing_appender::rolling::daily(&config.log_dir, &config.log_file),
        _ => tracing_appender::rolling::never(&config.log_dir, &config.log_file),
    };

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone()));

    let registry = tracing_subscriber::registry().with(filter);

    match (config.use_json, config.log_to_stdout) {
        (true, _) => {
            let file_layer = fmt::layer()
                .json()
                .with_target(true)
                .with_writer(non_blocking)
                .with_ansi(false);
            registry.with(file_layer).init();
        }
        (false, true) => {
            let file_layer = fmt::layer()
                .with_target(false)
                .with_writer(non_blocking)
                .with_ansi(false);
            let stdout_layer = fmt::layer().with_target(false).with_ansi(true);
            registry.with(file_layer).with(stdout_layer).init();
        }
        (false, false) => {
            let file_layer = fmt::layer()
                .with_target(false)
                .with_writer(non_blocking)
                .with_ansi(false);
            registry.with(file_layer).init();
        }
    }

    guard
}
