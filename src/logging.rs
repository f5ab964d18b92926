use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Environment variable holding a filter directive, e.g. `cubby=debug`
pub const LOG_ENV: &str = "CUBBY_LOG";

/// Install the stderr subscriber. `CUBBY_LOG` wins over `default_level`
/// (normally `[log].level`). Calling this twice is harmless.
pub fn init_logging(default_level: &str) {
    let filter = filter_from(std::env::var(LOG_ENV).ok().as_deref(), default_level);
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(true)
        .with_filter(filter);

    let _ = tracing_subscriber::registry().with(stderr_layer).try_init();
}

fn filter_from(env: Option<&str>, default_level: &str) -> EnvFilter {
    env.filter(|directive| !directive.trim().is_empty())
        .and_then(|directive| EnvFilter::try_new(directive).ok())
        .or_else(|| EnvFilter::try_new(default_level).ok())
        .unwrap_or_else(|| EnvFilter::new("warn"))
}
