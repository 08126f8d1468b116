use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_DIRECTIVE: &str = "warn";

/// Logs go to stderr; stdout is reserved for protocol lines.
pub fn init(json: bool) {
    let filter = build_env_filter();
    let registry = tracing_subscriber::registry().with(filter);
    let result = if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };
    if let Err(e) = result {
        eprintln!("schoold: logging not initialised: {e}");
    }
}

/// `SCHOOLD_LOG` > `RUST_LOG` > `warn`. Unparseable directives fall through.
fn build_env_filter() -> EnvFilter {
    if let Ok(directives) = std::env::var("SCHOOLD_LOG") {
        if let Ok(filter) = EnvFilter::try_new(&directives) {
            return filter;
        }
    }
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    EnvFilter::new(DEFAULT_DIRECTIVE)
}
