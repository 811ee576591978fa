use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "vidlib_migrate=info,vidlib_core=info,warn";
const VERBOSE_FILTER: &str = "vidlib_migrate=debug,vidlib_core=debug,warn";

/// Filter used when `RUST_LOG` is not set
pub fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        VERBOSE_FILTER
    } else {
        DEFAULT_FILTER
    }
}

/// Install the fmt subscriber; `RUST_LOG` wins over the built-in filter
pub fn init(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
