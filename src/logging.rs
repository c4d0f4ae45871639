use tracing_subscriber::EnvFilter;

/// Initializes the tracing subscriber for the daemon.
///
/// `RUST_LOG` wins when set.  Otherwise the filter is `info`, raised to `debug` for
/// this crate when `verbose` is true.
pub fn setup_tracing(verbose: bool) {
    let fallback = if verbose {
        "info,userfacade=debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
