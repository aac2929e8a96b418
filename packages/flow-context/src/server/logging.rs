use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global tracing subscriber
///
/// Honors `RUST_LOG`; defaults to info with debug for this crate. Calling it
/// again after a subscriber is installed does nothing.
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,flow_context=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
