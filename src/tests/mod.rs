//! End-to-end scenarios and cross-cutting properties, driven through the
//! public facade.

mod properties;

/// Opt-in log capture for debugging test runs (`RUST_LOG=satcore=trace`).
pub(crate) fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
