use std::sync::Once;

static INIT: Once = Once::new();

/// Install a test-writer tracing subscriber once per test binary.
pub fn init_test_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init();
    });
}
