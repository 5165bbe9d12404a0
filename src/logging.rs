use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Initialize structured logging once at startup. CLI commands default to
/// WARN so tracing output stays out of the human-facing report lines; the
/// dashboard server runs at INFO.
pub fn init(level: Level) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok(); // Ignore err on re-init
}
