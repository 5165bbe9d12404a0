mod cli;
mod core;
mod interfaces;
mod logging;

use tracing::Level;

use crate::core::terminal;

#[tokio::main]
async fn main() {
    let level = if std::env::args().nth(1).as_deref() == Some("dashboard") {
        Level::INFO
    } else {
        Level::WARN
    };
    logging::init(level);

    if let Err(e) = cli::run_main().await {
        let msg = e.to_string();
        if msg.contains("canceled") || msg.contains("OperationCanceled") {
            // Interactive prompt dismissed; nothing to report.
            return;
        }
        terminal::print_error(&msg);
        std::process::exit(1);
    }
}
