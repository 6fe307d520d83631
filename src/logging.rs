use std::str::FromStr;

use tracing::Level;
use tracing_subscriber::FmtSubscriber;

const LOG_ENV: &str = "ORACLE_LOG";

/// Install a stderr fmt subscriber. Level comes from `ORACLE_LOG`
/// (error/warn/info/debug/trace), default info. Safe to call more than once.
pub fn init_tracing() {
    let level = std::env::var(LOG_ENV)
        .ok()
        .and_then(|raw| parse_level(&raw))
        .unwrap_or(Level::INFO);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn parse_level(raw: &str) -> Option<Level> {
    Level::from_str(raw.trim()).ok()
}
