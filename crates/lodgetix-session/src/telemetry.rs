//! # Tracing Setup
//!
//! `RUST_LOG` wins when set; otherwise the `[logging] filter` from
//! session.toml (default `info,lodgetix=debug,sqlx=warn`).

use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingSettings;

/// Installs the global fmt subscriber.
///
/// Returns false if a subscriber was already installed (tests, embedding
/// hosts); the existing one is kept.
pub fn init_tracing(settings: &LoggingSettings) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.filter));

    match tracing_subscriber::fmt().with_env_filter(filter).try_init() {
        Ok(()) => true,
        Err(e) => {
            debug!(error = %e, "Tracing subscriber already installed");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_harmless() {
        let settings = LoggingSettings::default();
        init_tracing(&settings);
        assert!(!init_tracing(&settings));
    }
}
