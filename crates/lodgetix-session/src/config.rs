//! # Session Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     LODGETIX_DB_PATH=/var/lib/lodgetix/lodgetix.db                     │
//! │     LODGETIX_SAVE_TIMEOUT_SECS=5                                       │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/lodgetix/session.toml (Linux)                            │
//! │     ~/Library/Application Support/com.lodgetix.registration/... (macOS)│
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [store]
//! database_path = "lodgetix.db"
//! max_connections = 5
//! busy_timeout_ms = 5000
//!
//! [drafts]
//! save_timeout_secs = 10
//! autosave = true
//!
//! [logging]
//! filter = "info,lodgetix=debug,sqlx=warn"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{SessionError, SessionResult};
use lodgetix_db::DbConfig;

// =============================================================================
// Store Settings
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSettings {
    /// SQLite file holding drafts and catalogs.
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// How long a draft write waits on another writer's lock.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

fn default_database_path() -> PathBuf {
    directories::ProjectDirs::from("com", "lodgetix", "registration")
        .map(|dirs| dirs.data_dir().join("lodgetix.db"))
        .unwrap_or_else(|| PathBuf::from("lodgetix.db"))
}

fn default_max_connections() -> u32 {
    5
}

fn default_busy_timeout_ms() -> u64 {
    5000
}

impl Default for StoreSettings {
    fn default() -> Self {
        StoreSettings {
            database_path: default_database_path(),
            max_connections: default_max_connections(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

// =============================================================================
// Draft Settings
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftSettings {
    /// Upper bound on one draft save. The engine itself never times out.
    #[serde(default = "default_save_timeout")]
    pub save_timeout_secs: u64,

    /// Save after every successful mutation.
    #[serde(default = "default_true")]
    pub autosave: bool,
}

fn default_save_timeout() -> u64 {
    10
}

fn default_true() -> bool {
    true
}

impl Default for DraftSettings {
    fn default() -> Self {
        DraftSettings {
            save_timeout_secs: default_save_timeout(),
            autosave: true,
        }
    }
}

// =============================================================================
// Logging Settings
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default = "default_filter")]
    pub filter: String,
}

fn default_filter() -> String {
    "info,lodgetix=debug,sqlx=warn".to_string()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        LoggingSettings {
            filter: default_filter(),
        }
    }
}

// =============================================================================
// Session Configuration
// =============================================================================

/// Complete session configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub store: StoreSettings,

    #[serde(default)]
    pub drafts: DraftSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

impl SessionConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (session.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> SessionResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading session config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load session config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> SessionResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| SessionError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| SessionError::ConfigSaveFailed(e.to_string()))?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents).map_err(|e| SessionError::ConfigSaveFailed(e.to_string()))?;

        info!(?path, "Session config saved");
        Ok(())
    }

    pub fn validate(&self) -> SessionResult<()> {
        if self.store.database_path.as_os_str().is_empty() {
            return Err(SessionError::InvalidConfig(
                "database_path must not be empty".into(),
            ));
        }

        if self.store.max_connections == 0 {
            return Err(SessionError::InvalidConfig(
                "max_connections must be greater than 0".into(),
            ));
        }

        if self.drafts.save_timeout_secs == 0 {
            return Err(SessionError::InvalidConfig(
                "save_timeout_secs must be greater than 0".into(),
            ));
        }

        if self.logging.filter.trim().is_empty() {
            return Err(SessionError::InvalidConfig(
                "logging filter must not be empty".into(),
            ));
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("LODGETIX_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.store.database_path = PathBuf::from(path);
        }

        if let Ok(max) = std::env::var("LODGETIX_MAX_CONNECTIONS") {
            match max.parse::<u32>() {
                Ok(m) => self.store.max_connections = m,
                Err(_) => warn!(value = %max, "Ignoring non-numeric LODGETIX_MAX_CONNECTIONS"),
            }
        }

        if let Ok(secs) = std::env::var("LODGETIX_SAVE_TIMEOUT_SECS") {
            match secs.parse::<u64>() {
                Ok(s) => self.drafts.save_timeout_secs = s,
                Err(_) => warn!(value = %secs, "Ignoring non-numeric LODGETIX_SAVE_TIMEOUT_SECS"),
            }
        }

        if let Ok(autosave) = std::env::var("LODGETIX_AUTOSAVE") {
            match autosave.to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => self.drafts.autosave = true,
                "0" | "false" | "no" | "off" => self.drafts.autosave = false,
                _ => warn!(value = %autosave, "Unknown LODGETIX_AUTOSAVE value"),
            }
        }

        if let Ok(filter) = std::env::var("LODGETIX_LOG") {
            self.logging.filter = filter;
        }
    }

    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "lodgetix", "registration")
            .map(|dirs| dirs.config_dir().join("session.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// Store settings for this session. A connection wait never outlasts
    /// the draft save timeout.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.store.database_path)
            .max_connections(self.store.max_connections)
            .acquire_timeout(self.save_timeout())
            .busy_timeout(Duration::from_millis(self.store.busy_timeout_ms))
    }

    pub fn save_timeout(&self) -> Duration {
        Duration::from_secs(self.drafts.save_timeout_secs)
    }
}
