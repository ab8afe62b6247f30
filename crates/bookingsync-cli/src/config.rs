//! Binary configuration.
//!
//! All settings live in a single `config.toml`, by default at
//! `~/.config/bookingsync/config.toml`:
//!
//! ```toml
//! [google]
//! credentials_file = "/etc/bookingsync/service-account.json"
//!
//! [source]
//! kind = "firestore"
//! project_id = "my-project"
//!
//! [sync]
//! default_calendar_id = "rentals@group.calendar.google.com"
//!
//! [server]
//! bind = "127.0.0.1:8080"
//! interval_secs = 900
//! ```
//!
//! Credential values (`credentials`, `access_token`) support secret
//! references: `env::VAR`, `file::/path`, `pass::entry`, or plain text.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use bookingsync_core::DEFAULT_COLOR_ID;
use bookingsync_engine::{RetryPolicy, SchedulerConfig, SyncOptions};
use serde::{Deserialize, Serialize};

use crate::error::{CliError, CliResult};

// ---------------------------------------------------------------------------
// AppConfig (config.toml)
// ---------------------------------------------------------------------------

/// Configuration for the bookingsync binary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Google credentials and endpoints.
    #[cfg(feature = "google")]
    pub google: Option<GoogleSettings>,

    /// Where units and bookings are read from.
    pub source: Option<SourceSettings>,

    /// Reconciliation settings.
    pub sync: SyncSettings,

    /// Trigger server and scheduler settings.
    pub server: ServerSettings,
}

/// Source of truth for units and bookings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceSettings {
    /// A local JSON snapshot file.
    Snapshot { path: PathBuf },

    /// Cloud Firestore.
    #[cfg(feature = "google")]
    Firestore {
        /// Defaults to the service account key's project.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        project_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        database: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        units_collection: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        bookings_collection: Option<String>,
    },
}

/// Reconciliation settings, mirrored onto [`SyncOptions`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    /// First retry delay in milliseconds; doubles per attempt.
    pub base_delay_ms: u64,
    pub max_attempts: u32,
    pub default_color_id: String,
    /// Calendar for units without one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_calendar_id: Option<String>,
    pub delete_batch_size: usize,
    /// Calendars reconciled concurrently.
    pub unit_concurrency: usize,
    pub write_back_event_ids: bool,
    pub deterministic_event_ids: bool,
    /// Calendars swept even though no unit maps to them any more.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sweep_calendars: Vec<String>,
}

impl Default for SyncSettings {
    fn default() -> Self {
        let options = SyncOptions::default();
        Self {
            base_delay_ms: u64::try_from(options.retry.base_delay.as_millis()).unwrap_or(1000),
            max_attempts: options.retry.max_attempts,
            default_color_id: DEFAULT_COLOR_ID.to_string(),
            default_calendar_id: None,
            delete_batch_size: options.delete_batch_size,
            unit_concurrency: options.unit_concurrency,
            write_back_event_ids: options.write_back_event_ids,
            deterministic_event_ids: options.deterministic_event_ids,
            sweep_calendars: Vec::new(),
        }
    }
}

impl SyncSettings {
    /// Converts to engine options.
    pub fn to_options(&self, dry_run: bool) -> SyncOptions {
        let mut options = SyncOptions::default()
            .with_retry(RetryPolicy::new(
                Duration::from_millis(self.base_delay_ms),
                self.max_attempts,
            ))
            .with_default_color(self.default_color_id.clone())
            .with_delete_batch_size(self.delete_batch_size)
            .with_unit_concurrency(self.unit_concurrency)
            .with_write_back(self.write_back_event_ids)
            .with_deterministic_ids(self.deterministic_event_ids)
            .with_sweep_calendars(self.sweep_calendars.iter().cloned())
            .with_dry_run(dry_run);
        if let Some(ref calendar_id) = self.default_calendar_id {
            options = options.with_default_calendar(calendar_id.clone());
        }
        options
    }
}

/// Trigger server settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Listen address of the HTTP trigger.
    pub bind: SocketAddr,

    /// Seconds between scheduled passes; 0 disables the scheduler.
    pub interval_secs: u64,

    /// Random jitter added to the interval, as a fraction (0.0-1.0).
    pub jitter: f64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 8080)),
            interval_secs: 900,
            jitter: 0.1,
        }
    }
}

impl ServerSettings {
    /// Returns the scheduler configuration, or `None` when disabled.
    pub fn scheduler(&self) -> Option<SchedulerConfig> {
        (self.interval_secs > 0).then(|| {
            SchedulerConfig::new(Duration::from_secs(self.interval_secs)).with_jitter(self.jitter)
        })
    }
}

impl AppConfig {
    /// Loads configuration from the default path, or defaults if absent.
    pub fn load() -> CliResult<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> CliResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CliError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
    }

    /// Parses TOML content.
    pub fn parse(content: &str) -> CliResult<Self> {
        toml::from_str(content).map_err(|e| CliError::Config(format!("failed to parse config: {}", e)))
    }

    /// Checks settings that would otherwise only fail at run time.
    pub fn validate(&self) -> CliResult<()> {
        if self.source.is_none() {
            return Err(CliError::Config(
                "no [source] section; set kind = \"snapshot\" or \"firestore\"".to_string(),
            ));
        }
        if self.sync.max_attempts == 0 {
            return Err(CliError::Config("sync.max_attempts must be at least 1".to_string()));
        }
        if self.sync.delete_batch_size == 0 || self.sync.unit_concurrency == 0 {
            return Err(CliError::Config(
                "sync.delete_batch_size and sync.unit_concurrency must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.server.jitter) {
            return Err(CliError::Config(format!(
                "server.jitter must be within 0.0..=1.0, got {}",
                self.server.jitter
            )));
        }
        #[cfg(feature = "google")]
        if let Some(ref google) = self.google {
            google.to_provider_config()?;
        }
        Ok(())
    }

    /// Returns the default configuration file path.
    ///
    /// `BOOKINGSYNC_CONFIG` is handled by the `--config` flag.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("bookingsync")
            .join("config.toml")
    }
}

// ---------------------------------------------------------------------------
// GoogleSettings
// ---------------------------------------------------------------------------

/// Google settings.
///
/// Exactly one credential is used, first match wins: `access_token`,
/// `credentials` (the key JSON, usually a `file::` or `env::` reference),
/// then `credentials_file`.
#[cfg(feature = "google")]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleSettings {
    /// Path to a service account JSON key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credentials_file: Option<PathBuf>,

    /// Service account JSON key content (supports secret references).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credentials: Option<String>,

    /// Pre-minted OAuth access token (supports secret references).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub calendar_api_base: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub firestore_api_base: Option<String>,

    /// HTTP timeout in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

/// A resolved Google credential.
#[cfg(feature = "google")]
pub enum GoogleCredential {
    AccessToken(String),
    ServiceAccount(bookingsync_providers::google::ServiceAccountKey),
}

#[cfg(feature = "google")]
impl std::fmt::Debug for GoogleCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AccessToken(_) => f.write_str("AccessToken([redacted])"),
            Self::ServiceAccount(key) => f.debug_tuple("ServiceAccount").field(key).finish(),
        }
    }
}

#[cfg(feature = "google")]
impl GoogleSettings {
    /// Converts to provider configuration.
    pub fn to_provider_config(&self) -> CliResult<bookingsync_providers::google::GoogleConfig> {
        use bookingsync_providers::google::GoogleConfig;

        let mut config = GoogleConfig::new();
        if let Some(ref base) = self.calendar_api_base {
            config = config.with_calendar_api_base(base);
        }
        if let Some(ref base) = self.firestore_api_base {
            config = config.with_firestore_api_base(base);
        }
        if let Some(secs) = self.timeout_secs {
            config = config.with_timeout(Duration::from_secs(secs));
        }
        config.validate().map_err(CliError::Config)?;
        Ok(config)
    }

    /// Resolves the configured credential, expanding secret references.
    pub fn resolve_credential(&self) -> CliResult<GoogleCredential> {
        use bookingsync_providers::google::ServiceAccountKey;

        if let Some(ref token) = self.access_token {
            return Ok(GoogleCredential::AccessToken(crate::secret::resolve(token)?));
        }
        if let Some(ref key) = self.credentials {
            let json = crate::secret::resolve(key)?;
            return Ok(GoogleCredential::ServiceAccount(ServiceAccountKey::from_json(&json)?));
        }
        if let Some(ref path) = self.credentials_file {
            return Ok(GoogleCredential::ServiceAccount(ServiceAccountKey::from_file(path)?));
        }
        Err(CliError::Config(format!(
            "Google credentials not found. Add to {}:\n  \
             [google]\n  \
             credentials_file = \"/path/to/service-account.json\"",
            AppConfig::default_path().display()
        )))
    }
}
