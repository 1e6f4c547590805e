//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Processor retry tuning for transient conflicts.
    #[serde(default)]
    pub retry: RetryConfig,
    /// Offline sync replay tuning.
    #[serde(default)]
    pub sync: SyncConfig,
    /// Ledger store tuning.
    #[serde(default)]
    pub store: StoreConfig,
}

/// Retry tuning for transient concurrency conflicts in the processor.
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts before the operation fails visibly.
    #[serde(default = "default_retry_max_attempts")]
    pub max_attempts: u32,
    /// Initial backoff delay in milliseconds.
    #[serde(default = "default_retry_base_delay_ms")]
    pub base_delay_ms: u64,
    /// Upper bound on a single backoff delay in milliseconds.
    #[serde(default = "default_retry_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_retry_max_attempts(),
            base_delay_ms: default_retry_base_delay_ms(),
            max_delay_ms: default_retry_max_delay_ms(),
        }
    }
}

fn default_retry_max_attempts() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    50
}

fn default_retry_max_delay_ms() -> u64 {
    1_000
}

/// Offline sync replay tuning.
#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    /// Maximum replay attempts per queued item before dead-lettering.
    #[serde(default = "default_sync_max_attempts")]
    pub max_attempts: u32,
    /// Initial backoff delay in milliseconds.
    #[serde(default = "default_sync_base_delay_ms")]
    pub base_delay_ms: u64,
    /// Upper bound on a single backoff delay in milliseconds.
    #[serde(default = "default_sync_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_sync_max_attempts(),
            base_delay_ms: default_sync_base_delay_ms(),
            max_delay_ms: default_sync_max_delay_ms(),
        }
    }
}

fn default_sync_max_attempts() -> u32 {
    5
}

fn default_sync_base_delay_ms() -> u64 {
    200
}

fn default_sync_max_delay_ms() -> u64 {
    30_000
}

/// Ledger store tuning.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// How long a writer waits for the store lock before the attempt is
    /// reported as a transient concurrency conflict, in milliseconds.
    #[serde(default = "default_lock_wait_ms")]
    pub lock_wait_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            lock_wait_ms: default_lock_wait_ms(),
        }
    }
}

fn default_lock_wait_ms() -> u64 {
    5_000
}

impl AppConfig {
    /// Loads configuration from config files and environment.
    ///
    /// Sources, in increasing precedence: `config/default.toml`,
    /// `config/{RUN_MODE}.toml`, then `CENTAVO__`-prefixed environment
    /// variables (e.g. `CENTAVO__RETRY__MAX_ATTEMPTS=5`).
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded or deserialized.
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("CENTAVO").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
