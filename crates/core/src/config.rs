//! Configuration: `orderprobe.toml` parsing and runtime settings.
//!
//! [`ProbeConfig`] is the top-level structure holding every section. It is
//! built once at startup and handed to each component's constructor; no
//! component reads ambient global state.
//!
//! # Loading priority
//! 1. CLI arguments (highest, applied by the binary)
//! 2. Environment variables (`ORDERPROBE_STORE_HOST=db` style)
//! 3. Configuration file (`orderprobe.toml`)
//! 4. Defaults (`Default` impls)
//!
//! # Example
//! ```no_run
//! # async fn example() -> Result<(), orderprobe_core::error::ProbeError> {
//! use orderprobe_core::config::ProbeConfig;
//!
//! // File + environment overrides
//! let config = ProbeConfig::load("orderprobe.toml").await?;
//!
//! // Directly from a TOML string
//! let config = ProbeConfig::parse("[observer]\nmax_attempts = 20")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ConfigError, ProbeError};
use crate::types::{Scenario, builtin_scenarios};
use crate::wait::{Backoff, PollPolicy};

/// Path tried when no `--config` is given.
pub const DEFAULT_CONFIG_PATH: &str = "orderprobe.toml";

const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
const VALID_LOG_FORMATS: [&str; 2] = ["json", "pretty"];
const VALID_BACKOFFS: [&str; 2] = ["fixed", "exponential"];

/// Complete orderprobe configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProbeConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub order_service: OrderServiceConfig,
    #[serde(default)]
    pub inventory_service: InventoryServiceConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub observer: ObserverConfig,
    /// Scenario fixtures, run in declared order. Empty means the built-in pair.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scenarios: Vec<Scenario>,
}

impl ProbeConfig {
    /// Load a TOML file, apply environment overrides and validate.
    ///
    /// Validation runs once, after the environment layer.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ProbeError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// [`resolve`](Self::resolve) followed by [`validate`](Self::validate).
    pub async fn load_optional(path: Option<&Path>) -> Result<Self, ProbeError> {
        let config = Self::resolve(path).await?;
        config.validate()?;
        Ok(config)
    }

    /// Read `path` when given. Otherwise use `orderprobe.toml` if it exists,
    /// falling back to defaults. Environment overrides apply in every case.
    ///
    /// The result is not validated; callers that layer CLI overrides on top
    /// validate afterwards.
    pub async fn resolve(path: Option<&Path>) -> Result<Self, ProbeError> {
        let mut config = match path {
            Some(path) => Self::from_file(path).await?,
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_PATH);
                if tokio::fs::try_exists(default_path).await.unwrap_or(false) {
                    Self::from_file(default_path).await?
                } else {
                    debug!("no configuration file found, using defaults");
                    Self::default()
                }
            }
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Read and parse a TOML file. No environment overrides, no validation.
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, ProbeError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ProbeError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                ProbeError::Io(e)
            }
        })?;
        Self::parse(&content)
    }

    /// Parse a TOML string.
    pub fn parse(toml_str: &str) -> Result<Self, ProbeError> {
        toml::from_str(toml_str).map_err(|e| {
            ProbeError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// Override values from `ORDERPROBE_{SECTION}_{FIELD}` variables.
    ///
    /// Unparseable values are logged and ignored.
    pub fn apply_env_overrides(&mut self) {
        override_string(&mut self.general.log_level, "ORDERPROBE_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "ORDERPROBE_GENERAL_LOG_FORMAT");

        override_string(&mut self.order_service.url, "ORDERPROBE_ORDER_SERVICE_URL");
        override_parsed(
            &mut self.order_service.request_timeout_secs,
            "ORDERPROBE_ORDER_SERVICE_REQUEST_TIMEOUT_SECS",
        );

        override_string(
            &mut self.inventory_service.url,
            "ORDERPROBE_INVENTORY_SERVICE_URL",
        );
        override_parsed(
            &mut self.inventory_service.request_timeout_secs,
            "ORDERPROBE_INVENTORY_SERVICE_REQUEST_TIMEOUT_SECS",
        );
        override_parsed(
            &mut self.inventory_service.require_verified,
            "ORDERPROBE_INVENTORY_SERVICE_REQUIRE_VERIFIED",
        );

        override_string(&mut self.store.host, "ORDERPROBE_STORE_HOST");
        override_parsed(&mut self.store.port, "ORDERPROBE_STORE_PORT");
        override_string(&mut self.store.database, "ORDERPROBE_STORE_DATABASE");
        override_string(&mut self.store.user, "ORDERPROBE_STORE_USER");
        override_string(&mut self.store.password, "ORDERPROBE_STORE_PASSWORD");
        override_parsed(
            &mut self.store.connect_timeout_secs,
            "ORDERPROBE_STORE_CONNECT_TIMEOUT_SECS",
        );

        override_parsed(
            &mut self.observer.max_attempts,
            "ORDERPROBE_OBSERVER_MAX_ATTEMPTS",
        );
        override_parsed(&mut self.observer.interval_ms, "ORDERPROBE_OBSERVER_INTERVAL_MS");
        override_string(&mut self.observer.backoff, "ORDERPROBE_OBSERVER_BACKOFF");
        override_parsed(
            &mut self.observer.backoff_factor,
            "ORDERPROBE_OBSERVER_BACKOFF_FACTOR",
        );
        override_parsed(
            &mut self.observer.max_interval_ms,
            "ORDERPROBE_OBSERVER_MAX_INTERVAL_MS",
        );
        override_parsed(
            &mut self.observer.deadline_secs,
            "ORDERPROBE_OBSERVER_DEADLINE_SECS",
        );
    }

    /// Check every field against its allowed range.
    pub fn validate(&self) -> Result<(), ProbeError> {
        if !VALID_LOG_LEVELS.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::invalid(
                "general.log_level",
                format!("must be one of: {}", VALID_LOG_LEVELS.join(", ")),
            )
            .into());
        }
        if !VALID_LOG_FORMATS.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::invalid(
                "general.log_format",
                format!("must be one of: {}", VALID_LOG_FORMATS.join(", ")),
            )
            .into());
        }

        validate_url("order_service.url", &self.order_service.url)?;
        validate_positive(
            "order_service.request_timeout_secs",
            self.order_service.request_timeout_secs,
        )?;
        validate_url("inventory_service.url", &self.inventory_service.url)?;
        validate_positive(
            "inventory_service.request_timeout_secs",
            self.inventory_service.request_timeout_secs,
        )?;

        if self.store.host.trim().is_empty() {
            return Err(ConfigError::invalid("store.host", "must not be empty").into());
        }
        if self.store.port == 0 {
            return Err(ConfigError::invalid("store.port", "must not be 0").into());
        }
        if self.store.database.trim().is_empty() {
            return Err(ConfigError::invalid("store.database", "must not be empty").into());
        }
        validate_positive(
            "store.connect_timeout_secs",
            self.store.connect_timeout_secs,
        )?;

        if self.observer.max_attempts == 0 {
            return Err(
                ConfigError::invalid("observer.max_attempts", "must be greater than 0").into(),
            );
        }
        validate_positive("observer.interval_ms", self.observer.interval_ms)?;
        if !VALID_BACKOFFS.contains(&self.observer.backoff.as_str()) {
            return Err(ConfigError::invalid(
                "observer.backoff",
                format!("must be one of: {}", VALID_BACKOFFS.join(", ")),
            )
            .into());
        }
        if self.observer.backoff == "exponential" {
            // written this way so that NaN is rejected too
            if !(self.observer.backoff_factor >= 1.0) {
                return Err(ConfigError::invalid(
                    "observer.backoff_factor",
                    "must be at least 1.0",
                )
                .into());
            }
            if self.observer.max_interval_ms < self.observer.interval_ms {
                return Err(ConfigError::invalid(
                    "observer.max_interval_ms",
                    "must not be smaller than observer.interval_ms",
                )
                .into());
            }
        }

        self.validate_scenarios()
    }

    fn validate_scenarios(&self) -> Result<(), ProbeError> {
        let mut seen = std::collections::HashSet::new();
        for (index, scenario) in self.scenarios.iter().enumerate() {
            let field = format!("scenarios[{index}]");
            if scenario.name.trim().is_empty() {
                return Err(ConfigError::invalid(field, "name must not be empty").into());
            }
            if !seen.insert(scenario.name.as_str()) {
                return Err(ConfigError::invalid(
                    field,
                    format!("duplicate scenario name '{}'", scenario.name),
                )
                .into());
            }
            if !scenario.expected_status.is_terminal() {
                return Err(ConfigError::invalid(
                    format!("{field}.expected_status"),
                    "must be a terminal status (Completed or Failed)",
                )
                .into());
            }
            if scenario.payload.items.is_empty() {
                return Err(ConfigError::invalid(
                    format!("{field}.payload.items"),
                    "must contain at least one line item",
                )
                .into());
            }
            if scenario.payload.items.iter().any(|item| item.quantity == 0) {
                return Err(ConfigError::invalid(
                    format!("{field}.payload.items"),
                    "quantity must be greater than 0",
                )
                .into());
            }
        }
        Ok(())
    }

    /// Scenarios to run: the declared ones, or the built-in pair when none are declared.
    pub fn effective_scenarios(&self) -> Vec<Scenario> {
        if self.scenarios.is_empty() {
            builtin_scenarios()
        } else {
            self.scenarios.clone()
        }
    }

    /// Build the observer's retry budget. Assumes `validate()` passed.
    pub fn poll_policy(&self) -> PollPolicy {
        let observer = &self.observer;
        let mut policy = PollPolicy::fixed(
            observer.max_attempts,
            Duration::from_millis(observer.interval_ms),
        );
        if observer.backoff == "exponential" {
            policy = policy.with_backoff(Backoff::Exponential {
                factor: observer.backoff_factor,
                max_interval: Duration::from_millis(observer.max_interval_ms),
            });
        }
        if observer.deadline_secs > 0 {
            policy = policy.with_deadline(Duration::from_secs(observer.deadline_secs));
        }
        policy
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// trace, debug, info, warn, error
    pub log_level: String,
    /// json, pretty
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "pretty".to_owned(),
        }
    }
}

/// Order service endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderServiceConfig {
    /// Order creation endpoint (POST).
    pub url: String,
    pub request_timeout_secs: u64,
}

impl Default for OrderServiceConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:5046/api/Orders".to_owned(),
            request_timeout_secs: 10,
        }
    }
}

/// Inventory service endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InventoryServiceConfig {
    /// Inventory listing endpoint (GET).
    pub url: String,
    pub request_timeout_secs: u64,
    /// Fail a scenario when reconciliation is not `Verified`.
    pub require_verified: bool,
}

impl Default for InventoryServiceConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:5278/api/Inventory".to_owned(),
            request_timeout_secs: 10,
            require_verified: false,
        }
    }
}

/// Connection parameters for the order store (PostgreSQL).
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
    pub connect_timeout_secs: u64,
}

impl StoreConfig {
    /// `user@host:port/database`, safe to log.
    pub fn target(&self) -> String {
        format!(
            "{}@{}:{}/{}",
            self.user, self.host, self.port, self.database
        )
    }
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"***")
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .finish()
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_owned(),
            port: 5123,
            database: "OrderDb".to_owned(),
            user: "postgres".to_owned(),
            password: "postgres".to_owned(),
            connect_timeout_secs: 5,
        }
    }
}

/// Retry budget for status observation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObserverConfig {
    pub max_attempts: u32,
    pub interval_ms: u64,
    /// fixed, exponential
    pub backoff: String,
    /// Growth factor for exponential backoff.
    pub backoff_factor: f64,
    /// Upper bound for a single exponential wait.
    pub max_interval_ms: u64,
    /// Wall-clock bound for one observation; 0 disables it.
    pub deadline_secs: u64,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            interval_ms: 1000,
            backoff: "fixed".to_owned(),
            backoff_factor: 2.0,
            max_interval_ms: 10_000,
            deadline_secs: 0,
        }
    }
}

fn validate_url(field: &str, url: &str) -> Result<(), ProbeError> {
    if url.trim().is_empty() {
        return Err(ConfigError::invalid(field, "must not be empty").into());
    }
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(ConfigError::invalid(field, "must start with http:// or https://").into());
    }
    Ok(())
}

fn validate_positive(field: &str, value: u64) -> Result<(), ProbeError> {
    if value == 0 {
        return Err(ConfigError::invalid(field, "must be greater than 0").into());
    }
    Ok(())
}

// --- environment override helpers ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_parsed<T: FromStr>(target: &mut T, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<T>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse env var, ignoring"
            ),
        }
    }
}
