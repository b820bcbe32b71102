//! Engine configuration
//!
//! Layered: compiled-in defaults, then an optional file, then
//! `FIELDWATCH__SECTION__KEY` environment variables. Validated once after
//! loading; every error here is fatal at startup.

use crate::ConfigError;
use ::config::{Config, Environment, File};
use advisory::{ActionConfig, ResolverConfig};
use alerting::AlertConfig;
use data_validator::ValidationConfig;
use inference_engine::{ForestModel, ThresholdModel};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use storage::AnyCooldownStore;
use thresholds::ProviderConfig;
use tracing::{info, warn};

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Plain,
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Plain,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Poll scheduler settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Subjects refreshed on every tick; empty disables polling
    pub subjects: Vec<String>,
    pub poll_interval_secs: u64,
    /// Cooldown entries idle for longer than this are purged
    pub cooldown_ttl_days: u32,
    pub purge_interval_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            subjects: Vec::new(),
            poll_interval_secs: 900,
            cooldown_ttl_days: 30,
            purge_interval_secs: 3600,
        }
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub validation: ValidationConfig,
    pub thresholds: ProviderConfig,
    pub alerting: AlertConfig,
    pub resolver: ResolverConfig,
    pub actions: ActionConfig,
    /// Threshold model file; without one thresholds come from the rules
    pub model_path: Option<String>,
    /// `memory` or an `sqlite:` URL
    pub cooldown_store: String,
    pub cooldown_store_connections: u32,
    pub scheduler: SchedulerConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            validation: ValidationConfig::default(),
            thresholds: ProviderConfig::default(),
            alerting: AlertConfig::default(),
            resolver: ResolverConfig::default(),
            actions: ActionConfig::default(),
            model_path: None,
            cooldown_store: "memory".to_string(),
            cooldown_store_connections: 4,
            scheduler: SchedulerConfig::default(),
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load and validate the configuration
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder().add_source(Config::try_from(&EngineConfig::default())?);
        if let Some(path) = path {
            info!("Loading configuration from {}", path);
            builder = builder.add_source(File::with_name(path));
        }
        let config: EngineConfig = builder
            .add_source(
                Environment::with_prefix("FIELDWATCH")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.thresholds.validate()?;
        self.alerting.validate()?;
        self.resolver.validate()?;
        self.actions.validate()?;
        if self.scheduler.poll_interval_secs == 0 || self.scheduler.purge_interval_secs == 0 {
            return Err(ConfigError::ZeroPollInterval);
        }
        Ok(())
    }

    /// Load the threshold model, if one is configured
    ///
    /// A model that fails to load leaves the engine on the rule path.
    pub fn load_model(&self) -> Option<Arc<dyn ThresholdModel>> {
        let path = self.model_path.as_deref()?;
        match ForestModel::load(path) {
            Ok(model) => {
                info!("Loaded threshold model from {}", path);
                Some(Arc::new(model))
            }
            Err(e) => {
                warn!("Threshold model unavailable ({}), using rule-based thresholds", e);
                None
            }
        }
    }

    pub async fn open_store(&self) -> Result<AnyCooldownStore, ConfigError> {
        Ok(AnyCooldownStore::open(&self.cooldown_store, self.cooldown_store_connections).await?)
    }
}
