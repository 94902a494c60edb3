//! Configuration for the HSI core.
//!
//! Structure follows the teacher's `Config::load`/`save`/`config_path`
//! pattern, widened to the full wear/phone/behavior/cloud/consent schema
//! described in SPEC_FULL.md §6. `log_level` is wired to
//! `tracing_subscriber::EnvFilter` at startup.

use crate::oracles::ConsentRecord;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Main configuration for the HSI core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub wear: WearConfig,
    pub phone: PhoneConfig,
    pub behavior: BehaviorConfig,
    pub cloud: CloudConfig,
    pub consent: ConsentConfig,

    /// Path for storing transparency logs and local state.
    pub data_path: PathBuf,

    /// `tracing_subscriber::EnvFilter` directive, e.g. `"info"` or
    /// `"synheart_hsi_core=debug,warn"`.
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("synheart-hsi-core");

        Self {
            wear: WearConfig::default(),
            phone: PhoneConfig::default(),
            behavior: BehaviorConfig::default(),
            cloud: CloudConfig::default(),
            consent: ConsentConfig::default(),
            data_path: data_dir,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from the default location, falling back to
    /// defaults if no config file exists yet.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        let config_path = Self::config_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    /// Path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("synheart-hsi-core")
            .join("config.json")
    }

    /// Ensure all required directories exist.
    pub fn ensure_directories(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.data_path)?;
        Ok(())
    }

    pub fn consent_record(&self) -> ConsentRecord {
        ConsentRecord {
            biosignal: self.consent.biosignal,
            behavior: self.consent.behavior,
            context: self.consent.context,
        }
    }
}

/// Wearable biosignal source configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WearConfig {
    pub enabled: bool,
    pub sampling_rate_hz: f64,
}

impl Default for WearConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sampling_rate_hz: 1.0,
        }
    }
}

/// Phone-side context source configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhoneConfig {
    pub enabled: bool,
    pub capture_device_state: bool,
    pub capture_conversation_signals: bool,
}

impl Default for PhoneConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            capture_device_state: true,
            capture_conversation_signals: false,
        }
    }
}

/// Behavioral event source configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BehaviorConfig {
    pub enabled: bool,
    /// Gap threshold for session boundaries, in seconds.
    pub session_gap_threshold_secs: u64,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            session_gap_threshold_secs: 30,
        }
    }
}

/// Cloud upload configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudConfig {
    pub enabled: bool,
    pub endpoint: String,
    pub tenant_id: String,
    pub api_key: String,
    pub subject_id: String,
    pub subject_type: String,
    /// Additional attempts after the first, for transient failures only.
    pub max_retries: u32,
    pub max_queue_size: usize,
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: "https://api.synheart.com".to_string(),
            tenant_id: String::new(),
            api_key: String::new(),
            subject_id: String::new(),
            subject_type: "pseudonymous_user".to_string(),
            max_retries: 3,
            max_queue_size: 500,
        }
    }
}

/// Per-module user consent, persisted locally. Withheld by default.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ConsentConfig {
    pub biosignal: bool,
    pub behavior: bool,
    pub context: bool,
}

/// Configuration load/save errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_consent_withheld() {
        let config = Config::default();
        assert!(!config.consent.biosignal);
        assert!(!config.consent.behavior);
        assert!(!config.consent.context);
        assert!(!config.cloud.enabled);
    }

    #[test]
    fn consent_record_mirrors_consent_config() {
        let mut config = Config::default();
        config.consent.behavior = true;
        let record = config.consent_record();
        assert!(record.behavior);
        assert!(!record.biosignal);
    }
}
