//! Configuration management for the HealthWise backend
//!
//! Configuration is loaded hierarchically:
//! 1. Default values (in code)
//! 2. TOML config files (config/development.toml or config/production.toml)
//! 3. Environment variables (prefix: HW__)

use anyhow::Result;
use healthwise_shared::classifier::CriticalRule;
use serde::{Deserialize, Serialize};
use std::env;
use validator::Validate;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub persistence: PersistenceConfig,
    pub analysis: AnalysisConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Remote persistence service
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PersistenceConfig {
    #[validate(url)]
    pub url: String,
    /// Project key sent as `apikey` on every request
    pub api_key: String,
    #[validate(range(min = 1, max = 300))]
    pub timeout_secs: u64,
}

/// Document analysis and assistant service
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AnalysisConfig {
    #[validate(url)]
    pub url: String,
    #[validate(range(min = 1, max = 600))]
    pub timeout_secs: u64,
}

/// Session token verification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HS256 secret shared with the auth provider
    pub jwt_secret: String,
    /// Expected `aud` claim; empty disables the check
    #[serde(default)]
    pub audience: String,
}

/// In-memory session lifetime
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SessionConfig {
    /// Sessions untouched for this long are dropped
    #[validate(range(min = 1))]
    pub idle_timeout_secs: u64,
    #[validate(range(min = 1))]
    pub sweep_interval_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout_secs: 3600,
            sweep_interval_secs: 300,
        }
    }
}

/// Critical escalation thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    #[serde(default)]
    pub critical_rules: Vec<CriticalRule>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            critical_rules: vec![
                CriticalRule::new("Potassium", Some(2.5), Some(6.5)),
                CriticalRule::new("Sodium", Some(120.0), Some(160.0)),
                CriticalRule::new("Glucose", Some(40.0), Some(400.0)),
                CriticalRule::new("Hemoglobin", Some(7.0), None),
            ],
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            persistence: PersistenceConfig {
                url: "http://localhost:54321".to_string(),
                api_key: String::new(),
                timeout_secs: 15,
            },
            analysis: AnalysisConfig {
                url: "http://localhost:5000/api".to_string(),
                timeout_secs: 120,
            },
            auth: AuthConfig {
                jwt_secret: "development-secret-change-in-production".to_string(),
                audience: "authenticated".to_string(),
            },
            classifier: ClassifierConfig::default(),
            session: SessionConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from files and environment
    ///
    /// Loading order (later sources override earlier):
    /// 1. Default values
    /// 2. Config file based on RUST_ENV (development.toml or production.toml)
    /// 3. Environment variables with HW__ prefix
    pub fn load() -> Result<Self> {
        let env = env::var("RUST_ENV").unwrap_or_else(|_| "development".to_string());
        let config_file = format!("config/{}.toml", env);

        let config = config::Config::builder()
            // Start with defaults
            .add_source(config::Config::try_from(&AppConfig::default())?)
            // Load from environment-specific config file
            .add_source(config::File::with_name(&config_file).required(false))
            // Override with environment variables (HW__ prefix)
            // e.g., HW__PERSISTENCE__URL=https://... sets persistence.url
            .add_source(config::Environment::with_prefix("HW").separator("__"))
            .build()?;

        let config: AppConfig = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Check service URLs, timeouts and session lifetimes
    pub fn validate(&self) -> Result<()> {
        self.persistence
            .validate()
            .map_err(|e| anyhow::anyhow!("Invalid persistence configuration: {}", e))?;
        self.analysis
            .validate()
            .map_err(|e| anyhow::anyhow!("Invalid analysis configuration: {}", e))?;
        self.session
            .validate()
            .map_err(|e| anyhow::anyhow!("Invalid session configuration: {}", e))?;
        Ok(())
    }

    /// Check if running in production mode
    pub fn is_production() -> bool {
        env::var("RUST_ENV")
            .map(|v| v == "production")
            .unwrap_or(false)
    }
}
