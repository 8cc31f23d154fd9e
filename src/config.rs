use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::time::Duration;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    pub rotation: String,
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub locking: LockingConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
}

/// Account lock settings
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct LockingConfig {
    /// Bound on waiting for an account lock; absent means wait forever
    #[serde(default)]
    pub wait_timeout_ms: Option<u64>,
}

impl AppConfig {
    pub fn load(env: &str) -> anyhow::Result<Self> {
        let config_path = format!("config/{}.yaml", env);
        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path))?;
        Self::from_yaml_str(&content)
            .with_context(|| format!("Failed to parse config yaml: {}", config_path))
    }

    pub fn from_yaml_str(content: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn lock_wait_timeout(&self) -> Option<Duration> {
        self.locking.wait_timeout_ms.map(Duration::from_millis)
    }
}
