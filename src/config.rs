use serde::{Deserialize, Serialize};
use std::fs;

use crate::transfer::RetryPolicy;

/// Engine host configuration: logging plus the default conflict-retry
/// policy handed to callers.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EngineConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    pub rotation: String,
    #[serde(default)]
    pub log_to_stdout: bool,
    #[serde(default)]
    pub retry: RetryPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_dir: "./logs".to_string(),
            log_file: "wallet_core.log".to_string(),
            use_json: false,
            rotation: "daily".to_string(),
            log_to_stdout: true,
            retry: RetryPolicy::default(),
        }
    }
}

impl EngineConfig {
    pub fn load(env: &str) -> Self {
        let config_path = format!("config/{}.yaml", env);
        let content = fs::read_to_string(&config_path)
            .unwrap_or_else(|_| panic!("Failed to read config file: {}", config_path));
        serde_yaml::from_str(&content).expect("Failed to parse config yaml")
    }
}
