use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub device: DeviceConfig,
    pub agent: AgentConfig,
    pub orchestrator: OrchestratorConfig,
    pub logging: LoggingConfig,
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub web_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    pub adb_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    pub program: String,
    pub subcommand: Option<String>,
    pub provider: Option<String>,
    pub model: Option<String>,
    pub device_serial: Option<String>,
    pub timeout_secs: u64,
    pub search_max_steps: u32,
    pub order_max_steps: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    pub cooldown_ms: u64,
    pub error_message_limit: usize,
    pub subscriber_buffer: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub directory: Option<String>,
    pub file_prefix: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8000,
                web_dir: "web".to_string(),
            },
            device: DeviceConfig {
                adb_path: "adb".to_string(),
            },
            agent: AgentConfig {
                program: "droidrun".to_string(),
                subcommand: Some("run".to_string()),
                provider: Some("OpenRouter".to_string()),
                model: Some("google/gemini-2.0-flash-001".to_string()),
                device_serial: None,
                timeout_secs: 600,
                search_max_steps: 18,
                order_max_steps: 40,
            },
            orchestrator: OrchestratorConfig {
                cooldown_ms: 2000,
                error_message_limit: 50,
                subscriber_buffer: 256,
            },
            logging: LoggingConfig {
                directory: None,
                file_prefix: "price-hunter.log".to_string(),
            },
            metrics: MetricsConfig {
                enabled: false,
                port: 9001,
            },
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load("config")
    }

    pub fn load(config_dir: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let dir = config_dir.as_ref();
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());
        let defaults = Config::try_from(&AppConfig::default())?;

        let s = Config::builder()
            // Built-in defaults, so every file is optional
            .add_source(defaults)
            .add_source(File::from(dir.join("default")).required(false))
            // Add environment-specific config
            .add_source(File::from(dir.join(&run_mode)).required(false))
            // Add local config (ignored by git)
            .add_source(File::from(dir.join("local")).required(false))
            // Add environment variables with prefix "PRICEHUNTER__"
            .add_source(
                Environment::with_prefix("PRICEHUNTER")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: AppConfig = s.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Message("Server port must be greater than 0".into()));
        }

        if self.device.adb_path.trim().is_empty() {
            return Err(ConfigError::Message("Device adb_path must not be empty".into()));
        }

        if self.agent.program.trim().is_empty() {
            return Err(ConfigError::Message("Agent program must not be empty".into()));
        }

        if self.agent.timeout_secs == 0 {
            return Err(ConfigError::Message("Agent timeout_secs must be greater than 0".into()));
        }

        if self.agent.search_max_steps == 0 {
            return Err(ConfigError::Message("Agent search_max_steps must be greater than 0".into()));
        }

        if self.agent.order_max_steps < self.agent.search_max_steps {
            return Err(ConfigError::Message(
                "Agent order_max_steps cannot be lower than search_max_steps".into(),
            ));
        }

        if self.orchestrator.error_message_limit == 0 {
            return Err(ConfigError::Message(
                "Orchestrator error_message_limit must be greater than 0".into(),
            ));
        }

        if self.orchestrator.subscriber_buffer == 0 {
            return Err(ConfigError::Message(
                "Orchestrator subscriber_buffer must be greater than 0".into(),
            ));
        }

        if self.metrics.enabled && self.metrics.port == 0 {
            return Err(ConfigError::Message("Metrics port must be greater than 0".into()));
        }

        Ok(())
    }
}
