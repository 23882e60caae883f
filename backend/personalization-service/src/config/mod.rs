use anyhow::{anyhow, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub service_name: String,

    // HTTP server config
    pub http_host: String,
    pub http_port: u16,

    // Redis (pattern snapshots). Snapshots are disabled when unset.
    #[serde(default)]
    pub redis_url: Option<String>,
    pub snapshot_ttl_days: u32,

    #[serde(default)]
    pub engine: EngineConfig,
}

/// Tuning knobs for the personalization engine.
///
/// Defaults reproduce the production rule set; override them through
/// `PERSONALIZATION_ENGINE__<FIELD>` environment variables.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Observations per trend window. A trend needs two full windows.
    pub trend_window: usize,
    /// Latest trend value above which progress is celebrated
    pub celebration_threshold: f64,
    /// Topic count above which deep reflection is suggested
    pub deep_reflection_min_topics: usize,
    /// Conversation turns retained per user for prompt construction
    pub context_window: usize,
    /// Turns rendered into the generator prompt
    pub prompt_history_turns: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            trend_window: 7,
            celebration_threshold: 20.0,
            deep_reflection_min_topics: 10,
            context_window: 10,
            prompt_history_turns: 5,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        dotenv::dotenv().ok();

        let config = config::Config::builder()
            .set_default("service_name", "personalization-service")?
            .set_default("http_host", "0.0.0.0")?
            .set_default("http_port", 8014)?
            .set_default("snapshot_ttl_days", 90)?
            .add_source(
                config::Environment::with_prefix("PERSONALIZATION")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    pub fn validate(&self) -> Result<()> {
        if self.http_port == 0 {
            return Err(anyhow!("HTTP port must be greater than 0"));
        }

        if let Some(url) = &self.redis_url {
            if url.is_empty() {
                return Err(anyhow!("Redis URL must not be empty when set"));
            }
        }

        self.engine.validate()
    }

    pub fn http_bind_address(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.trend_window == 0 {
            return Err(anyhow!("Trend window must be greater than 0"));
        }

        if self.context_window == 0 {
            return Err(anyhow!("Context window must be greater than 0"));
        }

        if self.prompt_history_turns > self.context_window {
            return Err(anyhow!(
                "Prompt history ({}) cannot exceed the context window ({})",
                self.prompt_history_turns,
                self.context_window
            ));
        }

        Ok(())
    }
}
