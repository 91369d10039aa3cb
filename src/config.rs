use serde::{Deserialize, Serialize};

use crate::condenser::MAX_BULLETS;
use crate::priority::MAX_RECOMMENDATIONS;

/// Main configuration structure loaded from crew_digest.toml and environment variables
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    pub backend: BackendConfig,
    pub summarizer: SummarizerConfig,
    pub discovery: DiscoveryConfig,
    pub limits: LimitsConfig,
    /// Runtime configuration loaded from environment variables
    #[serde(skip)]
    pub runtime: RuntimeConfig,
}

/// Where the analysis crews listen
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackendConfig {
    pub host: String,
    pub market_segment: String,
}

/// Executive-summary condensation call
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SummarizerConfig {
    pub endpoint: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub max_input_chars: usize,
    pub min_input_chars: usize,
    pub max_bullets: usize,
    pub system_prompt: String,
}

/// Competitor discovery call
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DiscoveryConfig {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub competitor_count: usize,
    pub min_name_chars: usize,
    pub max_name_chars: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LimitsConfig {
    pub max_recommendations: usize,
}

/// Runtime configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub groq_api_key: Option<String>,
    pub log_level: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            groq_api_key: None,
            log_level: "crew_digest=info".to_string(),
        }
    }
}

impl RuntimeConfig {
    /// Load runtime configuration from environment variables
    pub fn load_from_env() -> Self {
        Self {
            groq_api_key: std::env::var("GROQ_API_KEY")
                .ok()
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty()),
            log_level: std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "crew_digest=info".to_string()),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            host: "http://localhost".to_string(),
            market_segment: "India".to_string(),
        }
    }
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            endpoint: crate::clients::groq::DEFAULT_ENDPOINT.to_string(),
            model: "llama-3.3-70b-versatile".to_string(),
            max_tokens: 500,
            temperature: 0.5,
            max_input_chars: 4000,
            min_input_chars: 100,
            max_bullets: 6,
            system_prompt: "You are an executive business analyst specializing in competitive intelligence. Your task is to extract the most critical, actionable insights from reports and present them as concise bullet points.".to_string(),
        }
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            model: "llama-3.3-70b-versatile".to_string(),
            max_tokens: 50,
            temperature: 0.3,
            competitor_count: 3,
            min_name_chars: 2,
            max_name_chars: 50,
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_recommendations: MAX_RECOMMENDATIONS,
        }
    }
}

impl Config {
    /// Load configuration from TOML file and environment variables
    /// Uses CREW_DIGEST_CONFIG environment variable or defaults to "crew_digest.toml"
    pub fn load() -> anyhow::Result<Self> {
        crate::load_env();

        let config_path = std::env::var("CREW_DIGEST_CONFIG")
            .unwrap_or_else(|_| "crew_digest.toml".to_string());

        let mut config: Config = if let Ok(content) = std::fs::read_to_string(&config_path) {
            Self::from_toml_str(&content)?
        } else {
            tracing::warn!("Config file {} not found, using defaults", config_path);
            Self::default()
        };

        config.apply_env_overrides();
        config.runtime = RuntimeConfig::load_from_env();
        config.validate()?;

        Ok(config)
    }

    /// Parse a TOML document; missing sections take their defaults
    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        #[derive(Deserialize)]
        struct Partial {
            #[serde(default)]
            backend: Option<BackendConfig>,
            #[serde(default)]
            summarizer: Option<SummarizerConfig>,
            #[serde(default)]
            discovery: Option<DiscoveryConfig>,
            #[serde(default)]
            limits: Option<LimitsConfig>,
        }

        let partial: Partial = toml::from_str(content)?;
        Ok(Self {
            backend: partial.backend.unwrap_or_default(),
            summarizer: partial.summarizer.unwrap_or_default(),
            discovery: partial.discovery.unwrap_or_default(),
            limits: partial.limits.unwrap_or_default(),
            runtime: RuntimeConfig::default(),
        })
    }

    /// Env-first overrides for the values operators change most
    pub fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("CREW_BACKEND_HOST") {
            self.backend.host = host;
            tracing::debug!("CREW_BACKEND_HOST env override applied");
        }
        if let Ok(model) = std::env::var("CREW_SUMMARY_MODEL") {
            self.summarizer.model = model;
            tracing::debug!("CREW_SUMMARY_MODEL env override applied");
        }
        if let Ok(model) = std::env::var("CREW_DISCOVERY_MODEL") {
            self.discovery.model = model;
            tracing::debug!("CREW_DISCOVERY_MODEL env override applied");
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if !self.backend.host.starts_with("http://") && !self.backend.host.starts_with("https://")
        {
            tracing::warn!(
                "Backend host '{}' doesn't start with http:// or https://",
                self.backend.host
            );
        }
        if !(1..=MAX_BULLETS).contains(&self.summarizer.max_bullets) {
            anyhow::bail!("summarizer.max_bullets must be between 1 and {}", MAX_BULLETS);
        }
        if self.summarizer.max_tokens == 0 || self.discovery.max_tokens == 0 {
            anyhow::bail!("max_tokens must be > 0");
        }
        if self.summarizer.max_input_chars < self.summarizer.min_input_chars {
            anyhow::bail!(
                "summarizer.max_input_chars ({}) must be >= min_input_chars ({})",
                self.summarizer.max_input_chars,
                self.summarizer.min_input_chars
            );
        }
        if !(1..=MAX_RECOMMENDATIONS).contains(&self.limits.max_recommendations) {
            anyhow::bail!(
                "limits.max_recommendations must be between 1 and {}",
                MAX_RECOMMENDATIONS
            );
        }
        if self.discovery.competitor_count == 0 {
            anyhow::bail!("discovery.competitor_count must be > 0");
        }
        if self.discovery.min_name_chars == 0
            || self.discovery.min_name_chars > self.discovery.max_name_chars
        {
            anyhow::bail!("discovery name length bounds are invalid");
        }
        if let Some(key) = &self.runtime.groq_api_key
            && !key.starts_with("gsk_")
        {
            tracing::warn!("GROQ_API_KEY doesn't start with gsk_; requests may be rejected");
        }
        Ok(())
    }
}
