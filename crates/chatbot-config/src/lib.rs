// chatbot-config - Unified configuration for the deploy CLI and the Lambda
//
// Supports configuration from multiple sources:
// 1. Environment variables (highest priority)
// 2. Config file path from BEDROCK_CHATBOT_CONFIG env var (or --config)
// 3. Config file contents from BEDROCK_CHATBOT_CONFIG_CONTENT env var
// 4. Default config file location (./chatbot.toml)
// 5. Platform-specific defaults (lowest priority)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

mod env_overrides;
mod platform;
mod sources;
mod validation;

pub use env_overrides::{apply_env_overrides, EnvSource, ENV_PREFIX};
pub use platform::Platform;

/// Main runtime configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RuntimeConfig {
    #[serde(default)]
    pub deploy: DeployConfig,

    #[serde(default)]
    pub chatbot: ChatbotConfig,

    #[serde(default)]
    pub log: LogConfig,
}

/// Settings for the SAM build/deploy orchestrator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeployConfig {
    /// Deployment bucket is `<bucket_prefix>-<region>-<account id>`
    pub bucket_prefix: String,
    /// Region used by the `api` variant when none is given on the command line
    pub default_region: String,
    /// Region the `bedrock` variant always deploys to
    pub fixed_region: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_file: Option<String>,
    /// Pass `--use-container` to `sam build`
    pub use_container: bool,
    /// Stack output holding the chat endpoint URL
    pub endpoint_output_key: String,
    /// Extra `Key=Value` pairs for `--parameter-overrides`
    pub parameter_overrides: BTreeMap<String, String>,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            bucket_prefix: "chatbot-sam-artifacts".to_string(),
            default_region: "us-east-1".to_string(),
            fixed_region: "ap-northeast-2".to_string(),
            template_file: None,
            use_container: false,
            endpoint_output_key: "ChatbotApiUrl".to_string(),
            parameter_overrides: BTreeMap::new(),
        }
    }
}

/// Settings for the chatbot Lambda function
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatbotConfig {
    pub default_model_id: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub bedrock_region: String,
    /// DynamoDB table for session history; history is disabled when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_name: Option<String>,
    pub max_message_chars: usize,
    pub history_limit: usize,
    pub history_ttl_secs: u64,
}

impl Default for ChatbotConfig {
    fn default() -> Self {
        Self {
            default_model_id: "anthropic.claude-sonnet-4-20250514-v1:0".to_string(),
            max_tokens: 1000,
            temperature: 0.7,
            bedrock_region: "ap-northeast-2".to_string(),
            table_name: None,
            max_message_chars: 10_000,
            history_limit: 20,
            history_ttl_secs: 24 * 60 * 60,
        }
    }
}

/// Logging configuration shared by both binaries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

/// One TOML layer. Only the settings it names override the layer below.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct FileConfig {
    pub deploy: Option<DeployConfig>,
    pub chatbot: Option<ChatbotConfig>,
    #[serde(default)]
    pub log: LogFileConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct LogFileConfig {
    pub level: Option<String>,
    pub format: Option<LogFormat>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Text => write!(f, "text"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => anyhow::bail!("Unsupported log format: {}. Supported: text, json", s),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from all sources with priority
    pub fn load() -> Result<Self> {
        let platform = Platform::detect();
        sources::load_config(platform)
    }

    /// Load configuration for a specific platform (useful for testing)
    pub fn load_for_platform(platform: Platform) -> Result<Self> {
        sources::load_config(platform)
    }

    /// Load configuration from an explicit file (CLI `--config`)
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        sources::load_from_file_path(path)
    }

    /// Defaults for the given platform, before any file or env overrides
    pub fn from_platform_defaults(platform: Platform) -> Self {
        let defaults = platform.defaults();
        Self {
            log: LogConfig {
                level: defaults.log_level.to_string(),
                format: defaults.log_format,
            },
            ..Self::default()
        }
    }

    /// Merge a file layer into this one; log fields merge individually
    pub(crate) fn merge(&mut self, other: FileConfig) {
        if let Some(deploy) = other.deploy {
            self.deploy = deploy;
        }
        if let Some(chatbot) = other.chatbot {
            self.chatbot = chatbot;
        }
        if let Some(level) = other.log.level {
            self.log.level = level;
        }
        if let Some(format) = other.log.format {
            self.log.format = format;
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_from_str() {
        assert_eq!("text".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("pretty".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_default_configs() {
        let deploy = DeployConfig::default();
        assert_eq!(deploy.bucket_prefix, "chatbot-sam-artifacts");
        assert_eq!(deploy.fixed_region, "ap-northeast-2");
        assert_eq!(deploy.endpoint_output_key, "ChatbotApiUrl");

        let chatbot = ChatbotConfig::default();
        assert_eq!(chatbot.max_tokens, 1000);
        assert_eq!(chatbot.history_limit, 20);
        assert_eq!(chatbot.history_ttl_secs, 86_400);
        assert!(chatbot.table_name.is_none());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: RuntimeConfig = toml::from_str(
            r#"
            [deploy]
            bucket_prefix = "my-artifacts"

            [deploy.parameter_overrides]
            ModelId = "amazon.titan-text-express-v1"

            [log]
            format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.deploy.bucket_prefix, "my-artifacts");
        assert_eq!(config.deploy.default_region, "us-east-1");
        assert_eq!(
            config.deploy.parameter_overrides.get("ModelId").map(String::as_str),
            Some("amazon.titan-text-express-v1")
        );
        assert_eq!(config.log.format, LogFormat::Json);
        assert_eq!(config.log.level, "info");
        assert_eq!(config.chatbot, ChatbotConfig::default());
    }
}
