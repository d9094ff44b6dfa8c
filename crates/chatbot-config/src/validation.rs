// Configuration validation
//
// Validates that required fields are present and values are sensible

use crate::{ChatbotConfig, DeployConfig, LogConfig, RuntimeConfig};
use anyhow::{bail, Result};
use tracing::warn;

pub fn validate_config(config: &RuntimeConfig) -> Result<()> {
    validate_deploy_config(&config.deploy)?;
    validate_chatbot_config(&config.chatbot)?;
    validate_log_config(&config.log)?;
    Ok(())
}

fn validate_deploy_config(config: &DeployConfig) -> Result<()> {
    if config.bucket_prefix.is_empty() {
        bail!("deploy.bucket_prefix must not be empty");
    }

    if !config
        .bucket_prefix
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        bail!("deploy.bucket_prefix must contain only lowercase letters, numbers, and hyphens");
    }

    if config.default_region.is_empty() {
        bail!("deploy.default_region must not be empty");
    }

    if config.fixed_region.is_empty() {
        bail!("deploy.fixed_region must not be empty");
    }

    if config.endpoint_output_key.is_empty() {
        bail!("deploy.endpoint_output_key must not be empty");
    }

    for key in config.parameter_overrides.keys() {
        if key.is_empty() || key.contains('=') || key.contains(char::is_whitespace) {
            bail!("deploy.parameter_overrides has an invalid parameter name: '{}'", key);
        }
    }

    if config.parameter_overrides.contains_key("Environment") {
        warn!("deploy.parameter_overrides sets Environment; the command-line environment wins");
    }

    Ok(())
}

fn validate_chatbot_config(config: &ChatbotConfig) -> Result<()> {
    if config.default_model_id.is_empty() {
        bail!("chatbot.default_model_id must not be empty");
    }

    if config.max_tokens == 0 {
        bail!("chatbot.max_tokens must be greater than 0");
    }

    if !(0.0..=1.0).contains(&config.temperature) {
        bail!("chatbot.temperature must be between 0 and 1");
    }

    if config.bedrock_region.is_empty() {
        bail!("chatbot.bedrock_region must not be empty");
    }

    if config.max_message_chars == 0 {
        bail!("chatbot.max_message_chars must be greater than 0");
    }

    if config.history_limit == 0 {
        bail!("chatbot.history_limit must be greater than 0");
    }

    if config.history_ttl_secs == 0 {
        bail!("chatbot.history_ttl_secs must be greater than 0");
    }

    if config.history_limit % 2 != 0 {
        warn!(
            history_limit = config.history_limit,
            "chatbot.history_limit is odd; stored history may start with an assistant reply"
        );
    }

    Ok(())
}

fn validate_log_config(config: &LogConfig) -> Result<()> {
    if config.level.trim().is_empty() {
        bail!("log.level must not be empty");
    }
    Ok(())
}
