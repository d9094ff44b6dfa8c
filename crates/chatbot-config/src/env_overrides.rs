use crate::{LogFormat, RuntimeConfig};
use anyhow::{anyhow, Context, Result};
use std::str::FromStr;

pub const ENV_PREFIX: &str = "BEDROCK_CHATBOT_";

/// Abstraction over environment-variable lookups so tests can supply a map
/// instead of mutating the process environment.
pub trait EnvSource {
    fn get(&self, key: &str) -> Option<String>;

    /// Get an environment variable WITHOUT the BEDROCK_CHATBOT_ prefix
    /// Used for the variables the SAM template sets on the function
    /// (DYNAMODB_TABLE, MAX_TOKENS, ...)
    fn get_raw(&self, key: &str) -> Option<String>;
}

/// Apply environment-variable overrides (highest priority) to the runtime config.
pub fn apply_env_overrides<E: EnvSource>(config: &mut RuntimeConfig, env: &E) -> Result<()> {
    // Logging
    if let Some(level) = get_env_string(env, "LOG_LEVEL") {
        config.log.level = level;
    }
    if let Some(format) = get_env_string(env, "LOG_FORMAT") {
        config.log.format = format
            .parse::<LogFormat>()
            .context("Invalid BEDROCK_CHATBOT_LOG_FORMAT value")?;
    }

    // Deployment
    if let Some(prefix) = get_env_string(env, "BUCKET_PREFIX") {
        config.deploy.bucket_prefix = prefix;
    }
    if let Some(region) = get_env_string(env, "DEFAULT_REGION") {
        config.deploy.default_region = region;
    }
    if let Some(region) = get_env_string(env, "FIXED_REGION") {
        config.deploy.fixed_region = region;
    }
    if let Some(template) = get_env_string(env, "TEMPLATE_FILE") {
        config.deploy.template_file = Some(template).filter(|t| !t.is_empty());
    }
    if let Some(val) = get_env_parsed::<bool, _>(env, "USE_CONTAINER")? {
        config.deploy.use_container = val;
    }
    if let Some(key) = get_env_string(env, "ENDPOINT_OUTPUT_KEY") {
        config.deploy.endpoint_output_key = key;
    }

    // Chatbot function (variables set by the SAM template, no prefix)
    if let Some(table) = get_raw_env_string(env, "DYNAMODB_TABLE") {
        config.chatbot.table_name = Some(table).filter(|t| !t.is_empty());
    }
    if let Some(val) = get_raw_env_parsed::<u32, _>(env, "MAX_TOKENS")? {
        config.chatbot.max_tokens = val;
    }
    if let Some(val) = get_raw_env_parsed::<f32, _>(env, "TEMPERATURE")? {
        config.chatbot.temperature = val;
    }
    if let Some(region) = get_raw_env_string(env, "BEDROCK_REGION") {
        config.chatbot.bedrock_region = region;
    }
    if let Some(model_id) = get_raw_env_string(env, "DEFAULT_MODEL_ID") {
        config.chatbot.default_model_id = model_id;
    }

    // Chatbot limits
    if let Some(val) = get_env_parsed::<usize, _>(env, "MAX_MESSAGE_CHARS")? {
        config.chatbot.max_message_chars = val;
    }
    if let Some(val) = get_env_parsed::<usize, _>(env, "HISTORY_LIMIT")? {
        config.chatbot.history_limit = val;
    }
    if let Some(val) = get_env_parsed::<u64, _>(env, "HISTORY_TTL_SECS")? {
        config.chatbot.history_ttl_secs = val;
    }

    Ok(())
}

fn get_env_string<E: EnvSource>(env: &E, key: &str) -> Option<String> {
    env.get(key)
}

fn get_raw_env_string<E: EnvSource>(env: &E, key: &str) -> Option<String> {
    env.get_raw(key)
}

fn get_env_parsed<T, E>(env: &E, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    E: EnvSource,
{
    match get_env_string(env, key) {
        Some(val) => {
            let parsed = val
                .trim()
                .parse::<T>()
                .map_err(|e| anyhow!("Failed to parse {}{}: {}", ENV_PREFIX, key, e))?;
            Ok(Some(parsed))
        }
        None => Ok(None),
    }
}

fn get_raw_env_parsed<T, E>(env: &E, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    E: EnvSource,
{
    match get_raw_env_string(env, key) {
        Some(val) => {
            let parsed = val
                .trim()
                .parse::<T>()
                .map_err(|e| anyhow!("Failed to parse {}: {}", key, e))?;
            Ok(Some(parsed))
        }
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[derive(Default)]
    struct MapEnv {
        vars: HashMap<String, String>,
    }

    impl MapEnv {
        fn with(mut self, key: &str, value: &str) -> Self {
            self.vars.insert(key.to_string(), value.to_string());
            self
        }
    }

    impl EnvSource for MapEnv {
        fn get(&self, key: &str) -> Option<String> {
            self.vars.get(&format!("{}{}", ENV_PREFIX, key)).cloned()
        }

        fn get_raw(&self, key: &str) -> Option<String> {
            self.vars.get(key).cloned()
        }
    }

    #[test]
    fn prefixed_vars_override_deploy_settings() {
        let env = MapEnv::default()
            .with("BEDROCK_CHATBOT_BUCKET_PREFIX", "team-artifacts")
            .with("BEDROCK_CHATBOT_DEFAULT_REGION", "eu-west-1")
            .with("BEDROCK_CHATBOT_USE_CONTAINER", "true")
            .with("BEDROCK_CHATBOT_LOG_FORMAT", "json");
        let mut config = RuntimeConfig::default();
        apply_env_overrides(&mut config, &env).unwrap();

        assert_eq!(config.deploy.bucket_prefix, "team-artifacts");
        assert_eq!(config.deploy.default_region, "eu-west-1");
        assert!(config.deploy.use_container);
        assert_eq!(config.log.format, LogFormat::Json);
    }

    #[test]
    fn raw_function_vars_override_chatbot_settings() {
        let env = MapEnv::default()
            .with("DYNAMODB_TABLE", "chatbot-dev-conversations")
            .with("MAX_TOKENS", "2048")
            .with("TEMPERATURE", "0.3");
        let mut config = RuntimeConfig::default();
        apply_env_overrides(&mut config, &env).unwrap();

        assert_eq!(
            config.chatbot.table_name.as_deref(),
            Some("chatbot-dev-conversations")
        );
        assert_eq!(config.chatbot.max_tokens, 2048);
        assert!((config.chatbot.temperature - 0.3).abs() < 1e-6);
    }

    #[test]
    fn empty_table_name_disables_history() {
        let env = MapEnv::default().with("DYNAMODB_TABLE", "");
        let mut config = RuntimeConfig::default();
        apply_env_overrides(&mut config, &env).unwrap();
        assert!(config.chatbot.table_name.is_none());
    }

    #[test]
    fn unparsable_values_are_errors() {
        let env = MapEnv::default().with("MAX_TOKENS", "many");
        let mut config = RuntimeConfig::default();
        let err = apply_env_overrides(&mut config, &env).unwrap_err();
        assert!(err.to_string().contains("MAX_TOKENS"));

        let env = MapEnv::default().with("BEDROCK_CHATBOT_LOG_FORMAT", "xml");
        assert!(apply_env_overrides(&mut config, &env).is_err());
    }
}
