// Configuration source loading.
//
// Priority order:
// 1. Environment variables (BEDROCK_CHATBOT_* prefix, plus the raw function variables)
// 2. Config file path from BEDROCK_CHATBOT_CONFIG
// 3. Inline config content from BEDROCK_CHATBOT_CONFIG_CONTENT
// 4. Default config file (./chatbot.toml)
// 5. Platform defaults (based on auto-detected Platform)
//
// A config file is merged onto the platform defaults: settings it leaves
// out keep the platform value (e.g. JSON logs on Lambda).

use crate::env_overrides::{self, EnvSource, ENV_PREFIX};
use crate::platform::Platform;
use crate::{FileConfig, RuntimeConfig};
use anyhow::{Context, Result};
use std::env;
use std::path::Path;
use tracing::debug;

const DEFAULT_CONFIG_FILE: &str = "./chatbot.toml";

/// Load configuration for the detected platform using native environment/file access.
pub fn load_config(platform: Platform) -> Result<RuntimeConfig> {
    let env_source = StdEnvSource;
    let file_config = load_from_file(&env_source)?;
    resolve(platform, file_config, &env_source)
}

/// Load configuration from a specific file path (for CLI --config flag).
/// Returns error if file doesn't exist or can't be parsed.
pub fn load_from_file_path(path: impl AsRef<Path>) -> Result<RuntimeConfig> {
    let file_config = read_file(path.as_ref())?;
    resolve(Platform::detect(), Some(file_config), &StdEnvSource)
}

/// Merge the layers and validate the result
pub(crate) fn resolve<E: EnvSource>(
    platform: Platform,
    file_config: Option<FileConfig>,
    env: &E,
) -> Result<RuntimeConfig> {
    let mut config = RuntimeConfig::from_platform_defaults(platform);
    if let Some(file_config) = file_config {
        config.merge(file_config);
    }
    env_overrides::apply_env_overrides(&mut config, env)?;
    config.validate()?;
    Ok(config)
}

fn load_from_file<E: EnvSource>(env: &E) -> Result<Option<FileConfig>> {
    if let Some(path) = env.get("CONFIG") {
        return read_file(Path::new(&path)).map(Some);
    }

    if let Some(content) = env.get("CONFIG_CONTENT") {
        let config: FileConfig = toml::from_str(&content).with_context(|| {
            format!("Failed to parse inline config from {}CONFIG_CONTENT", ENV_PREFIX)
        })?;
        return Ok(Some(config));
    }

    let default_path = Path::new(DEFAULT_CONFIG_FILE);
    if default_path.exists() {
        return read_file(default_path).map(Some);
    }

    Ok(None)
}

fn read_file(path: &Path) -> Result<FileConfig> {
    debug!(path = %path.display(), "Reading config file");
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

struct StdEnvSource;

impl EnvSource for StdEnvSource {
    fn get(&self, key: &str) -> Option<String> {
        env::var(format!("{}{}", ENV_PREFIX, key)).ok()
    }

    fn get_raw(&self, key: &str) -> Option<String> {
        env::var(key).ok()
    }
}
