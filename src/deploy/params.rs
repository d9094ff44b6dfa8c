//! Deployment parameters and resource naming
//!
//! Stack and bucket names are pure functions of their inputs so repeated
//! runs target the same resources.

use chatbot_config::DeployConfig;
use clap::ValueEnum;
use tracing::warn;

use super::DeployError;

/// Which flavour of the stack to deploy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Variant {
    /// Bedrock chatbot pinned to the Seoul region, with preflight checks
    #[default]
    Bedrock,
    /// Regional chatbot API, region from the command line, no preflight
    Api,
}

impl Variant {
    pub fn stack_prefix(&self) -> &'static str {
        match self {
            Variant::Bedrock => "bedrock-chatbot-",
            Variant::Api => "chatbot-api-",
        }
    }

    pub fn runs_preflight(&self) -> bool {
        matches!(self, Variant::Bedrock)
    }

    fn region_is_fixed(&self) -> bool {
        matches!(self, Variant::Bedrock)
    }
}

impl std::fmt::Display for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Variant::Bedrock => write!(f, "bedrock"),
            Variant::Api => write!(f, "api"),
        }
    }
}

pub const DEFAULT_ENVIRONMENT: &str = "dev";

const ACCOUNT_ID_PLACEHOLDER: &str = "000000000000";

/// Resolved inputs for one deployment run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentParameters {
    pub variant: Variant,
    pub environment: String,
    pub region: String,
    pub stack_name: String,
}

impl DeploymentParameters {
    /// Resolve positional arguments against the variant and config defaults
    pub fn resolve(
        variant: Variant,
        environment: Option<&str>,
        region: Option<&str>,
        config: &DeployConfig,
    ) -> Result<Self, DeployError> {
        let environment = environment.unwrap_or(DEFAULT_ENVIRONMENT).to_string();
        validate_environment(&environment).map_err(DeployError::InvalidConfig)?;

        let region = if variant.region_is_fixed() {
            if let Some(requested) = region.filter(|r| *r != config.fixed_region) {
                warn!(
                    requested = %requested,
                    fixed = %config.fixed_region,
                    "The {} variant always deploys to its fixed region; ignoring region argument",
                    variant
                );
            }
            config.fixed_region.clone()
        } else {
            region.unwrap_or(&config.default_region).to_string()
        };
        validate_region(&region).map_err(DeployError::InvalidConfig)?;

        // Account ids are always 12 digits, so the bucket name is checkable now
        let bucket = bucket_name(&config.bucket_prefix, &region, ACCOUNT_ID_PLACEHOLDER);
        validate_bucket_name(&bucket).map_err(|e| {
            DeployError::InvalidConfig(format!(
                "bucket prefix '{}' in {}: {}",
                config.bucket_prefix, region, e
            ))
        })?;

        Ok(Self {
            variant,
            stack_name: stack_name(variant, &environment),
            environment,
            region,
        })
    }

    /// Name of the artifact bucket for this region and account
    pub fn deployment_bucket(&self, prefix: &str, account_id: &str) -> Result<String, DeployError> {
        let bucket = bucket_name(prefix, &self.region, account_id);
        validate_bucket_name(&bucket)
            .map_err(|e| DeployError::InvalidConfig(format!("bucket name '{}': {}", bucket, e)))?;
        Ok(bucket)
    }
}

pub fn stack_name(variant: Variant, environment: &str) -> String {
    format!("{}{}", variant.stack_prefix(), environment)
}

pub fn bucket_name(prefix: &str, region: &str, account_id: &str) -> String {
    format!("{}-{}-{}", prefix, region, account_id)
}

/// Extract the account id from `aws sts get-caller-identity --output text`
pub fn parse_account_id(stdout: &str) -> Result<String, DeployError> {
    let account = stdout.trim();
    if account.len() == 12 && account.chars().all(|c| c.is_ascii_digit()) {
        Ok(account.to_string())
    } else {
        Err(DeployError::CredentialsUnavailable {
            reason: format!("unexpected account id '{}'", account),
        })
    }
}

fn validate_environment(environment: &str) -> Result<(), String> {
    if environment.is_empty() {
        return Err("environment name cannot be empty".to_string());
    }
    if !environment.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return Err(format!(
            "environment '{}' must start with a letter",
            environment
        ));
    }
    if !environment
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-')
    {
        return Err(format!(
            "environment '{}' may only contain letters, numbers, and hyphens",
            environment
        ));
    }
    // CloudFormation caps stack names at 128 characters
    if environment.len() > 128 - Variant::Bedrock.stack_prefix().len() {
        return Err(format!("environment '{}' is too long", environment));
    }
    Ok(())
}

fn validate_region(region: &str) -> Result<(), String> {
    if region.is_empty() {
        return Err("region cannot be empty".to_string());
    }
    if !region
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(format!("'{}' is not a valid AWS region", region));
    }
    Ok(())
}

fn validate_bucket_name(input: &str) -> Result<(), String> {
    if input.is_empty() {
        return Err("Bucket name cannot be empty".to_string());
    }
    if input.len() < 3 || input.len() > 63 {
        return Err("Bucket name must be 3-63 characters".to_string());
    }
    if !input
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(
            "Bucket name must contain only lowercase letters, numbers, and hyphens".to_string(),
        );
    }
    if input.starts_with('-') || input.ends_with('-') {
        return Err("Bucket name cannot start or end with a hyphen".to_string());
    }
    Ok(())
}
