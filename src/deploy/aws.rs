//! AWS CLI and SAM CLI command lines
//!
//! Builders only; nothing here runs a process.

use chatbot_config::DeployConfig;

use super::params::DeploymentParameters;
use super::runner::Invocation;

pub const SAM: &str = "sam";
pub const AWS: &str = "aws";

pub fn version(tool: &str) -> Invocation {
    Invocation::new(tool, ["--version"])
}

/// Prints the bare 12-digit account id
pub fn caller_identity() -> Invocation {
    Invocation::new(
        AWS,
        [
            "sts",
            "get-caller-identity",
            "--query",
            "Account",
            "--output",
            "text",
        ],
    )
}

/// Read-only call that fails without `bedrock:ListFoundationModels`
pub fn bedrock_probe(region: &str) -> Invocation {
    Invocation::new(
        AWS,
        [
            "bedrock",
            "list-foundation-models",
            "--region",
            region,
            "--by-provider",
            "anthropic",
            "--query",
            "modelSummaries[0].modelId",
            "--output",
            "text",
        ],
    )
}

pub fn head_bucket(bucket: &str, region: &str) -> Invocation {
    Invocation::new(
        AWS,
        ["s3api", "head-bucket", "--bucket", bucket, "--region", region],
    )
}

pub fn make_bucket(bucket: &str, region: &str) -> Invocation {
    let uri = format!("s3://{}", bucket);
    Invocation::new(AWS, ["s3", "mb", uri.as_str(), "--region", region])
}

pub fn sam_build(params: &DeploymentParameters, config: &DeployConfig) -> Invocation {
    let mut args = vec!["build".to_string(), "--region".to_string(), params.region.clone()];
    if let Some(template) = &config.template_file {
        args.push("--template-file".to_string());
        args.push(template.clone());
    }
    if config.use_container {
        args.push("--use-container".to_string());
    }
    Invocation::new(SAM, args)
}

pub fn sam_deploy(params: &DeploymentParameters, bucket: &str, config: &DeployConfig) -> Invocation {
    let mut args: Vec<String> = [
        "deploy",
        "--stack-name",
        params.stack_name.as_str(),
        "--region",
        params.region.as_str(),
        "--capabilities",
        "CAPABILITY_IAM",
        "--s3-bucket",
        bucket,
        "--no-confirm-changeset",
        "--no-fail-on-empty-changeset",
        "--parameter-overrides",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();

    // SAM splits a single override string on whitespace
    let overrides: Vec<String> = std::iter::once(format!("Environment={}", params.environment))
        .chain(
            config
                .parameter_overrides
                .iter()
                .filter(|(key, _)| key.as_str() != "Environment")
                .map(|(key, value)| format!("{}={}", key, quote_override(value))),
        )
        .collect();
    args.push(overrides.join(" "));

    Invocation::new(SAM, args)
}

fn quote_override(value: &str) -> String {
    if value.contains(char::is_whitespace) {
        format!("\"{}\"", value.replace('"', "\\\""))
    } else {
        value.to_string()
    }
}

/// Stack outputs as a JSON array (`null` when the stack has none)
pub fn describe_stack_outputs(stack_name: &str, region: &str) -> Invocation {
    Invocation::new(
        AWS,
        [
            "cloudformation",
            "describe-stacks",
            "--stack-name",
            stack_name,
            "--region",
            region,
            "--query",
            "Stacks[0].Outputs",
            "--output",
            "json",
        ],
    )
}
