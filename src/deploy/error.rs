//! Error types for the deployment orchestrator

use std::fmt;
use thiserror::Error;

/// How an external command ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitDetail {
    Code(i32),
    /// Terminated by a signal (no exit code)
    Signal,
}

impl ExitDetail {
    pub fn from_code(code: Option<i32>) -> Self {
        code.map(ExitDetail::Code).unwrap_or(ExitDetail::Signal)
    }
}

impl fmt::Display for ExitDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitDetail::Code(code) => write!(f, "exit code {}", code),
            ExitDetail::Signal => write!(f, "terminated by signal"),
        }
    }
}

/// Fatal deployment failures. Every variant stops the run and maps to exit status 1.
#[derive(Debug, Error)]
pub enum DeployError {
    /// A required command-line tool is not installed
    #[error("{tool} is not installed or not on PATH\n\nInstall it first: {install_hint}")]
    ToolMissing {
        tool: String,
        install_hint: &'static str,
    },

    /// AWS credentials could not be resolved
    #[error("AWS credentials are not configured: {reason}\n\nRun `aws configure` or set AWS_PROFILE")]
    CredentialsUnavailable { reason: String },

    /// Credentials resolve but lack a permission the stack needs
    #[error("no {service} access in {region}: {reason}\n\nCheck the IAM policy and model access settings for this account")]
    PermissionDenied {
        service: &'static str,
        region: String,
        reason: String,
    },

    #[error("sam build failed ({status})")]
    BuildFailed { status: ExitDetail },

    #[error("could not create deployment bucket {bucket}: {reason}")]
    BucketCreateFailed { bucket: String, reason: String },

    #[error("sam deploy failed for stack {stack} ({status})")]
    DeployFailed { stack: String, status: ExitDetail },

    /// Stack outputs could not be read
    #[error("could not query outputs of stack {stack}: {reason}")]
    OutputsUnavailable { stack: String, reason: String },

    #[error("invalid deployment parameters: {0}")]
    InvalidConfig(String),

    /// The command exists but could not be started
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

impl DeployError {
    /// Process exit status for this error
    pub fn exit_code(&self) -> u8 {
        1
    }

    /// Short stable identifier for log fields
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ToolMissing { .. } => "tool_missing",
            Self::CredentialsUnavailable { .. } => "credentials_unavailable",
            Self::PermissionDenied { .. } => "permission_denied",
            Self::BuildFailed { .. } => "build_failed",
            Self::BucketCreateFailed { .. } => "bucket_create_failed",
            Self::DeployFailed { .. } => "deploy_failed",
            Self::OutputsUnavailable { .. } => "outputs_unavailable",
            Self::InvalidConfig(_) => "invalid_config",
            Self::Spawn { .. } => "spawn_failed",
        }
    }

    pub(crate) fn tool_missing(tool: &str) -> Self {
        let install_hint = match tool {
            "sam" => "https://docs.aws.amazon.com/serverless-application-model/latest/developerguide/install-sam-cli.html",
            "aws" => "https://docs.aws.amazon.com/cli/latest/userguide/getting-started-install.html",
            _ => "see the tool's installation guide",
        };
        Self::ToolMissing {
            tool: tool.to_string(),
            install_hint,
        }
    }
}
