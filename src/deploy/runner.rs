//! External command execution
//!
//! Every AWS and SAM call goes through [`CommandRunner`] so the pipeline can
//! be driven by a scripted runner in tests.

use async_trait::async_trait;
use std::fmt;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// A single external command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

impl Invocation {
    pub fn new<I, S>(program: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.to_string(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// True when the arguments start with `prefix`
    pub fn has_prefix(&self, program: &str, prefix: &[&str]) -> bool {
        self.program == program
            && self.args.len() >= prefix.len()
            && self.args.iter().zip(prefix).all(|(arg, p)| arg.as_str() == *p)
    }

    /// Value following a `--flag` argument
    pub fn flag_value(&self, flag: &str) -> Option<&str> {
        self.args
            .iter()
            .position(|arg| arg == flag)
            .and_then(|idx| self.args.get(idx + 1))
            .map(String::as_str)
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " '{}'", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// Result of a finished command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    pub code: Option<i32>,
    /// Empty when the command streamed to the terminal
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Best single-line description of a failure
    pub fn failure_reason(&self) -> String {
        let stderr = self.stderr.trim();
        if !stderr.is_empty() {
            return stderr.lines().last().unwrap_or(stderr).to_string();
        }
        match self.code {
            Some(code) => format!("exit code {}", code),
            None => "terminated by signal".to_string(),
        }
    }
}

#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run and capture stdout/stderr
    async fn capture(&self, invocation: &Invocation) -> std::io::Result<CommandOutput>;

    /// Run with stdout/stderr attached to the terminal (long-running SAM steps)
    async fn stream(&self, invocation: &Invocation) -> std::io::Result<CommandOutput>;
}

/// Runs commands as child processes
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn capture(&self, invocation: &Invocation) -> std::io::Result<CommandOutput> {
        debug!(command = %invocation, "Running");
        let output = Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(Stdio::null())
            .output()
            .await?;

        Ok(CommandOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    async fn stream(&self, invocation: &Invocation) -> std::io::Result<CommandOutput> {
        debug!(command = %invocation, "Running (streaming output)");
        let status = Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(Stdio::null())
            .status()
            .await?;

        Ok(CommandOutput {
            success: status.success(),
            code: status.code(),
            ..CommandOutput::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_quotes_arguments_with_spaces() {
        let inv = Invocation::new("aws", ["s3", "mb", "s3://bucket", "--region", "us-east-1"]);
        assert_eq!(inv.to_string(), "aws s3 mb s3://bucket --region us-east-1");

        let inv = Invocation::new("sam", ["deploy", "--tags", "team=chat ops"]);
        assert_eq!(inv.to_string(), "sam deploy --tags 'team=chat ops'");
    }

    #[test]
    fn prefix_and_flag_lookup() {
        let inv = Invocation::new("sam", ["deploy", "--stack-name", "bedrock-chatbot-dev"]);
        assert!(inv.has_prefix("sam", &["deploy"]));
        assert!(!inv.has_prefix("sam", &["build"]));
        assert!(!inv.has_prefix("aws", &["deploy"]));
        assert_eq!(inv.flag_value("--stack-name"), Some("bedrock-chatbot-dev"));
        assert_eq!(inv.flag_value("--region"), None);
    }

    #[test]
    fn failure_reason_prefers_last_stderr_line() {
        let output = CommandOutput::failed(254, "\nAn error occurred (403)\nForbidden\n");
        assert_eq!(output.failure_reason(), "Forbidden");
        assert_eq!(CommandOutput::failed(2, "").failure_reason(), "exit code 2");
    }

    #[tokio::test]
    async fn process_runner_reports_missing_program() {
        let inv = Invocation::new("definitely-not-a-real-binary-5e1f", ["--version"]);
        let err = ProcessRunner.capture(&inv).await.unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }
}
