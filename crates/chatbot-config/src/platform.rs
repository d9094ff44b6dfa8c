// Platform detection based on environment variables
//
// Auto-detects runtime environment:
// - AWS Lambda: AWS_LAMBDA_FUNCTION_NAME env var present
// - CLI: otherwise (default)

use crate::LogFormat;
use std::env;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Cli,
    Lambda,
}

impl Platform {
    /// Auto-detect the current platform based on environment variables
    pub fn detect() -> Self {
        if env::var("AWS_LAMBDA_FUNCTION_NAME").is_ok() {
            Platform::Lambda
        } else {
            Platform::Cli
        }
    }

    /// Get platform-specific defaults
    pub fn defaults(&self) -> PlatformDefaults {
        match self {
            Platform::Cli => PlatformDefaults {
                log_level: "info",
                log_format: LogFormat::Text,
            },
            Platform::Lambda => PlatformDefaults {
                log_level: "info",
                log_format: LogFormat::Json,
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct PlatformDefaults {
    pub log_level: &'static str,
    pub log_format: LogFormat,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_defaults() {
        let cli = Platform::Cli.defaults();
        assert_eq!(cli.log_format, LogFormat::Text);

        let lambda = Platform::Lambda.defaults();
        assert_eq!(lambda.log_format, LogFormat::Json);
        assert_eq!(lambda.log_level, "info");
    }
}
