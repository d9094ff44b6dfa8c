use anyhow::{Context, Result};
use bedrock_chatbot::deploy::{DeployArgs, DeployCommand, DeployError};
use chatbot_config::RuntimeConfig;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

/// Build and deploy the serverless Bedrock chatbot with AWS SAM
#[derive(Parser)]
#[command(name = "bedrock-chatbot")]
#[command(version)]
#[command(about = "Build and deploy the serverless Bedrock chatbot with AWS SAM", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Log level: trace, debug, info, warn, error
    #[arg(short = 'v', long, value_name = "LEVEL", global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build, upload and deploy the stack, then print its outputs
    Deploy(DeployArgs),
    /// Print outputs, example requests and console links of a deployed stack
    Outputs(DeployArgs),
}

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let (code, message) = failure(&err);
            eprintln!("{}", message);
            ExitCode::from(code)
        }
    }
}

/// Exit status and stderr line for a failed run
fn failure(err: &anyhow::Error) -> (u8, String) {
    let code = err
        .downcast_ref::<DeployError>()
        .map(DeployError::exit_code)
        .unwrap_or(1);
    (code, format!("❌ {:#}", err))
}

fn run(cli: Cli) -> Result<()> {
    let mut config = if let Some(config_path) = &cli.config {
        RuntimeConfig::load_from_path(config_path)
            .with_context(|| format!("Failed to load config from {}", config_path.display()))?
    } else {
        RuntimeConfig::load().context("Failed to load configuration")?
    };

    if let Some(level) = &cli.log_level {
        config.log.level = level.clone();
    }
    bedrock_chatbot::init_tracing(&config.log);

    let command = match cli.command {
        Commands::Deploy(args) => DeployCommand::Deploy(args),
        Commands::Outputs(args) => DeployCommand::Outputs(args),
    };

    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?
        .block_on(command.run(&config.deploy))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bedrock_chatbot::deploy::ExitDetail;

    #[test]
    fn deploy_errors_print_with_marker_and_exit_one() {
        let err = anyhow::Error::from(DeployError::BuildFailed {
            status: ExitDetail::Code(2),
        });
        assert_eq!(
            failure(&err),
            (1, "❌ sam build failed (exit code 2)".to_string())
        );
    }

    #[test]
    fn config_errors_keep_their_context() {
        let err = anyhow::anyhow!("missing field").context("Failed to load configuration");
        let (code, message) = failure(&err);
        assert_eq!(code, 1);
        assert_eq!(message, "❌ Failed to load configuration: missing field");
    }

    #[test]
    fn cli_parses_deploy_arguments() {
        let cli = Cli::try_parse_from([
            "bedrock-chatbot",
            "deploy",
            "staging",
            "eu-west-1",
            "--variant",
            "api",
        ])
        .unwrap();
        let Commands::Deploy(args) = cli.command else {
            panic!("expected deploy");
        };
        assert_eq!(args.environment.as_deref(), Some("staging"));
        assert_eq!(args.region.as_deref(), Some("eu-west-1"));
        assert_eq!(args.variant, bedrock_chatbot::deploy::Variant::Api);
    }
}
