//! SAM deployment orchestration
//!
//! `deploy` runs Preflight → Build → EnsureBucket → Deploy → Report against
//! the AWS and SAM command-line tools; `outputs` runs only the Report step.

mod aws;
mod error;
mod params;
mod pipeline;
mod report;
mod runner;

pub use error::{DeployError, ExitDetail};
pub use params::{bucket_name, parse_account_id, stack_name, DeploymentParameters, Variant};
pub use pipeline::{DeploymentSummary, Pipeline, Step};
pub use report::{curl_examples, console_links, Report, StackOutput, StackOutputs};
pub use runner::{CommandOutput, CommandRunner, Invocation, ProcessRunner};

use chatbot_config::DeployConfig;
use clap::Args;

/// Positional arguments shared by `deploy` and `outputs`
#[derive(Args, Debug, Clone, Default)]
pub struct DeployArgs {
    /// Environment name (dev, staging, prod, ...)
    #[arg(value_name = "ENVIRONMENT")]
    pub environment: Option<String>,

    /// Target region (ignored by the bedrock variant, which has a fixed region)
    #[arg(value_name = "REGION")]
    pub region: Option<String>,

    /// Stack flavour to deploy
    #[arg(long, value_enum, default_value_t)]
    pub variant: Variant,
}

impl DeployArgs {
    pub fn parameters(&self, config: &DeployConfig) -> Result<DeploymentParameters, DeployError> {
        DeploymentParameters::resolve(
            self.variant,
            self.environment.as_deref(),
            self.region.as_deref(),
            config,
        )
    }
}

#[derive(Debug, Clone)]
pub enum DeployCommand {
    /// Full pipeline
    Deploy(DeployArgs),
    /// Report step only
    Outputs(DeployArgs),
}

impl DeployCommand {
    pub async fn run(&self, config: &DeployConfig) -> Result<(), DeployError> {
        self.run_with(&ProcessRunner, config).await
    }

    pub async fn run_with(
        &self,
        runner: &dyn CommandRunner,
        config: &DeployConfig,
    ) -> Result<(), DeployError> {
        match self {
            DeployCommand::Deploy(args) => {
                let pipeline = Pipeline::new(runner, config, args.parameters(config)?);
                pipeline.run().await.map(|_| ())
            }
            DeployCommand::Outputs(args) => {
                let pipeline = Pipeline::new(runner, config, args.parameters(config)?);
                pipeline.report_only().await.map(|_| ())
            }
        }
    }
}
