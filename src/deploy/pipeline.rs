//! The deployment pipeline
//!
//! Steps run strictly in order and every external command is checked as
//! soon as it returns; the first failure ends the run. Nothing is rolled
//! back here, CloudFormation owns rollback of a failed stack update.

use chatbot_config::DeployConfig;
use std::future::Future;
use std::io;
use tracing::{info, warn};

use super::aws;
use super::error::{DeployError, ExitDetail};
use super::params::{parse_account_id, DeploymentParameters};
use super::report::{Report, StackOutputs};
use super::runner::{CommandOutput, CommandRunner, Invocation};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Preflight,
    Build,
    EnsureBucket,
    Deploy,
    Report,
}

impl Step {
    pub const SEQUENCE: [Step; 5] = [
        Step::Preflight,
        Step::Build,
        Step::EnsureBucket,
        Step::Deploy,
        Step::Report,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Step::Preflight => "Checking prerequisites",
            Step::Build => "Building application",
            Step::EnsureBucket => "Preparing deployment bucket",
            Step::Deploy => "Deploying stack",
            Step::Report => "Collecting stack outputs",
        }
    }

    fn marker(&self) -> &'static str {
        match self {
            Step::Preflight => "🔍",
            Step::Build => "🔨",
            Step::EnsureBucket => "🪣",
            Step::Deploy => "🚀",
            Step::Report => "📊",
        }
    }
}

/// What a successful run produced
#[derive(Debug, Clone)]
pub struct DeploymentSummary {
    pub params: DeploymentParameters,
    pub account_id: String,
    pub bucket: String,
    /// False when the bucket already existed
    pub bucket_created: bool,
    /// Empty when the outputs query failed
    pub outputs: StackOutputs,
}

/// Result of EnsureBucket
#[derive(Debug)]
struct PreparedBucket {
    account_id: String,
    name: String,
    created: bool,
}

pub struct Pipeline<'a> {
    runner: &'a dyn CommandRunner,
    config: &'a DeployConfig,
    params: DeploymentParameters,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        runner: &'a dyn CommandRunner,
        config: &'a DeployConfig,
        params: DeploymentParameters,
    ) -> Self {
        Self {
            runner,
            config,
            params,
        }
    }

    pub fn params(&self) -> &DeploymentParameters {
        &self.params
    }

    /// Steps this variant runs, in order
    pub fn steps(&self) -> Vec<Step> {
        Step::SEQUENCE
            .into_iter()
            .filter(|step| *step != Step::Preflight || self.params.variant.runs_preflight())
            .collect()
    }

    pub async fn run(&self) -> Result<DeploymentSummary, DeployError> {
        info!(
            variant = %self.params.variant,
            environment = %self.params.environment,
            region = %self.params.region,
            stack = %self.params.stack_name,
            "Starting deployment"
        );
        println!(
            "🚀 Deploying {} to {} ({})",
            self.params.stack_name, self.params.region, self.params.environment
        );

        let account_id = if self.params.variant.runs_preflight() {
            Some(self.step(Step::Preflight, self.preflight()).await?)
        } else {
            None
        };
        self.step(Step::Build, self.build()).await?;
        let bucket = self
            .step(Step::EnsureBucket, self.ensure_bucket(account_id))
            .await?;
        self.step(Step::Deploy, self.deploy(&bucket.name)).await?;

        announce(Step::Report);
        let outputs = self.report(&bucket.name).await;

        println!();
        println!("🎉 Deployment of {} complete", self.params.stack_name);
        Ok(DeploymentSummary {
            params: self.params.clone(),
            account_id: bucket.account_id,
            bucket: bucket.name,
            bucket_created: bucket.created,
            outputs,
        })
    }

    /// Only the Report step, against an already deployed stack
    pub async fn report_only(&self) -> Result<StackOutputs, DeployError> {
        let outputs = self.query_outputs().await?;
        println!("{}", self.render(None, &outputs));
        Ok(outputs)
    }

    async fn step<T, F>(&self, step: Step, work: F) -> Result<T, DeployError>
    where
        F: Future<Output = Result<T, DeployError>>,
    {
        announce(step);
        let result = work.await;
        if let Err(err) = &result {
            warn!(step = ?step, kind = err.kind(), "Deployment step failed");
        }
        result
    }

    /// Returns the account id the credentials resolve to
    async fn preflight(&self) -> Result<String, DeployError> {
        for tool in [aws::SAM, aws::AWS] {
            let output = self.capture(&aws::version(tool)).await?;
            if !output.success {
                return Err(DeployError::tool_missing(tool));
            }
            let version = output.stdout.lines().next().unwrap_or_default().trim();
            println!("  ✅ {} found {}", tool, version);
        }

        let account_id = self.resolve_account().await?;
        println!("  ✅ AWS credentials (account {})", account_id);

        let probe = self.capture(&aws::bedrock_probe(&self.params.region)).await?;
        if !probe.success {
            return Err(DeployError::PermissionDenied {
                service: "bedrock",
                region: self.params.region.clone(),
                reason: probe.failure_reason(),
            });
        }
        println!("  ✅ Bedrock reachable in {}", self.params.region);
        Ok(account_id)
    }

    async fn build(&self) -> Result<(), DeployError> {
        let output = self.stream(&aws::sam_build(&self.params, self.config)).await?;
        if !output.success {
            return Err(DeployError::BuildFailed {
                status: ExitDetail::from_code(output.code),
            });
        }
        println!("  ✅ Build succeeded");
        Ok(())
    }

    /// `account_id` is already known when preflight ran
    async fn ensure_bucket(
        &self,
        account_id: Option<String>,
    ) -> Result<PreparedBucket, DeployError> {
        let account_id = match account_id {
            Some(account_id) => account_id,
            None => self.resolve_account().await?,
        };
        let bucket = self
            .params
            .deployment_bucket(&self.config.bucket_prefix, &account_id)?;

        let head = self
            .capture(&aws::head_bucket(&bucket, &self.params.region))
            .await?;
        let created = if head.success {
            info!(bucket = %bucket, "Deployment bucket exists");
            println!("  ✅ Using existing bucket {}", bucket);
            false
        } else {
            info!(bucket = %bucket, "Creating deployment bucket");
            let created = self
                .capture(&aws::make_bucket(&bucket, &self.params.region))
                .await?;
            if !created.success {
                return Err(DeployError::BucketCreateFailed {
                    bucket,
                    reason: created.failure_reason(),
                });
            }
            println!("  ✅ Created bucket {}", bucket);
            true
        };

        Ok(PreparedBucket {
            account_id,
            name: bucket,
            created,
        })
    }

    async fn deploy(&self, bucket: &str) -> Result<(), DeployError> {
        let output = self
            .stream(&aws::sam_deploy(&self.params, bucket, self.config))
            .await?;
        if !output.success {
            return Err(DeployError::DeployFailed {
                stack: self.params.stack_name.clone(),
                status: ExitDetail::from_code(output.code),
            });
        }
        println!("  ✅ Stack {} deployed", self.params.stack_name);
        Ok(())
    }

    /// Never fails the run: the stack is already deployed at this point
    async fn report(&self, bucket: &str) -> StackOutputs {
        let outputs = match self.query_outputs().await {
            Ok(outputs) => outputs,
            Err(err) => {
                warn!(error = %err, "Could not query stack outputs");
                println!("  ⚠️  Could not query stack outputs: {}", err);
                StackOutputs::default()
            }
        };
        println!();
        println!("{}", self.render(Some(bucket), &outputs));
        outputs
    }

    async fn query_outputs(&self) -> Result<StackOutputs, DeployError> {
        let output = self
            .capture(&aws::describe_stack_outputs(
                &self.params.stack_name,
                &self.params.region,
            ))
            .await?;
        if !output.success {
            return Err(DeployError::OutputsUnavailable {
                stack: self.params.stack_name.clone(),
                reason: output.failure_reason(),
            });
        }
        StackOutputs::parse(&output.stdout).map_err(|e| DeployError::OutputsUnavailable {
            stack: self.params.stack_name.clone(),
            reason: format!("unreadable describe-stacks output: {}", e),
        })
    }

    fn render(&self, bucket: Option<&str>, outputs: &StackOutputs) -> String {
        Report {
            params: &self.params,
            bucket,
            outputs,
            endpoint_key: &self.config.endpoint_output_key,
        }
        .to_string()
    }

    async fn resolve_account(&self) -> Result<String, DeployError> {
        let output = self.capture(&aws::caller_identity()).await?;
        if !output.success {
            return Err(DeployError::CredentialsUnavailable {
                reason: output.failure_reason(),
            });
        }
        parse_account_id(&output.stdout)
    }

    async fn capture(&self, invocation: &Invocation) -> Result<CommandOutput, DeployError> {
        self.runner
            .capture(invocation)
            .await
            .map_err(|e| spawn_error(invocation, e))
    }

    async fn stream(&self, invocation: &Invocation) -> Result<CommandOutput, DeployError> {
        self.runner
            .stream(invocation)
            .await
            .map_err(|e| spawn_error(invocation, e))
    }
}

fn announce(step: Step) {
    println!();
    println!("{} {}...", step.marker(), step.label());
    info!(step = ?step, "Running step");
}

fn spawn_error(invocation: &Invocation, err: io::Error) -> DeployError {
    if err.kind() == io::ErrorKind::NotFound {
        DeployError::tool_missing(&invocation.program)
    } else {
        DeployError::Spawn {
            program: invocation.program.clone(),
            source: err,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_order() {
        assert_eq!(
            Step::SEQUENCE,
            [
                Step::Preflight,
                Step::Build,
                Step::EnsureBucket,
                Step::Deploy,
                Step::Report
            ]
        );
    }

    #[test]
    fn not_found_maps_to_missing_tool() {
        let inv = aws::version(aws::SAM);
        let err = spawn_error(&inv, io::Error::from(io::ErrorKind::NotFound));
        assert!(matches!(err, DeployError::ToolMissing { ref tool, .. } if tool == "sam"));

        let err = spawn_error(&inv, io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(matches!(err, DeployError::Spawn { .. }));
    }
}
