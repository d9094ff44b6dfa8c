//! Post-deploy report: stack outputs, example requests, console links

use serde::Deserialize;
use std::fmt;

use super::params::DeploymentParameters;

/// Output keys the chatbot template exports besides the endpoint
pub const FUNCTION_NAME_OUTPUT: &str = "ChatbotFunctionName";
pub const TABLE_NAME_OUTPUT: &str = "ConversationTableName";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StackOutput {
    pub output_key: String,
    pub output_value: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub export_name: Option<String>,
}

/// Outputs of a deployed stack, in CloudFormation order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StackOutputs(Vec<StackOutput>);

impl StackOutputs {
    /// Parse `describe-stacks --query Stacks[0].Outputs --output json`
    pub fn parse(json: &str) -> Result<Self, serde_json::Error> {
        let outputs: Option<Vec<StackOutput>> = serde_json::from_str(json.trim())?;
        Ok(Self(outputs.unwrap_or_default()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StackOutput> {
        self.0.iter()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|o| o.output_key == key)
            .map(|o| o.output_value.as_str())
    }

    /// The API endpoint: `preferred_key` if exported, else the first https URL
    pub fn endpoint(&self, preferred_key: &str) -> Option<&str> {
        self.get(preferred_key).or_else(|| {
            self.0
                .iter()
                .map(|o| o.output_value.as_str())
                .find(|v| v.starts_with("https://"))
        })
    }
}

impl From<Vec<StackOutput>> for StackOutputs {
    fn from(outputs: Vec<StackOutput>) -> Self {
        Self(outputs)
    }
}

/// Everything the final report needs
#[derive(Debug, Clone)]
pub struct Report<'a> {
    pub params: &'a DeploymentParameters,
    /// Unknown when only querying an existing stack
    pub bucket: Option<&'a str>,
    pub outputs: &'a StackOutputs,
    pub endpoint_key: &'a str,
}

impl Report<'_> {
    fn function_name(&self) -> String {
        self.outputs
            .get(FUNCTION_NAME_OUTPUT)
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}-chatbot", self.params.stack_name))
    }

    fn table_name(&self) -> String {
        self.outputs
            .get(TABLE_NAME_OUTPUT)
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}-conversations", self.params.stack_name))
    }
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params = self.params;

        writeln!(f, "📋 Deployment information")?;
        writeln!(f, "  Stack:       {}", params.stack_name)?;
        writeln!(f, "  Environment: {}", params.environment)?;
        writeln!(f, "  Region:      {}", params.region)?;
        if let Some(bucket) = self.bucket {
            writeln!(f, "  Bucket:      {}", bucket)?;
        }
        writeln!(f)?;

        if self.outputs.is_empty() {
            writeln!(f, "⚠️  No stack outputs available")?;
        } else {
            writeln!(f, "📤 Stack outputs")?;
            for output in self.outputs.iter() {
                writeln!(f, "  {}: {}", output.output_key, output.output_value)?;
            }
        }
        writeln!(f)?;

        match self.outputs.endpoint(self.endpoint_key) {
            Some(endpoint) => {
                writeln!(f, "🧪 Try it")?;
                for (title, command) in curl_examples(endpoint, &params.environment) {
                    writeln!(f, "  # {}", title)?;
                    writeln!(f, "  {}", command)?;
                }
            }
            None => writeln!(
                f,
                "⚠️  No API endpoint found (expected output '{}')",
                self.endpoint_key
            )?,
        }
        writeln!(f)?;

        writeln!(f, "🔗 Console")?;
        let links = console_links(
            &params.region,
            &self.function_name(),
            &self.table_name(),
            &params.stack_name,
        );
        for (title, url) in links {
            writeln!(f, "  {}: {}", title, url)?;
        }
        Ok(())
    }
}

/// Health check, single request and session request against `endpoint`
pub fn curl_examples(endpoint: &str, environment: &str) -> Vec<(&'static str, String)> {
    vec![
        (
            "Health check (CORS preflight)",
            format!("curl -i -X OPTIONS {}", endpoint),
        ),
        (
            "Basic request",
            format!(
                r#"curl -X POST {} -H "Content-Type: application/json" -d '{{"message": "Hello! Which model are you?"}}'"#,
                endpoint
            ),
        ),
        (
            "Request with conversation history",
            format!(
                r#"curl -X POST {} -H "Content-Type: application/json" -d '{{"message": "What did I just ask?", "session_id": "{}-test-session"}}'"#,
                endpoint, environment
            ),
        ),
    ]
}

pub fn console_links(
    region: &str,
    function_name: &str,
    table_name: &str,
    stack_name: &str,
) -> Vec<(&'static str, String)> {
    let base = format!("https://{region}.console.aws.amazon.com");
    vec![
        (
            "CloudWatch logs",
            format!(
                "{base}/cloudwatch/home?region={region}#logsV2:log-groups/log-group/$252Faws$252Flambda$252F{function_name}"
            ),
        ),
        (
            "Lambda function",
            format!("{base}/lambda/home?region={region}#/functions/{function_name}"),
        ),
        (
            "DynamoDB table",
            format!("{base}/dynamodbv2/home?region={region}#table?name={table_name}"),
        ),
        (
            "Bedrock model access",
            format!("{base}/bedrock/home?region={region}#/modelaccess"),
        ),
        (
            "CloudFormation stack",
            format!("{base}/cloudformation/home?region={region}#/stacks?filteringText={stack_name}"),
        ),
    ]
}
