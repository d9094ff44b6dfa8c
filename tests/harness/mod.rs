//! Scripted command runner for pipeline tests
//!
//! Records every invocation and answers from a list of rules keyed by
//! program and leading arguments. Unmatched commands succeed with empty
//! output, except the account lookup and the outputs query, which return
//! canned data.

#![allow(dead_code)]

use async_trait::async_trait;
use bedrock_chatbot::deploy::{CommandOutput, CommandRunner, Invocation};
use std::io;
use std::sync::Mutex;

pub const ACCOUNT_ID: &str = "123456789012";

pub const OUTPUTS_JSON: &str = r#"[
    {"OutputKey": "ChatbotApiUrl", "OutputValue": "https://abc123.execute-api.ap-northeast-2.amazonaws.com/dev/chat"},
    {"OutputKey": "ChatbotFunctionName", "OutputValue": "bedrock-chatbot-fn"}
]"#;

#[derive(Debug, Clone)]
enum Response {
    Output(CommandOutput),
    /// Behave as if the program is not on PATH
    Missing,
}

#[derive(Debug, Clone)]
struct Rule {
    program: String,
    prefix: Vec<String>,
    response: Response,
}

#[derive(Debug, Default)]
pub struct ScriptedRunner {
    rules: Vec<Rule>,
    calls: Mutex<Vec<Invocation>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer commands starting with `program prefix...` with `output`
    pub fn on(mut self, program: &str, prefix: &[&str], output: CommandOutput) -> Self {
        self.rules.push(Rule {
            program: program.to_string(),
            prefix: prefix.iter().map(|s| s.to_string()).collect(),
            response: Response::Output(output),
        });
        self
    }

    /// Fail every command that starts `program` with NotFound
    pub fn missing(mut self, program: &str) -> Self {
        self.rules.push(Rule {
            program: program.to_string(),
            prefix: Vec::new(),
            response: Response::Missing,
        });
        self
    }

    pub fn fail(self, program: &str, prefix: &[&str], code: i32, stderr: &str) -> Self {
        self.on(program, prefix, CommandOutput::failed(code, stderr))
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }

    /// Index of the first recorded call matching `program prefix...`
    pub fn position(&self, program: &str, prefix: &[&str]) -> Option<usize> {
        self.calls()
            .iter()
            .position(|inv| inv.has_prefix(program, prefix))
    }

    pub fn called(&self, program: &str, prefix: &[&str]) -> bool {
        self.position(program, prefix).is_some()
    }

    pub fn find(&self, program: &str, prefix: &[&str]) -> Option<Invocation> {
        self.calls()
            .into_iter()
            .find(|inv| inv.has_prefix(program, prefix))
    }

    fn respond(&self, invocation: &Invocation) -> io::Result<CommandOutput> {
        self.calls.lock().unwrap().push(invocation.clone());

        let rule = self.rules.iter().find(|rule| {
            let prefix: Vec<&str> = rule.prefix.iter().map(String::as_str).collect();
            invocation.has_prefix(&rule.program, &prefix)
        });

        match rule.map(|r| &r.response) {
            Some(Response::Output(output)) => Ok(output.clone()),
            Some(Response::Missing) => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{}: command not found", invocation.program),
            )),
            None => Ok(default_response(invocation)),
        }
    }
}

fn default_response(invocation: &Invocation) -> CommandOutput {
    if invocation.has_prefix("aws", &["sts", "get-caller-identity"]) {
        CommandOutput::ok(format!("{}\n", ACCOUNT_ID))
    } else if invocation.has_prefix("aws", &["cloudformation", "describe-stacks"]) {
        CommandOutput::ok(OUTPUTS_JSON)
    } else {
        CommandOutput::ok("")
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn capture(&self, invocation: &Invocation) -> io::Result<CommandOutput> {
        self.respond(invocation)
    }

    async fn stream(&self, invocation: &Invocation) -> io::Result<CommandOutput> {
        self.respond(invocation).map(|output| CommandOutput {
            stdout: String::new(),
            stderr: String::new(),
            ..output
        })
    }
}
