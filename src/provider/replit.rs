//! Replit eval backend, a plain `{language, code}` interpreter service.

use super::{post_json, Interpreter, InterpreterOutput};
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const NAME: &str = "replit";

/// Interpreter for any backend that takes `{language, code}` and answers
/// `{stdout, stderr, exitCode}`.
pub struct ReplitInterpreter {
    http: reqwest::Client,
    url: String,
}

impl ReplitInterpreter {
    pub fn new(http: reqwest::Client, url: &str) -> Self {
        Self {
            http,
            url: url.to_string(),
        }
    }
}

#[derive(Serialize)]
struct EvalRequest<'a> {
    language: &'a str,
    code: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EvalResponse {
    #[serde(default)]
    stdout: String,
    #[serde(default)]
    stderr: String,
    #[serde(default)]
    exit_code: i32,
}

#[async_trait]
impl Interpreter for ReplitInterpreter {
    fn name(&self) -> &str {
        NAME
    }

    fn language_id(&self, language: &str) -> Option<&'static str> {
        match language {
            "python" => Some("python"),
            "javascript" => Some("javascript"),
            "java" => Some("java"),
            "csharp" => Some("csharp"),
            "cpp" => Some("cpp"),
            "c" => Some("c"),
            "go" => Some("go"),
            "rust" => Some("rust"),
            "ruby" => Some("ruby"),
            "php" => Some("php"),
            _ => None,
        }
    }

    async fn execute(&self, code: &str, language_id: &str) -> Result<InterpreterOutput> {
        let body = EvalRequest {
            language: language_id,
            code,
        };
        debug!(language = language_id, "POST {}", self.url);

        let resp: EvalResponse = post_json(&self.http, &self.url, &body, NAME).await?;
        Ok(InterpreterOutput {
            output: format!("{}{}", resp.stdout, resp.stderr),
            stdout: resp.stdout,
            stderr: resp.stderr,
            exit_code: resp.exit_code,
        })
    }
}
