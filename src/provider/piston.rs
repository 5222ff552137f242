//! Piston code execution API.

use super::{post_json, Interpreter, InterpreterOutput};
use crate::error::Result;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

pub const NAME: &str = "piston";

/// Interpreter backed by a Piston `/execute` endpoint.
pub struct PistonInterpreter {
    http: reqwest::Client,
    url: String,
}

impl PistonInterpreter {
    pub fn new(http: reqwest::Client, url: &str) -> Self {
        Self {
            http,
            url: url.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ExecuteResponse {
    run: RunStage,
}

#[derive(Debug, Deserialize)]
struct RunStage {
    #[serde(default)]
    stdout: String,
    #[serde(default)]
    stderr: String,
    #[serde(default)]
    output: String,
    /// Null when the process was killed by a signal.
    code: Option<i32>,
}

#[async_trait]
impl Interpreter for PistonInterpreter {
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
        let body = json!({
            "language": language_id,
            "version": "*",
            "files": [{ "content": code }],
            "stdin": "",
            "args": [],
        });
        debug!(language = language_id, "POST {}", self.url);

        let resp: ExecuteResponse = post_json(&self.http, &self.url, &body, NAME).await?;
        Ok(InterpreterOutput {
            stdout: resp.run.stdout,
            stderr: resp.run.stderr,
            output: resp.run.output,
            exit_code: resp.run.code.unwrap_or(-1),
        })
    }
}
