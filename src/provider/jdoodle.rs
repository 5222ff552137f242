//! JDoodle compiler API.

use super::{post_json, Interpreter, InterpreterOutput};
use crate::config::JDoodleCredentials;
use crate::error::{Result, RunnerError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const NAME: &str = "jdoodle";

/// Interpreter backed by the JDoodle `/execute` endpoint. Needs API credentials.
pub struct JDoodleInterpreter {
    http: reqwest::Client,
    url: String,
    credentials: JDoodleCredentials,
}

impl JDoodleInterpreter {
    pub fn new(http: reqwest::Client, url: &str, credentials: JDoodleCredentials) -> Self {
        Self {
            http,
            url: url.to_string(),
            credentials,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExecuteRequest<'a> {
    script: &'a str,
    language: &'a str,
    version_index: &'a str,
    client_id: &'a str,
    client_secret: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExecuteResponse {
    #[serde(default)]
    output: String,
    #[serde(default = "default_status")]
    status_code: u16,
    error: Option<String>,
}

fn default_status() -> u16 {
    200
}

#[async_trait]
impl Interpreter for JDoodleInterpreter {
    fn name(&self) -> &str {
        NAME
    }

    fn language_id(&self, language: &str) -> Option<&'static str> {
        match language {
            "python" => Some("python3"),
            "javascript" => Some("nodejs"),
            "cpp" => Some("cpp17"),
            "java" => Some("java"),
            "csharp" => Some("csharp"),
            "c" => Some("c"),
            "go" => Some("go"),
            "rust" => Some("rust"),
            "ruby" => Some("ruby"),
            "php" => Some("php"),
            _ => None,
        }
    }

    async fn execute(&self, code: &str, language_id: &str) -> Result<InterpreterOutput> {
        let body = ExecuteRequest {
            script: code,
            language: language_id,
            version_index: "0",
            client_id: &self.credentials.client_id,
            client_secret: &self.credentials.client_secret,
        };
        debug!(language = language_id, "POST {}", self.url);

        let resp: ExecuteResponse = post_json(&self.http, &self.url, &body, NAME).await?;
        if let Some(error) = resp.error {
            return Err(RunnerError::provider(NAME, error));
        }

        // JDoodle reports a single merged stream and no process exit code.
        Ok(InterpreterOutput {
            stdout: resp.output.clone(),
            stderr: String::new(),
            output: resp.output,
            exit_code: if resp.status_code == 200 { 0 } else { 1 },
        })
    }
}
