//! Deterministic in-process adapters for tests and local development.

use super::{Interpreter, InterpreterOutput, SandboxHandle, SandboxHost};
use crate::error::{Result, RunnerError};
use crate::manifest::Manifest;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;

/// Interpreter that answers from a fixed table and echoes anything else.
///
/// Registered as `"echo"`. Accepts the same logical languages as Piston.
#[derive(Default)]
pub struct EchoInterpreter {
    responses: HashMap<String, String>,
    failure: Option<String>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl EchoInterpreter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reply to `code` with `stdout` instead of echoing it.
    pub fn with_response(mut self, code: impl Into<String>, stdout: impl Into<String>) -> Self {
        self.responses.insert(code.into(), stdout.into());
        self
    }

    /// Fail every call with a provider error carrying `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::default()
        }
    }

    /// Sleep before answering, to simulate a slow backend.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of `execute` calls received.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Interpreter for EchoInterpreter {
    fn name(&self) -> &str {
        "echo"
    }

    fn language_id(&self, language: &str) -> Option<&'static str> {
        match language {
            "python" => Some("python"),
            "javascript" => Some("javascript"),
            "rust" => Some("rust"),
            "go" => Some("go"),
            "c" => Some("c"),
            "cpp" => Some("cpp"),
            "java" => Some("java"),
            _ => None,
        }
    }

    async fn execute(&self, code: &str, _language_id: &str) -> Result<InterpreterOutput> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(message) = &self.failure {
            return Err(RunnerError::provider("echo", message.clone()));
        }

        let stdout = self
            .responses
            .get(code)
            .cloned()
            .unwrap_or_else(|| format!("{code}\n"));
        Ok(InterpreterOutput {
            output: stdout.clone(),
            stdout,
            stderr: String::new(),
            exit_code: 0,
        })
    }
}

/// Sandbox host that hands out sequential ids and remembers the last manifest.
///
/// Registered as `"static"`.
#[derive(Default)]
pub struct StaticSandboxHost {
    failure: Option<String>,
    provisioned: AtomicUsize,
    last_manifest: Mutex<Option<Manifest>>,
}

impl StaticSandboxHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn provisioned(&self) -> usize {
        self.provisioned.load(Ordering::SeqCst)
    }

    pub async fn last_manifest(&self) -> Option<Manifest> {
        self.last_manifest.lock().await.clone()
    }
}

#[async_trait]
impl SandboxHost for StaticSandboxHost {
    fn name(&self) -> &str {
        "static"
    }

    async fn provision(&self, manifest: &Manifest) -> Result<SandboxHandle> {
        if let Some(message) = &self.failure {
            return Err(RunnerError::provider("static", message.clone()));
        }
        let n = self.provisioned.fetch_add(1, Ordering::SeqCst) + 1;
        *self.last_manifest.lock().await = Some(manifest.clone());

        let id = format!("sbx{n}");
        Ok(SandboxHandle {
            url: format!("https://{id}.preview.test"),
            embed_url: format!("https://preview.test/embed/{id}"),
            id,
        })
    }
}
