//! Adapters for the remote execution backends.
//!
//! Two capabilities, each behind its own trait:
//!   - [`Interpreter`]: run code in a remote interpreter service (Piston, Replit, JDoodle)
//!   - [`SandboxHost`]: provision a hosted preview from a file manifest (CodeSandbox)
//!
//! The engine looks adapters up by name in a [`ProviderRegistry`] and never
//! contains backend-specific logic itself.

use crate::config::RunnerConfig;
use crate::error::{Result, RunnerError};
use crate::manifest::Manifest;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

pub mod codesandbox;
pub mod jdoodle;
pub mod piston;
pub mod replit;
pub mod testing;

pub use codesandbox::CodeSandboxHost;
pub use jdoodle::JDoodleInterpreter;
pub use piston::PistonInterpreter;
pub use replit::ReplitInterpreter;

/// Output of one remote interpreter run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterpreterOutput {
    pub stdout: String,
    pub stderr: String,
    /// Combined stdout/stderr as reported by the backend.
    pub output: String,
    pub exit_code: i32,
}

/// Handle to a hosted preview returned by a sandbox host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SandboxHandle {
    pub id: String,
    pub url: String,
    pub embed_url: String,
}

/// A remote service that runs interpreted code.
#[async_trait]
pub trait Interpreter: Send + Sync {
    /// Registry name, also used as the error subsystem.
    fn name(&self) -> &str;

    /// Backend identifier for a logical language name, `None` if unsupported.
    fn language_id(&self, language: &str) -> Option<&'static str>;

    /// One request, one response. No retries.
    async fn execute(&self, code: &str, language_id: &str) -> Result<InterpreterOutput>;
}

/// A remote service that hosts a previewable project.
#[async_trait]
pub trait SandboxHost: Send + Sync {
    fn name(&self) -> &str;

    async fn provision(&self, manifest: &Manifest) -> Result<SandboxHandle>;
}

/// Adapters by name.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    interpreters: HashMap<String, Arc<dyn Interpreter>>,
    sandbox_hosts: HashMap<String, Arc<dyn SandboxHost>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the HTTP-backed adapters described by `config`.
    pub fn from_config(config: &RunnerConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| RunnerError::provider("http-client", e.to_string()))?;

        let mut registry = Self::new()
            .with_interpreter(PistonInterpreter::new(http.clone(), &config.piston_url))
            .with_interpreter(ReplitInterpreter::new(http.clone(), &config.replit_url))
            .with_sandbox_host(CodeSandboxHost::new(http.clone(), &config.codesandbox_url));
        if let Some(credentials) = &config.jdoodle_credentials {
            registry = registry.with_interpreter(JDoodleInterpreter::new(
                http,
                &config.jdoodle_url,
                credentials.clone(),
            ));
        }
        Ok(registry)
    }

    /// Fail unless both adapters selected by `config` are registered.
    pub fn check_selected(&self, config: &RunnerConfig) -> Result<()> {
        self.interpreter(&config.interpreter_provider)?;
        self.sandbox_host(&config.sandbox_provider)?;
        Ok(())
    }

    pub fn with_interpreter(mut self, adapter: impl Interpreter + 'static) -> Self {
        self.register_interpreter(Arc::new(adapter));
        self
    }

    pub fn with_sandbox_host(mut self, adapter: impl SandboxHost + 'static) -> Self {
        self.register_sandbox_host(Arc::new(adapter));
        self
    }

    pub fn register_interpreter(&mut self, adapter: Arc<dyn Interpreter>) {
        self.interpreters.insert(adapter.name().to_string(), adapter);
    }

    pub fn register_sandbox_host(&mut self, adapter: Arc<dyn SandboxHost>) {
        self.sandbox_hosts.insert(adapter.name().to_string(), adapter);
    }

    pub fn interpreter(&self, name: &str) -> Result<Arc<dyn Interpreter>> {
        self.interpreters
            .get(name)
            .cloned()
            .ok_or_else(|| RunnerError::validation(format!("no interpreter registered as {name}")))
    }

    pub fn sandbox_host(&self, name: &str) -> Result<Arc<dyn SandboxHost>> {
        self.sandbox_hosts
            .get(name)
            .cloned()
            .ok_or_else(|| RunnerError::validation(format!("no sandbox host registered as {name}")))
    }

    pub fn interpreter_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.interpreters.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// POST a JSON body and decode the JSON reply. Non-2xx statuses and transport
/// failures become [`RunnerError::Provider`] tagged with `subsystem`.
pub(crate) async fn post_json<B, T>(
    http: &reqwest::Client,
    url: &str,
    body: &B,
    subsystem: &str,
) -> Result<T>
where
    B: Serialize + ?Sized,
    T: DeserializeOwned,
{
    let resp = http
        .post(url)
        .json(body)
        .send()
        .await
        .map_err(|e| RunnerError::provider(subsystem, format!("request failed: {e}")))?;

    let status = resp.status();
    if !status.is_success() {
        let body_text = resp.text().await.unwrap_or_default();
        return Err(RunnerError::provider(
            subsystem,
            format!("HTTP {status}: {body_text}"),
        ));
    }

    resp.json::<T>()
        .await
        .map_err(|e| RunnerError::provider(subsystem, format!("invalid response: {e}")))
}

#[cfg(test)]
mod tests {
    use super::testing::{EchoInterpreter, StaticSandboxHost};
    use super::*;

    #[test]
    fn test_registry_lookup() {
        let registry = ProviderRegistry::new()
            .with_interpreter(EchoInterpreter::new())
            .with_sandbox_host(StaticSandboxHost::new());

        assert_eq!(registry.interpreter("echo").unwrap().name(), "echo");
        assert_eq!(registry.sandbox_host("static").unwrap().name(), "static");
        assert!(matches!(
            registry.interpreter("piston"),
            Err(RunnerError::Validation(_))
        ));
        assert!(registry.sandbox_host("vercel").is_err());
    }

    #[test]
    fn test_from_config_registers_jdoodle_only_with_credentials() {
        let registry = ProviderRegistry::from_config(&RunnerConfig::default()).unwrap();
        assert_eq!(registry.interpreter_names(), vec!["piston", "replit"]);
        assert!(registry.sandbox_host("codesandbox").is_ok());

        let config = RunnerConfig::builder()
            .jdoodle_credentials("id", "secret")
            .build();
        let registry = ProviderRegistry::from_config(&config).unwrap();
        assert_eq!(registry.interpreter_names(), vec!["jdoodle", "piston", "replit"]);
    }

    #[test]
    fn test_check_selected_rejects_unregistered_names() {
        let registry = ProviderRegistry::from_config(&RunnerConfig::default()).unwrap();
        assert!(registry.check_selected(&RunnerConfig::default()).is_ok());

        let replit = RunnerConfig::builder().interpreter_provider("replit").build();
        assert!(registry.check_selected(&replit).is_ok());

        let jdoodle = RunnerConfig::builder().interpreter_provider("jdoodle").build();
        let err = registry.check_selected(&jdoodle).unwrap_err();
        assert!(err.to_string().contains("jdoodle"), "{err}");

        let vercel = RunnerConfig::builder().sandbox_provider("vercel").build();
        assert!(registry.check_selected(&vercel).is_err());
    }
}
