//! Execution facade over the session store and provider adapters.
//!
//! Each operation reads the session under a short lock, calls the provider with
//! no lock held, then re-locks only to record the outcome. A session deleted
//! while the call was in flight simply does not receive the record.

use crate::config::RunnerConfig;
use crate::error::{Result, RunnerError};
use crate::manifest::Manifest;
use crate::provider::ProviderRegistry;
use crate::session::{truncate_code, ExecutionRecord, Session, SessionKind, SessionSummary};
use crate::store::SessionStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Normalized result of an interpreted run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub stdout: String,
    pub stderr: String,
    pub output: String,
    pub exit_code: i32,
    pub language: String,
    pub executed_at: DateTime<Utc>,
}

/// Where a provisioned preview can be reached, and until when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewDescriptor {
    pub preview_url: String,
    pub embed_url: String,
    pub sandbox_id: String,
    pub kind: SessionKind,
    pub expires_at: DateTime<Utc>,
}

pub struct ExecutionEngine {
    store: SessionStore,
    providers: ProviderRegistry,
    interpreter: String,
    sandbox_host: String,
    code_cap: usize,
}

impl ExecutionEngine {
    pub fn new(store: SessionStore, providers: ProviderRegistry, config: &RunnerConfig) -> Self {
        Self {
            store,
            providers,
            interpreter: config.interpreter_provider.clone(),
            sandbox_host: config.sandbox_provider.clone(),
            code_cap: config.code_cap,
        }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub async fn create_session(
        &self,
        lab_id: &str,
        user_id: &str,
        kind: SessionKind,
    ) -> Result<String> {
        if lab_id.trim().is_empty() {
            return Err(RunnerError::validation("lab_id is required"));
        }
        if user_id.trim().is_empty() {
            return Err(RunnerError::validation("user_id is required"));
        }
        Ok(self.store.create(lab_id, user_id, kind).await)
    }

    pub async fn session(&self, session_id: &str) -> Result<SessionSummary> {
        Ok(self.live_session(session_id).await?.summary())
    }

    /// Live sessions of `user_id`, oldest first.
    pub async fn user_sessions(&self, user_id: &str) -> Vec<SessionSummary> {
        self.store
            .list_by_user(user_id)
            .await
            .iter()
            .map(Session::summary)
            .collect()
    }

    /// Idempotent; stopping a session that is already gone is not an error.
    pub async fn stop_session(&self, session_id: &str) {
        if !self.store.delete(session_id).await {
            debug!(session_id, "Stop requested for absent session");
        }
    }

    pub async fn execute_interpreted(
        &self,
        session_id: &str,
        code: &str,
        language: &str,
    ) -> Result<ExecutionResult> {
        self.live_session(session_id).await?;
        if code.trim().is_empty() {
            return Err(RunnerError::validation("code is required"));
        }
        let interpreter = self.providers.interpreter(&self.interpreter)?;
        let language_id = interpreter.language_id(language).ok_or_else(|| {
            RunnerError::validation(format!(
                "unsupported language for {}: {language}",
                interpreter.name()
            ))
        })?;

        info!(session_id, provider = interpreter.name(), language, "Dispatching code");
        let output = interpreter
            .execute(code, language_id)
            .await
            .inspect_err(|e| warn!(session_id, error = %e, "Interpreter call failed"))?;
        let executed_at = Utc::now();

        let record = ExecutionRecord {
            timestamp: executed_at,
            language: language.to_string(),
            truncated_code: truncate_code(code, self.code_cap),
            result: output.clone(),
        };
        if !self.store.update(session_id, |s| s.executions.push(record)).await {
            debug!(session_id, "Session ended during execution; result not recorded");
        }

        Ok(ExecutionResult {
            stdout: output.stdout,
            stderr: output.stderr,
            output: output.output,
            exit_code: output.exit_code,
            language: language.to_string(),
            executed_at,
        })
    }

    pub async fn execute_sandboxed(
        &self,
        session_id: &str,
        code: &str,
        kind: SessionKind,
    ) -> Result<PreviewDescriptor> {
        let session = self.live_session(session_id).await?;
        let manifest = Manifest::for_kind(kind, code, None)?;
        self.provision(&session, kind, &manifest).await
    }

    /// Web preview with a separate server entry script.
    pub async fn deploy_web(
        &self,
        session_id: &str,
        frontend: &str,
        server_code: Option<&str>,
    ) -> Result<PreviewDescriptor> {
        let session = self.live_session(session_id).await?;
        let manifest = Manifest::web(frontend, server_code)?;
        self.provision(&session, SessionKind::SandboxedWeb, &manifest)
            .await
    }

    async fn provision(
        &self,
        session: &Session,
        kind: SessionKind,
        manifest: &Manifest,
    ) -> Result<PreviewDescriptor> {
        let host = self.providers.sandbox_host(&self.sandbox_host)?;
        info!(session_id = %session.id, provider = host.name(), kind = %kind, "Provisioning sandbox");

        let handle = host
            .provision(manifest)
            .await
            .inspect_err(|e| warn!(session_id = %session.id, error = %e, "Sandbox provisioning failed"))?;

        let descriptor = PreviewDescriptor {
            preview_url: handle.url.clone(),
            embed_url: handle.embed_url.clone(),
            sandbox_id: handle.id.clone(),
            kind,
            expires_at: session.end_time,
        };
        if !self.store.update(&session.id, |s| s.sandbox = Some(handle)).await {
            debug!(session_id = %session.id, "Session ended during provisioning; handle not recorded");
        }
        Ok(descriptor)
    }

    async fn live_session(&self, session_id: &str) -> Result<Session> {
        self.store
            .get(session_id)
            .await
            .ok_or_else(|| RunnerError::SessionExpiredOrNotFound(session_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::testing::{EchoInterpreter, StaticSandboxHost};
    use std::sync::Arc;
    use std::time::Duration;

    const TTL: Duration = Duration::from_secs(14 * 60);

    fn engine_with(interpreter: EchoInterpreter, host: StaticSandboxHost) -> ExecutionEngine {
        let config = RunnerConfig::builder()
            .session_ttl(TTL)
            .interpreter_provider("echo")
            .sandbox_provider("static")
            .build();
        let providers = ProviderRegistry::new()
            .with_interpreter(interpreter)
            .with_sandbox_host(host);
        ExecutionEngine::new(SessionStore::new(TTL), providers, &config)
    }

    fn engine() -> ExecutionEngine {
        engine_with(
            EchoInterpreter::new().with_response("print(1+1)", "2\n"),
            StaticSandboxHost::new(),
        )
    }

    #[tokio::test]
    async fn test_execute_interpreted_records_execution() {
        let engine = engine();
        let id = engine
            .create_session("lab", "alice", SessionKind::Interpreted)
            .await
            .unwrap();

        let result = engine
            .execute_interpreted(&id, "print(1+1)", "python")
            .await
            .unwrap();
        assert!(result.stdout.contains('2'));
        assert_eq!(result.exit_code, 0);
        assert_eq!(result.language, "python");

        let session = engine.store().get(&id).await.unwrap();
        assert_eq!(session.executions.len(), 1);
        assert_eq!(session.executions[0].truncated_code, "print(1+1)");
        assert_eq!(session.executions[0].result.stdout, "2\n");
        assert_eq!(engine.session(&id).await.unwrap().execution_count, 1);
    }

    #[tokio::test]
    async fn test_stored_code_is_truncated_but_result_is_not() {
        let engine = engine();
        let id = engine
            .create_session("lab", "alice", SessionKind::Interpreted)
            .await
            .unwrap();

        let code = format!("print('{}')", "x".repeat(3000));
        let result = engine.execute_interpreted(&id, &code, "python").await.unwrap();
        assert_eq!(result.stdout, format!("{code}\n"));

        let session = engine.store().get(&id).await.unwrap();
        let stored = &session.executions[0].truncated_code;
        assert_eq!(stored.chars().count(), 1000);
        assert!(code.starts_with(stored.as_str()));
    }

    #[tokio::test]
    async fn test_unknown_session_is_not_found() {
        let engine = engine();
        let err = engine
            .execute_interpreted("missing", "print(1)", "python")
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        let err = engine
            .execute_sandboxed("missing", "x", SessionKind::SandboxedWeb)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_unmapped_language_is_rejected_before_dispatch() {
        let interpreter = Arc::new(EchoInterpreter::new());
        let mut providers = ProviderRegistry::new().with_sandbox_host(StaticSandboxHost::new());
        providers.register_interpreter(interpreter.clone());
        let config = RunnerConfig::builder()
            .interpreter_provider("echo")
            .sandbox_provider("static")
            .build();
        let engine = ExecutionEngine::new(SessionStore::new(TTL), providers, &config);
        let id = engine
            .create_session("lab", "alice", SessionKind::Interpreted)
            .await
            .unwrap();

        let err = engine
            .execute_interpreted(&id, "IDENTIFICATION DIVISION.", "cobol")
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(interpreter.calls(), 0);
        assert!(engine.store().get(&id).await.unwrap().executions.is_empty());
    }

    #[tokio::test]
    async fn test_provider_failure_appends_nothing() {
        let engine = engine_with(
            EchoInterpreter::failing("HTTP 503"),
            StaticSandboxHost::new(),
        );
        let id = engine
            .create_session("lab", "alice", SessionKind::Interpreted)
            .await
            .unwrap();

        let err = engine
            .execute_interpreted(&id, "print(1)", "python")
            .await
            .unwrap_err();
        assert!(err.is_provider());
        assert_eq!(err.to_string(), "echo failed: HTTP 503");
        assert!(engine.store().get(&id).await.unwrap().executions.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_result_after_stop_is_dropped() {
        let engine = Arc::new(engine_with(
            EchoInterpreter::new().with_delay(Duration::from_secs(5)),
            StaticSandboxHost::new(),
        ));
        let id = engine
            .create_session("lab", "alice", SessionKind::Interpreted)
            .await
            .unwrap();

        let running = {
            let engine = engine.clone();
            let id = id.clone();
            tokio::spawn(async move { engine.execute_interpreted(&id, "print(1)", "python").await })
        };
        tokio::time::sleep(Duration::from_secs(1)).await;
        engine.stop_session(&id).await;

        let result = running.await.unwrap().unwrap();
        assert_eq!(result.exit_code, 0);
        assert!(engine.store().is_empty().await);
    }

    #[tokio::test]
    async fn test_execute_sandboxed_stores_handle() {
        let engine = engine();
        let id = engine
            .create_session("lab", "alice", SessionKind::SandboxedElectron)
            .await
            .unwrap();

        let preview = engine
            .execute_sandboxed(&id, "console.log('hi')", SessionKind::SandboxedElectron)
            .await
            .unwrap();
        let session = engine.store().get(&id).await.unwrap();
        assert_eq!(preview.sandbox_id, "sbx1");
        assert_eq!(preview.preview_url, "https://sbx1.preview.test");
        assert_eq!(preview.expires_at, session.end_time);
        assert_eq!(session.sandbox.as_ref().unwrap().id, "sbx1");
        assert_eq!(
            engine.session(&id).await.unwrap().preview_url.as_deref(),
            Some("https://sbx1.preview.test")
        );
    }

    #[tokio::test]
    async fn test_sandboxed_manifest_depends_only_on_code_and_kind() {
        let host = Arc::new(StaticSandboxHost::new());
        let mut providers = ProviderRegistry::new().with_interpreter(EchoInterpreter::new());
        providers.register_sandbox_host(host.clone());
        let config = RunnerConfig::builder()
            .interpreter_provider("echo")
            .sandbox_provider("static")
            .build();
        let engine = ExecutionEngine::new(SessionStore::new(TTL), providers, &config);

        let first = engine.create_session("lab-a", "alice", SessionKind::SandboxedWeb).await.unwrap();
        let second = engine.create_session("lab-b", "bob", SessionKind::SandboxedWeb).await.unwrap();

        engine.execute_sandboxed(&first, "<p>hi</p>", SessionKind::SandboxedWeb).await.unwrap();
        let a = host.last_manifest().await.unwrap();
        engine.execute_sandboxed(&second, "<p>hi</p>", SessionKind::SandboxedWeb).await.unwrap();
        let b = host.last_manifest().await.unwrap();
        assert_eq!(a, b);
        assert_eq!(host.provisioned(), 2);
    }

    #[tokio::test]
    async fn test_sandboxed_rejects_interpreted_kind() {
        let engine = engine();
        let id = engine
            .create_session("lab", "alice", SessionKind::SandboxedWeb)
            .await
            .unwrap();
        let err = engine
            .execute_sandboxed(&id, "print(1)", SessionKind::Interpreted)
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert!(engine.store().get(&id).await.unwrap().sandbox.is_none());
    }

    #[tokio::test]
    async fn test_deploy_web_failure_leaves_session_untouched() {
        let engine = engine_with(EchoInterpreter::new(), StaticSandboxHost::failing("quota"));
        let id = engine
            .create_session("lab", "alice", SessionKind::SandboxedWeb)
            .await
            .unwrap();

        let err = engine
            .deploy_web(&id, "<h1>x</h1>", Some("require('http')"))
            .await
            .unwrap_err();
        assert!(err.is_provider());
        assert!(engine.store().get(&id).await.unwrap().sandbox.is_none());
    }

    #[tokio::test]
    async fn test_stop_session_twice() {
        let engine = engine();
        let id = engine
            .create_session("lab", "alice", SessionKind::Interpreted)
            .await
            .unwrap();

        engine.stop_session(&id).await;
        engine.stop_session(&id).await;
        assert!(engine.session(&id).await.unwrap_err().is_not_found());
        assert!(engine.user_sessions("alice").await.is_empty());
    }

    #[tokio::test]
    async fn test_create_session_requires_ids() {
        let engine = engine();
        let err = engine
            .create_session("", "alice", SessionKind::Interpreted)
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert!(engine.store().is_empty().await);
    }
}
