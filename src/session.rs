//! Session records and their display views.

use crate::error::RunnerError;
use crate::provider::{InterpreterOutput, SandboxHandle};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tokio::time::Instant;

/// What a session was opened for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionKind {
    #[serde(alias = "cs")]
    Interpreted,
    #[serde(alias = "electron")]
    SandboxedElectron,
    #[serde(alias = "web")]
    SandboxedWeb,
}

impl SessionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionKind::Interpreted => "interpreted",
            SessionKind::SandboxedElectron => "sandboxed-electron",
            SessionKind::SandboxedWeb => "sandboxed-web",
        }
    }

    /// Short name used in preview view tokens (`#@preview/<id>/<type>`).
    pub fn route_type(&self) -> &'static str {
        match self {
            SessionKind::Interpreted => "cs",
            SessionKind::SandboxedElectron => "electron",
            SessionKind::SandboxedWeb => "web",
        }
    }
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionKind {
    type Err = RunnerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "interpreted" | "cs" => Ok(SessionKind::Interpreted),
            "sandboxed-electron" | "electron" => Ok(SessionKind::SandboxedElectron),
            "sandboxed-web" | "web" => Ok(SessionKind::SandboxedWeb),
            other => Err(RunnerError::validation(format!(
                "unknown session kind: {other}"
            ))),
        }
    }
}

/// One successful interpreted run, as kept on the session.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionRecord {
    pub timestamp: DateTime<Utc>,
    pub language: String,
    /// At most `code_cap` characters of the submitted code.
    pub truncated_code: String,
    pub result: InterpreterOutput,
}

/// A time-boxed handle binding a user and a lab to a live execution context.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub lab_id: String,
    pub user_id: String,
    pub kind: SessionKind,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Monotonic twin of `end_time`; liveness checks and eviction use this.
    pub deadline: Instant,
    pub executions: Vec<ExecutionRecord>,
    pub sandbox: Option<SandboxHandle>,
}

impl Session {
    pub fn new(
        id: String,
        lab_id: impl Into<String>,
        user_id: impl Into<String>,
        kind: SessionKind,
        ttl: Duration,
    ) -> Self {
        let start_time = Utc::now();
        let end_time = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| start_time.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self {
            id,
            lab_id: lab_id.into(),
            user_id: user_id.into(),
            kind,
            start_time,
            end_time,
            deadline: Instant::now() + ttl,
            executions: Vec::new(),
            sandbox: None,
        }
    }

    /// True while `now` is strictly before the deadline.
    pub fn is_live_at(&self, now: Instant) -> bool {
        now < self.deadline
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id.clone(),
            lab_id: self.lab_id.clone(),
            kind: self.kind,
            start_time: self.start_time,
            end_time: self.end_time,
            execution_count: self.executions.len(),
            preview_url: self.sandbox.as_ref().map(|s| s.url.clone()),
        }
    }
}

/// Display view of a live session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: String,
    pub lab_id: String,
    pub kind: SessionKind,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub execution_count: usize,
    pub preview_url: Option<String>,
}

/// Keep the first `cap` characters of `code`.
pub fn truncate_code(code: &str, cap: usize) -> String {
    code.chars().take(cap).collect()
}
