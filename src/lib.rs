//! # Lab Runner
//!
//! Time-boxed lab sessions whose code is either run by a remote interpreter
//! service or hosted as a live preview by a remote sandbox service.
//!
//! - [`SessionStore`] keeps live sessions in memory and re-checks each
//!   session's deadline on every read.
//! - [`ExpiryScheduler`] evicts every session at its deadline.
//! - [`ExecutionEngine`] validates liveness, delegates to a provider adapter
//!   and records the outcome on the session.
//! - [`ViewRouter`] resolves dashboard view tokens such as `#@preview/<id>/cs`.
//!
//! Nothing is persisted: a restart drops every session.

pub mod config;
pub mod engine;
pub mod error;
pub mod http_server;
pub mod manifest;
pub mod provider;
pub mod routes;
pub mod scheduler;
pub mod session;
pub mod state;
pub mod store;

pub use config::{RunnerConfig, RunnerConfigBuilder, CODE_CAP, SESSION_TTL};
pub use engine::{ExecutionEngine, ExecutionResult, PreviewDescriptor};
pub use error::{Result, RunnerError};
pub use manifest::{Manifest, Template};
pub use provider::{Interpreter, InterpreterOutput, ProviderRegistry, SandboxHandle, SandboxHost};
pub use routes::{RouteMatch, View, ViewRouter};
pub use scheduler::ExpiryScheduler;
pub use session::{ExecutionRecord, Session, SessionKind, SessionSummary};
pub use state::AppState;
pub use store::SessionStore;
