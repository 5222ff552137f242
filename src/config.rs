//! Runner configuration with builder pattern.

use std::time::Duration;

/// Lifetime of every session, regardless of kind.
pub const SESSION_TTL: Duration = Duration::from_secs(14 * 60);

/// Maximum number of characters of submitted code kept per execution record.
pub const CODE_CAP: usize = 1000;

pub const DEFAULT_PISTON_URL: &str = "https://emkc.org/api/v2/piston/execute";
pub const DEFAULT_REPLIT_URL: &str = "https://eval-backend.replit.app/eval";
pub const DEFAULT_JDOODLE_URL: &str = "https://api.jdoodle.com/v1/execute";
pub const DEFAULT_CODESANDBOX_URL: &str = "https://codesandbox.io/api/v1/sandboxes/define?json=1";

/// API credentials for JDoodle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JDoodleCredentials {
    pub client_id: String,
    pub client_secret: String,
}

/// Configuration for the session store, engine and provider adapters.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Time-to-live applied to every session at creation.
    pub session_ttl: Duration,
    /// Cap on stored code length, in characters.
    pub code_cap: usize,
    /// Timeout for outbound provider requests.
    pub request_timeout: Duration,
    pub piston_url: String,
    /// Endpoint speaking the plain `{language, code}` eval contract.
    pub replit_url: String,
    pub jdoodle_url: String,
    /// JDoodle is only registered when credentials are configured.
    pub jdoodle_credentials: Option<JDoodleCredentials>,
    pub codesandbox_url: String,
    /// Registry name of the interpreter used by the engine.
    pub interpreter_provider: String,
    /// Registry name of the sandbox host used by the engine.
    pub sandbox_provider: String,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            session_ttl: SESSION_TTL,
            code_cap: CODE_CAP,
            request_timeout: Duration::from_secs(30),
            piston_url: DEFAULT_PISTON_URL.to_string(),
            replit_url: DEFAULT_REPLIT_URL.to_string(),
            jdoodle_url: DEFAULT_JDOODLE_URL.to_string(),
            jdoodle_credentials: None,
            codesandbox_url: DEFAULT_CODESANDBOX_URL.to_string(),
            interpreter_provider: "piston".to_string(),
            sandbox_provider: "codesandbox".to_string(),
        }
    }
}

impl RunnerConfig {
    /// Create a new builder for RunnerConfig.
    pub fn builder() -> RunnerConfigBuilder {
        RunnerConfigBuilder::default()
    }
}

/// Builder for creating RunnerConfig instances.
#[derive(Debug, Clone, Default)]
pub struct RunnerConfigBuilder {
    session_ttl: Option<Duration>,
    code_cap: Option<usize>,
    request_timeout: Option<Duration>,
    piston_url: Option<String>,
    replit_url: Option<String>,
    jdoodle_url: Option<String>,
    jdoodle_credentials: Option<JDoodleCredentials>,
    codesandbox_url: Option<String>,
    interpreter_provider: Option<String>,
    sandbox_provider: Option<String>,
}

impl RunnerConfigBuilder {
    pub fn session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = Some(ttl);
        self
    }

    pub fn code_cap(mut self, chars: usize) -> Self {
        self.code_cap = Some(chars);
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn piston_url(mut self, url: impl Into<String>) -> Self {
        self.piston_url = Some(url.into());
        self
    }

    pub fn replit_url(mut self, url: impl Into<String>) -> Self {
        self.replit_url = Some(url.into());
        self
    }

    pub fn jdoodle_url(mut self, url: impl Into<String>) -> Self {
        self.jdoodle_url = Some(url.into());
        self
    }

    pub fn jdoodle_credentials(
        mut self,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        self.jdoodle_credentials = Some(JDoodleCredentials {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        });
        self
    }

    pub fn codesandbox_url(mut self, url: impl Into<String>) -> Self {
        self.codesandbox_url = Some(url.into());
        self
    }

    pub fn interpreter_provider(mut self, name: impl Into<String>) -> Self {
        self.interpreter_provider = Some(name.into());
        self
    }

    pub fn sandbox_provider(mut self, name: impl Into<String>) -> Self {
        self.sandbox_provider = Some(name.into());
        self
    }

    /// Build the RunnerConfig, filling unset fields with defaults.
    pub fn build(self) -> RunnerConfig {
        let default = RunnerConfig::default();
        RunnerConfig {
            session_ttl: self.session_ttl.unwrap_or(default.session_ttl),
            code_cap: self.code_cap.unwrap_or(default.code_cap),
            request_timeout: self.request_timeout.unwrap_or(default.request_timeout),
            piston_url: self.piston_url.unwrap_or(default.piston_url),
            replit_url: self.replit_url.unwrap_or(default.replit_url),
            jdoodle_url: self.jdoodle_url.unwrap_or(default.jdoodle_url),
            jdoodle_credentials: self.jdoodle_credentials.or(default.jdoodle_credentials),
            codesandbox_url: self.codesandbox_url.unwrap_or(default.codesandbox_url),
            interpreter_provider: self
                .interpreter_provider
                .unwrap_or(default.interpreter_provider),
            sandbox_provider: self.sandbox_provider.unwrap_or(default.sandbox_provider),
        }
    }
}
