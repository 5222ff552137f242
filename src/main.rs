//! Lab Runner - time-boxed lab sessions over an HTTP API.
//!
//! Usage:
//!   lab-runner serve [--port 8080]        # Start HTTP server

use clap::{Parser, Subcommand};
use lab_runner::http_server;
use lab_runner::{AppState, RunnerConfig};
use std::process::exit;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "lab-runner")]
#[command(about = "Time-boxed lab sessions with remote execution and hosted previews")]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP server
    Serve(ServeArgs),
}

#[derive(clap::Args, Debug)]
struct ServeArgs {
    /// Port to listen on
    #[arg(long, env = "LAB_RUNNER_PORT", default_value = "8080")]
    port: u16,

    /// Session lifetime in seconds
    #[arg(long, env = "LAB_RUNNER_TTL_SECS", default_value = "840")]
    ttl_secs: u64,

    /// Characters of submitted code kept per execution record
    #[arg(long, env = "LAB_RUNNER_CODE_CAP", default_value = "1000")]
    code_cap: usize,

    /// Timeout for provider requests in seconds
    #[arg(long, env = "LAB_RUNNER_REQUEST_TIMEOUT_SECS", default_value = "30")]
    request_timeout_secs: u64,

    /// Piston execute endpoint
    #[arg(long, env = "LAB_RUNNER_PISTON_URL")]
    piston_url: Option<String>,

    /// Replit eval endpoint
    #[arg(long, env = "LAB_RUNNER_REPLIT_URL")]
    replit_url: Option<String>,

    /// CodeSandbox define endpoint
    #[arg(long, env = "LAB_RUNNER_CODESANDBOX_URL")]
    codesandbox_url: Option<String>,

    /// JDoodle execute endpoint
    #[arg(long, env = "LAB_RUNNER_JDOODLE_URL")]
    jdoodle_url: Option<String>,

    /// JDoodle client id (enables the jdoodle interpreter)
    #[arg(long, env = "LAB_RUNNER_JDOODLE_CLIENT_ID", requires = "jdoodle_client_secret")]
    jdoodle_client_id: Option<String>,

    /// JDoodle client secret
    #[arg(long, env = "LAB_RUNNER_JDOODLE_CLIENT_SECRET", hide_env_values = true)]
    jdoodle_client_secret: Option<String>,

    /// Interpreter used for code execution
    #[arg(long, env = "LAB_RUNNER_INTERPRETER", default_value = "piston")]
    interpreter_provider: String,

    /// Sandbox host used for previews
    #[arg(long, env = "LAB_RUNNER_SANDBOX_HOST", default_value = "codesandbox")]
    sandbox_provider: String,
}

impl ServeArgs {
    fn to_config(&self) -> RunnerConfig {
        let mut builder = RunnerConfig::builder()
            .session_ttl(Duration::from_secs(self.ttl_secs))
            .code_cap(self.code_cap)
            .request_timeout(Duration::from_secs(self.request_timeout_secs))
            .interpreter_provider(&self.interpreter_provider)
            .sandbox_provider(&self.sandbox_provider);
        if let Some(url) = &self.piston_url {
            builder = builder.piston_url(url);
        }
        if let Some(url) = &self.replit_url {
            builder = builder.replit_url(url);
        }
        if let Some(url) = &self.codesandbox_url {
            builder = builder.codesandbox_url(url);
        }
        if let Some(url) = &self.jdoodle_url {
            builder = builder.jdoodle_url(url);
        }
        if let (Some(id), Some(secret)) = (&self.jdoodle_client_id, &self.jdoodle_client_secret) {
            builder = builder.jdoodle_credentials(id, secret);
        }
        builder.build()
    }
}

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();

    match args.command {
        Commands::Serve(serve) => {
            let config = serve.to_config();
            let state = match AppState::new(&config) {
                Ok(state) => state,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    exit(1);
                }
            };
            if let Err(e) = http_server::run_server(serve.port, state).await {
                eprintln!("Error: {}", e);
                exit(1);
            }
        }
    }
}
