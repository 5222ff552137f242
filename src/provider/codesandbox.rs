//! CodeSandbox "define" API for hosted previews.

use super::{post_json, SandboxHandle, SandboxHost};
use crate::error::{Result, RunnerError};
use crate::manifest::Manifest;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

pub const NAME: &str = "codesandbox";

/// Sandbox host backed by CodeSandbox.
pub struct CodeSandboxHost {
    http: reqwest::Client,
    url: String,
}

impl CodeSandboxHost {
    pub fn new(http: reqwest::Client, url: &str) -> Self {
        Self {
            http,
            url: url.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct DefineResponse {
    sandbox_id: Option<String>,
}

#[async_trait]
impl SandboxHost for CodeSandboxHost {
    fn name(&self) -> &str {
        NAME
    }

    async fn provision(&self, manifest: &Manifest) -> Result<SandboxHandle> {
        let body = json!({
            "files": manifest.files(),
            "template": manifest.template().remote_id(),
        });
        debug!(
            template = manifest.template().remote_id(),
            files = manifest.files().len(),
            "POST {}",
            self.url
        );

        let resp: DefineResponse = post_json(&self.http, &self.url, &body, NAME).await?;
        let id = resp
            .sandbox_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| RunnerError::provider(NAME, "response carried no sandbox_id"))?;

        Ok(SandboxHandle {
            url: format!("https://{id}.csb.app"),
            embed_url: format!("https://codesandbox.io/embed/{id}"),
            id,
        })
    }
}
