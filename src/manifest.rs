//! File manifests submitted to a sandbox host.
//!
//! Each template has its own builder and a list of files it cannot run
//! without. Builders are pure: the same inputs always give the same manifest.

use crate::error::{Result, RunnerError};
use crate::session::SessionKind;
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;

/// Project skeleton a manifest is laid out for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Template {
    /// Electron desktop app: main process script plus a renderer page.
    Electron,
    /// Node static web server plus a page.
    Web,
}

impl Template {
    /// Template identifier understood by the sandbox host.
    pub fn remote_id(&self) -> &'static str {
        match self {
            Template::Electron | Template::Web => "node",
        }
    }

    pub fn required_files(&self) -> &'static [&'static str] {
        match self {
            Template::Electron => &["package.json", "main.js", "index.html"],
            Template::Web => &["package.json", "server.js", "index.html"],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestFile {
    pub content: String,
}

/// A named-file tree for one template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    template: Template,
    files: BTreeMap<String, ManifestFile>,
}

impl Manifest {
    pub fn new(template: Template) -> Self {
        Self {
            template,
            files: BTreeMap::new(),
        }
    }

    pub fn with_file(mut self, name: impl Into<String>, content: impl Into<String>) -> Self {
        self.files.insert(
            name.into(),
            ManifestFile {
                content: content.into(),
            },
        );
        self
    }

    pub fn template(&self) -> Template {
        self.template
    }

    pub fn files(&self) -> &BTreeMap<String, ManifestFile> {
        &self.files
    }

    pub fn file(&self, name: &str) -> Option<&str> {
        self.files.get(name).map(|f| f.content.as_str())
    }

    /// Reject a manifest missing any file its template requires.
    pub fn validate(&self) -> Result<()> {
        let missing: Vec<&str> = self
            .template
            .required_files()
            .iter()
            .copied()
            .filter(|name| !self.files.contains_key(*name))
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(RunnerError::validation(format!(
                "{:?} manifest is missing {}",
                self.template,
                missing.join(", ")
            )))
        }
    }

    /// Manifest for a sandboxed session kind. `server_code` only applies to web.
    pub fn for_kind(kind: SessionKind, code: &str, server_code: Option<&str>) -> Result<Self> {
        match kind {
            SessionKind::SandboxedElectron => Self::electron(code),
            SessionKind::SandboxedWeb => Self::web(code, server_code),
            SessionKind::Interpreted => Err(RunnerError::validation(
                "interpreted sessions have no sandbox manifest",
            )),
        }
    }

    /// Electron app running `code` in the main process, inside `createWindow`
    /// once the window exists, and again in the page the window loads.
    pub fn electron(code: &str) -> Result<Self> {
        let package = json!({
            "name": "electron-app",
            "version": "1.0.0",
            "main": "main.js",
            "dependencies": { "electron": "^25.0.0" },
            "scripts": { "start": "electron ." },
        });

        let manifest = Self::new(Template::Electron)
            .with_file("package.json", to_pretty(&package)?)
            .with_file("main.js", electron_main(code))
            .with_file("index.html", html_page("Electron App", code));
        manifest.validate()?;
        Ok(manifest)
    }

    /// Static web page, served by `server_code` when it is a full Node script.
    pub fn web(frontend: &str, server_code: Option<&str>) -> Result<Self> {
        let package = json!({
            "name": "web-app",
            "version": "1.0.0",
            "scripts": { "start": "node server.js" },
        });

        let index = if frontend.trim().is_empty() {
            EMPTY_PAGE.to_string()
        } else {
            frontend.to_string()
        };
        let server_code = server_code.filter(|c| !c.trim().is_empty());
        let server = match server_code {
            Some(code) if code.contains("require") => code.to_string(),
            _ => STATIC_SERVER.to_string(),
        };
        let script = server_code.unwrap_or(DEFAULT_SCRIPT);

        let manifest = Self::new(Template::Web)
            .with_file("package.json", to_pretty(&package)?)
            .with_file("index.html", index)
            .with_file("script.js", script)
            .with_file("server.js", server);
        manifest.validate()?;
        Ok(manifest)
    }
}

fn to_pretty(value: &serde_json::Value) -> Result<String> {
    serde_json::to_string_pretty(value)
        .map_err(|e| RunnerError::validation(format!("package.json: {e}")))
}

fn html_page(title: &str, code: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="UTF-8">
  <title>{title}</title>
</head>
<body>
  <div id="app"></div>
  <script>
{code}
  </script>
</body>
</html>
"#
    )
}

fn electron_main(code: &str) -> String {
    format!(
        r#"const {{ app, BrowserWindow }} = require('electron');
const path = require('path');

function createWindow() {{
  const win = new BrowserWindow({{
    width: 800,
    height: 600,
    webPreferences: {{ nodeIntegration: true, contextIsolation: false }},
  }});

{code}

  win.loadFile(path.join(__dirname, 'index.html'));
}}

app.whenReady().then(createWindow);

app.on('window-all-closed', () => {{
  if (process.platform !== 'darwin') app.quit();
}});
"#
    )
}

const STATIC_SERVER: &str = r#"const http = require('http');
const fs = require('fs');
const path = require('path');

const server = http.createServer((req, res) => {
  const file = req.url === '/' ? 'index.html' : req.url.slice(1);
  fs.readFile(path.join(__dirname, file), (err, data) => {
    if (err) {
      res.writeHead(404);
      res.end('Not found');
      return;
    }
    res.writeHead(200, { 'Content-Type': file.endsWith('.js') ? 'text/javascript' : 'text/html' });
    res.end(data);
  });
});

server.listen(3000, () => {
  console.log('Server running at http://localhost:3000');
});
"#;

const EMPTY_PAGE: &str = "<html><body>Empty Project</body></html>";

const DEFAULT_SCRIPT: &str = "console.log('Hello from lab-runner');\n";
