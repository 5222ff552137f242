//! `#@component/param` view tokens used by the dashboard.
//!
//! Patterns are tried in registration order and the first full match wins.
//! Anything unmatched resolves to the dashboard with no params.

use serde::Serialize;
use std::collections::BTreeMap;

pub const TOKEN_PREFIX: &str = "#@";

/// Views a token can resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum View {
    Auth,
    Dashboard,
    LabEditor,
    LabPreview,
    LabsList,
    ExecutionTerminal,
    DeploymentView,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

#[derive(Debug, Clone)]
struct Route {
    segments: Vec<Segment>,
    view: View,
}

impl Route {
    fn new(pattern: &str, view: View) -> Self {
        let segments = pattern
            .split('/')
            .map(|seg| match seg.strip_prefix(':') {
                Some(name) => Segment::Param(name.to_string()),
                None => Segment::Literal(seg.to_string()),
            })
            .collect();
        Self { segments, view }
    }

    fn matches(&self, path: &str) -> Option<BTreeMap<String, String>> {
        let parts: Vec<&str> = path.split('/').collect();
        if parts.len() != self.segments.len() {
            return None;
        }
        let mut params = BTreeMap::new();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Literal(lit) if lit == part => {}
                Segment::Param(name) if !part.is_empty() => {
                    params.insert(name.clone(), part.to_string());
                }
                _ => return None,
            }
        }
        Some(params)
    }
}

/// Outcome of resolving a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteMatch {
    pub view: View,
    pub params: BTreeMap<String, String>,
    /// Path after the prefix, set only when a registered pattern matched.
    pub full_path: Option<String>,
}

impl RouteMatch {
    fn fallback() -> Self {
        Self {
            view: View::Dashboard,
            params: BTreeMap::new(),
            full_path: None,
        }
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }
}

/// Ordered pattern table mapping view tokens to views.
#[derive(Debug, Clone)]
pub struct ViewRouter {
    routes: Vec<Route>,
}

impl Default for ViewRouter {
    fn default() -> Self {
        Self::empty()
            .define("auth", View::Auth)
            .define("dashboard", View::Dashboard)
            .define("lab/:id", View::LabEditor)
            .define("preview/:sessionId/:type", View::LabPreview)
            .define("labs", View::LabsList)
            .define("execute/:labId/:language", View::ExecutionTerminal)
            .define("deploy/:labId", View::DeploymentView)
    }
}

impl ViewRouter {
    pub fn empty() -> Self {
        Self { routes: Vec::new() }
    }

    /// Append a pattern; earlier patterns take precedence.
    pub fn define(mut self, pattern: &str, view: View) -> Self {
        self.routes.push(Route::new(pattern, view));
        self
    }

    pub fn resolve(&self, token: &str) -> RouteMatch {
        let Some(path) = token.strip_prefix(TOKEN_PREFIX) else {
            return RouteMatch::fallback();
        };
        self.routes
            .iter()
            .find_map(|route| {
                route.matches(path).map(|params| RouteMatch {
                    view: route.view,
                    params,
                    full_path: Some(path.to_string()),
                })
            })
            .unwrap_or_else(RouteMatch::fallback)
    }

    /// Render a token for `pattern`, filling `:params` in order. Missing values
    /// become empty segments.
    pub fn href(pattern: &str, params: &[&str]) -> String {
        let mut values = params.iter();
        let path: Vec<&str> = pattern
            .split('/')
            .map(|seg| {
                if seg.starts_with(':') {
                    values.next().copied().unwrap_or("")
                } else {
                    seg
                }
            })
            .collect();
        format!("{TOKEN_PREFIX}{}", path.join("/"))
    }

    pub fn to_dashboard() -> String {
        Self::href("dashboard", &[])
    }

    pub fn to_lab(lab_id: &str) -> String {
        Self::href("lab/:id", &[lab_id])
    }

    /// Preview token; `kind` defaults to `cs` when absent.
    pub fn to_preview(session_id: &str, kind: Option<&str>) -> String {
        Self::href("preview/:sessionId/:type", &[session_id, kind.unwrap_or("cs")])
    }

    pub fn to_execute(lab_id: &str, language: &str) -> String {
        Self::href("execute/:labId/:language", &[lab_id, language])
    }

    pub fn to_deploy(lab_id: &str) -> String {
        Self::href("deploy/:labId", &[lab_id])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionKind;

    #[test]
    fn test_preview_token_extracts_params() {
        let m = ViewRouter::default().resolve("#@preview/abc123/cs");
        assert_eq!(m.view, View::LabPreview);
        assert_eq!(m.param("sessionId"), Some("abc123"));
        assert_eq!(m.param("type"), Some("cs"));
        assert_eq!(m.params.len(), 2);
        assert_eq!(m.full_path.as_deref(), Some("preview/abc123/cs"));
    }

    #[test]
    fn test_unknown_component_falls_back_to_dashboard() {
        let router = ViewRouter::default();
        for token in ["#@unknownthing", "#@", "", "dashboard", "#lab/1", "#@lab/", "#@lab/1/extra"] {
            let m = router.resolve(token);
            assert_eq!(m.view, View::Dashboard, "{token}");
            assert!(m.params.is_empty(), "{token}");
            assert!(m.full_path.is_none(), "{token}");
        }
    }

    #[test]
    fn test_literal_routes() {
        let router = ViewRouter::default();
        assert_eq!(router.resolve("#@labs").view, View::LabsList);
        assert_eq!(router.resolve("#@auth").view, View::Auth);
        let m = router.resolve("#@execute/lab-9/rust");
        assert_eq!(m.view, View::ExecutionTerminal);
        assert_eq!(m.param("labId"), Some("lab-9"));
        assert_eq!(m.param("language"), Some("rust"));
    }

    #[test]
    fn test_first_match_wins() {
        let router = ViewRouter::empty()
            .define("lab/new", View::DeploymentView)
            .define("lab/:id", View::LabEditor);
        assert_eq!(router.resolve("#@lab/new").view, View::DeploymentView);
        assert_eq!(router.resolve("#@lab/42").view, View::LabEditor);
    }

    #[test]
    fn test_href_round_trips_through_resolve() {
        let router = ViewRouter::default();
        assert_eq!(ViewRouter::to_lab("42"), "#@lab/42");
        assert_eq!(ViewRouter::to_preview("s1", None), "#@preview/s1/cs");
        assert_eq!(ViewRouter::to_dashboard(), "#@dashboard");
        assert_eq!(ViewRouter::href("deploy/:labId", &[]), "#@deploy/");

        let token = ViewRouter::to_preview("s1", Some(SessionKind::SandboxedWeb.route_type()));
        let m = router.resolve(&token);
        assert_eq!(m.view, View::LabPreview);
        assert_eq!(m.param("type"), Some("web"));
        assert_eq!(router.resolve(&ViewRouter::to_deploy("7")).view, View::DeploymentView);
    }
}
