//! Browser session configuration shared between the Navigation Loop (C4),
//! the Replay + Healing state machine (C5) and the Pipeline DAG Runner
//! (C6). A `BrowserConfig` is a snapshot: it is captured once when a
//! session is built and stored verbatim in the traversal (Invariant —
//! `browser_config` in `Traversal`), never mutated afterwards.

use serde::{Deserialize, Serialize};

/// Effective browser-session parameters resolved before a session is
/// built. Mirrors the original config layer's resolved profile rather
/// than the raw TOML the host reads it from (TOML loading is out of
/// scope for this crate, see SPEC_FULL §1).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BrowserConfig {
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub user_agent: String,
    pub headless: bool,
    pub allowed_domains: Vec<String>,
    pub locale: String,
    pub timezone_id: String,
}

impl BrowserConfig {
    /// A reasonable default profile, used by tests and by callers that
    /// don't need to customize viewport/locale.
    pub fn desktop_default() -> Self {
        Self {
            viewport_width: 1280,
            viewport_height: 800,
            user_agent: "Mozilla/5.0 (compatible; orchestrator-core/0.1)".to_string(),
            headless: true,
            allowed_domains: Vec::new(),
            locale: "en-US".to_string(),
            timezone_id: "UTC".to_string(),
        }
    }

    /// True if `url`'s host is permitted by `allowed_domains`. An empty
    /// allow-list means "no restriction" — the original leaves the
    /// allow-list optional, and this crate mirrors that rather than
    /// defaulting to deny-all.
    pub fn allows_domain(&self, host: &str) -> bool {
        if self.allowed_domains.is_empty() {
            return true;
        }
        self.allowed_domains
            .iter()
            .any(|allowed| host == allowed || host.ends_with(&format!(".{allowed}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_allow_list_permits_everything() {
        let cfg = BrowserConfig::desktop_default();
        assert!(cfg.allows_domain("anything.example.org"));
    }

    #[test]
    fn allow_list_matches_exact_and_subdomain() {
        let mut cfg = BrowserConfig::desktop_default();
        cfg.allowed_domains = vec!["example.org".to_string()];
        assert!(cfg.allows_domain("example.org"));
        assert!(cfg.allows_domain("www.example.org"));
        assert!(!cfg.allows_domain("example.com"));
        assert!(!cfg.allows_domain("evilexample.org"));
    }
}
