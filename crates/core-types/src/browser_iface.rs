//! The browser controller capability (§6, consumed interface) and the
//! browser-state summary it produces each perception step. This crate
//! only models the trait boundary; concrete adapters (CDP, WebDriver, …)
//! live outside the core, same as the teacher workspace's `cdp-adapter`
//! sits below `agent-core` rather than inside it.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::OrchestratorResult;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// One entry of the browser-state summary's selector map: everything the
/// Action Enricher (C2) and the replay locator (C5) need to know about a
/// single indexed DOM element.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DomNode {
    pub tag_name: String,
    pub attributes: BTreeMap<String, String>,
    /// Full, absolute XPath as observed this step.
    pub xpath: String,
    pub text: Option<String>,
    pub is_visible: bool,
    pub is_enabled: bool,
    pub bounding_box: Option<BoundingBox>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TabInfo {
    pub index: u32,
    pub url: String,
    pub title: String,
}

/// `dump_dom_summary()`'s return shape (§6).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct BrowserStateSummary {
    pub url: String,
    pub title: String,
    pub tabs: Vec<TabInfo>,
    /// index -> DOM node, as handed to the LLM and referenced by
    /// selector-oriented actions.
    pub selector_map: BTreeMap<u32, DomNode>,
    pub html: String,
    pub pixels_above: u32,
    pub pixels_below: u32,
    pub screenshot_base64: Option<String>,
}

impl BrowserStateSummary {
    pub fn element(&self, index: u32) -> Option<&DomNode> {
        self.selector_map.get(&index)
    }
}

/// Page-load readiness states a caller can wait on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadState {
    Load,
    DomContentLoaded,
    NetworkIdle,
}

/// The capability set the core requires over a browser page (§6). One
/// implementation drives a real browser; `navigation-loop`'s test harness
/// provides a scripted fake.
#[async_trait]
pub trait BrowserController: Send + Sync {
    async fn goto(&self, url: &str) -> OrchestratorResult<()>;
    async fn wait_for_load_state(&self, state: LoadState) -> OrchestratorResult<()>;
    async fn evaluate(&self, js_expr: &str) -> OrchestratorResult<serde_json::Value>;
    async fn mouse_wheel(&self, dx: f64, dy: f64) -> OrchestratorResult<()>;
    async fn screencap(&self) -> OrchestratorResult<Vec<u8>>;
    async fn dump_dom_summary(&self) -> OrchestratorResult<BrowserStateSummary>;

    async fn click(&self, index: u32) -> OrchestratorResult<()>;
    async fn double_click(&self, index: u32) -> OrchestratorResult<()>;
    async fn hover(&self, index: u32) -> OrchestratorResult<()>;
    async fn type_text(&self, index: u32, text: &str) -> OrchestratorResult<()>;
    async fn fill(&self, index: u32, text: &str) -> OrchestratorResult<()>;
    async fn select_option(&self, index: u32, value: &str) -> OrchestratorResult<()>;
    async fn drag_to(&self, index: u32, target_index: u32) -> OrchestratorResult<()>;
    async fn get_dropdown_options(&self, index: u32) -> OrchestratorResult<Vec<String>>;
    async fn is_visible(&self, index: u32) -> OrchestratorResult<bool>;
    async fn is_enabled(&self, index: u32) -> OrchestratorResult<bool>;
    async fn bounding_box(&self, index: u32) -> OrchestratorResult<Option<BoundingBox>>;
    async fn scroll_into_view_if_needed(&self, index: u32) -> OrchestratorResult<()>;
    async fn press_key(&self, key: &str) -> OrchestratorResult<()>;

    async fn open_new_tab(&self, url: Option<&str>) -> OrchestratorResult<()>;
    async fn switch_tab(&self, tab_index: u32) -> OrchestratorResult<()>;
    async fn close_tab(&self, tab_index: u32) -> OrchestratorResult<()>;

    /// Best-effort proximity relocation by last-known bounding box
    /// (§4.5 locator strategy d). Returns the index of a currently
    /// visible element whose box is closest to `near`, within
    /// `tolerance_px`, or `None`.
    async fn find_by_proximity(
        &self,
        near: BoundingBox,
        tolerance_px: f64,
    ) -> OrchestratorResult<Option<u32>>;
}
