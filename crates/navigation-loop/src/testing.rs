//! In-crate test harness (SPEC_FULL A4): a scripted fake browser
//! controller and a scripted fake LLM client, so the Navigation Loop —
//! and downstream crates (`replay-healing`, `pipeline-runner`) — can be
//! exercised without a real browser or network access. Mirrors how the
//! teacher's `scheduler` crate tests its orchestrator against
//! `MockRegistry`/`MockExecutor`.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use soulbrowser_core_types::{
    BoundingBox, BrowserController, BrowserStateSummary, DecisionRequest, LlmClient, LlmDecision,
    LoadState, OrchestratorError, OrchestratorResult,
};

/// A scripted browser controller: `dump_dom_summary` replays a fixed
/// sequence of [`BrowserStateSummary`]s (repeating the last once
/// exhausted); every other call records itself and succeeds, unless a
/// failure has been queued with [`FakeBrowserController::fail_next_click`].
pub struct FakeBrowserController {
    summaries: Mutex<VecDeque<BrowserStateSummary>>,
    last_summary: Mutex<Option<BrowserStateSummary>>,
    calls: Mutex<Vec<String>>,
    last_fill_text: Mutex<Option<String>>,
    fail_next_click: Mutex<u32>,
    current_url: Mutex<String>,
}

impl FakeBrowserController {
    pub fn new(summaries: Vec<BrowserStateSummary>) -> Self {
        Self {
            summaries: Mutex::new(summaries.into()),
            last_summary: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
            last_fill_text: Mutex::new(None),
            fail_next_click: Mutex::new(0),
            current_url: Mutex::new(String::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn last_fill_text(&self) -> Option<String> {
        self.last_fill_text.lock().unwrap().clone()
    }

    /// Make the next `n` `click` calls fail with a `browser_error`,
    /// exercising the Navigation Loop's bounded-retry path (§7).
    pub fn fail_next_click(&self, n: u32) {
        *self.fail_next_click.lock().unwrap() = n;
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }
}

#[async_trait]
impl BrowserController for FakeBrowserController {
    async fn goto(&self, url: &str) -> OrchestratorResult<()> {
        self.record(format!("goto:{url}"));
        *self.current_url.lock().unwrap() = url.to_string();
        Ok(())
    }

    async fn wait_for_load_state(&self, _state: LoadState) -> OrchestratorResult<()> {
        Ok(())
    }

    async fn evaluate(&self, js_expr: &str) -> OrchestratorResult<serde_json::Value> {
        self.record(format!("evaluate:{js_expr}"));
        Ok(serde_json::Value::Null)
    }

    async fn mouse_wheel(&self, dx: f64, dy: f64) -> OrchestratorResult<()> {
        self.record(format!("mouse_wheel:{dx},{dy}"));
        Ok(())
    }

    async fn screencap(&self) -> OrchestratorResult<Vec<u8>> {
        Ok(Vec::new())
    }

    async fn dump_dom_summary(&self) -> OrchestratorResult<BrowserStateSummary> {
        let mut queue = self.summaries.lock().unwrap();
        let summary = queue.pop_front();
        let summary = match summary {
            Some(s) => s,
            None => self
                .last_summary
                .lock()
                .unwrap()
                .clone()
                .ok_or_else(|| OrchestratorError::browser("no scripted browser state left"))?,
        };
        *self.last_summary.lock().unwrap() = Some(summary.clone());
        Ok(summary)
    }

    async fn click(&self, index: u32) -> OrchestratorResult<()> {
        let mut remaining = self.fail_next_click.lock().unwrap();
        if *remaining > 0 {
            *remaining -= 1;
            return Err(OrchestratorError::browser(format!(
                "scripted failure clicking index {index}"
            )));
        }
        drop(remaining);
        self.record(format!("click:{index}"));
        Ok(())
    }

    async fn double_click(&self, index: u32) -> OrchestratorResult<()> {
        self.record(format!("double_click:{index}"));
        Ok(())
    }

    async fn hover(&self, index: u32) -> OrchestratorResult<()> {
        self.record(format!("hover:{index}"));
        Ok(())
    }

    async fn type_text(&self, index: u32, text: &str) -> OrchestratorResult<()> {
        self.record(format!("type_text:{index}"));
        *self.last_fill_text.lock().unwrap() = Some(text.to_string());
        Ok(())
    }

    async fn fill(&self, index: u32, text: &str) -> OrchestratorResult<()> {
        self.record(format!("fill:{index}"));
        *self.last_fill_text.lock().unwrap() = Some(text.to_string());
        Ok(())
    }

    async fn select_option(&self, index: u32, value: &str) -> OrchestratorResult<()> {
        self.record(format!("select_option:{index}:{value}"));
        Ok(())
    }

    async fn drag_to(&self, index: u32, target_index: u32) -> OrchestratorResult<()> {
        self.record(format!("drag_to:{index}->{target_index}"));
        Ok(())
    }

    async fn get_dropdown_options(&self, index: u32) -> OrchestratorResult<Vec<String>> {
        self.record(format!("get_dropdown_options:{index}"));
        Ok(Vec::new())
    }

    async fn is_visible(&self, _index: u32) -> OrchestratorResult<bool> {
        Ok(true)
    }

    async fn is_enabled(&self, _index: u32) -> OrchestratorResult<bool> {
        Ok(true)
    }

    async fn bounding_box(&self, _index: u32) -> OrchestratorResult<Option<BoundingBox>> {
        Ok(None)
    }

    async fn scroll_into_view_if_needed(&self, index: u32) -> OrchestratorResult<()> {
        self.record(format!("scroll_into_view:{index}"));
        Ok(())
    }

    async fn press_key(&self, key: &str) -> OrchestratorResult<()> {
        self.record(format!("press_key:{key}"));
        Ok(())
    }

    async fn open_new_tab(&self, url: Option<&str>) -> OrchestratorResult<()> {
        self.record(format!("open_new_tab:{:?}", url));
        Ok(())
    }

    async fn switch_tab(&self, tab_index: u32) -> OrchestratorResult<()> {
        self.record(format!("switch_tab:{tab_index}"));
        Ok(())
    }

    async fn close_tab(&self, tab_index: u32) -> OrchestratorResult<()> {
        self.record(format!("close_tab:{tab_index}"));
        Ok(())
    }

    async fn find_by_proximity(
        &self,
        _near: BoundingBox,
        _tolerance_px: f64,
    ) -> OrchestratorResult<Option<u32>> {
        Ok(None)
    }
}

/// A scripted LLM client: `complete_structured` replays a fixed sequence
/// of results (`Ok(decision)` or `Err(..)`, to exercise the bounded
/// parse-retry path), repeating the last entry once exhausted.
pub struct FakeLlmClient {
    decisions: Mutex<VecDeque<OrchestratorResult<LlmDecision>>>,
}

impl FakeLlmClient {
    pub fn new(decisions: Vec<OrchestratorResult<LlmDecision>>) -> Self {
        Self {
            decisions: Mutex::new(decisions.into()),
        }
    }
}

#[async_trait]
impl LlmClient for FakeLlmClient {
    async fn complete(&self, _system: &str, _user: &str) -> OrchestratorResult<String> {
        Ok(String::new())
    }

    async fn complete_structured(
        &self,
        _request: &DecisionRequest,
    ) -> OrchestratorResult<LlmDecision> {
        let mut queue = self.decisions.lock().unwrap();
        match queue.pop_front() {
            Some(result) => result,
            None => Err(OrchestratorError::llm("no scripted decisions left")),
        }
    }
}
