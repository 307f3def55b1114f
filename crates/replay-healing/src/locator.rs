//! §4.5 step 2: locate the element a recorded `ExtendedAction` targeted,
//! against a freshly captured [`BrowserStateSummary`], trying strategies
//! in fallback order. Grounded in the teacher's `action-locator::strategies`
//! `Strategy` trait / fallback chain, adapted to resolve against the
//! summary's selector map rather than a live CDP query (C4/C5 already
//! model the browser surface that way).

use once_cell::sync::Lazy;
use regex::Regex;
use soulbrowser_core_types::{
    BoundingBox, BrowserController, BrowserStateSummary, DomElementData, DomNode,
    OrchestratorResult,
};
use std::sync::Arc;

/// Which locator strategy resolved the element, recorded for logging and
/// for `DESIGN.md`'s testable-property coverage (Testable Property 8).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LocatorStrategy {
    OriginalXpath,
    Alternative,
    AttributeReconstruction,
    Proximity,
}

impl LocatorStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            Self::OriginalXpath => "original_xpath",
            Self::Alternative => "alternative_xpath",
            Self::AttributeReconstruction => "attribute_reconstruction",
            Self::Proximity => "proximity",
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct LocateOutcome {
    pub index: u32,
    pub strategy: LocatorStrategy,
}

const PROXIMITY_TOLERANCE_PX: f64 = 20.0;

/// Try each strategy in §4.5 order; the first one yielding exactly one
/// matching, visible, enabled element wins. Returns `None` if every
/// strategy is exhausted (the healing transition's trigger).
pub async fn locate(
    browser: &Arc<dyn BrowserController>,
    summary: &BrowserStateSummary,
    dom_data: &DomElementData,
) -> OrchestratorResult<Option<LocateOutcome>> {
    if let Some(index) = unique_interactable_match(summary, |node| node.xpath == dom_data.xpath) {
        return Ok(Some(LocateOutcome {
            index,
            strategy: LocatorStrategy::OriginalXpath,
        }));
    }

    for alternative in &dom_data.alternative_relative_xpaths {
        if let Some(index) =
            unique_interactable_match(summary, |node| predicate_matches(alternative, node))
        {
            return Ok(Some(LocateOutcome {
                index,
                strategy: LocatorStrategy::Alternative,
            }));
        }
    }

    if let Some(index) = reconstruct_by_attributes(summary, dom_data) {
        return Ok(Some(LocateOutcome {
            index,
            strategy: LocatorStrategy::AttributeReconstruction,
        }));
    }

    if let Some(bounding_box) = dom_data.bounding_box {
        if let Some(index) = browser
            .find_by_proximity(bounding_box, PROXIMITY_TOLERANCE_PX)
            .await?
        {
            return Ok(Some(LocateOutcome {
                index,
                strategy: LocatorStrategy::Proximity,
            }));
        }
    }

    Ok(None)
}

fn unique_interactable_match(
    summary: &BrowserStateSummary,
    predicate: impl Fn(&DomNode) -> bool,
) -> Option<u32> {
    let mut matches = summary
        .selector_map
        .iter()
        .filter(|(_, node)| node.is_visible && node.is_enabled && predicate(node));
    let (index, _) = matches.next()?;
    if matches.next().is_some() {
        return None;
    }
    Some(*index)
}

/// Attribute-based reconstruction: id > name > placeholder > class, same
/// priority order the selector factory (C1) used to generate candidates
/// in the first place.
fn reconstruct_by_attributes(summary: &BrowserStateSummary, dom_data: &DomElementData) -> Option<u32> {
    for key in ["id", "name", "placeholder"] {
        if let Some(value) = dom_data.attributes.get(key) {
            if let Some(index) = unique_interactable_match(summary, |node| {
                node.tag_name == dom_data.tag_name && node.attributes.get(key) == Some(value)
            }) {
                return Some(index);
            }
        }
    }
    if let Some(class) = dom_data.attributes.get("class") {
        if let Some(index) = unique_interactable_match(summary, |node| {
            node.tag_name == dom_data.tag_name
                && node
                    .attributes
                    .get("class")
                    .is_some_and(|node_class| node_class == class)
        }) {
            return Some(index);
        }
    }
    None
}

static ID_PREDICATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^//(\w+)\[@id='([^']*)'\]$").unwrap());
static NAME_PREDICATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^//(\w+)\[@name='([^']*)'\]$").unwrap());
static PLACEHOLDER_PREDICATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^//(\w+)\[@placeholder='([^']*)'\]$").unwrap());
static CLASS_CONTAINS_PREDICATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^//(\w+)\[contains\(@class,\s*'([^']*)'\)").unwrap());
static TEXT_PREDICATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^//(\w+)\[normalize-space\(\)='([^']*)'\]$").unwrap());
static POSITIONAL_PREDICATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^//(\w+)\[(\d+)\]$").unwrap());

/// Parse one of the candidate shapes the Selector Factory (C1) produces
/// and check whether `node` satisfies it. Unknown shapes never match
/// (conservative: a locator strategy that can't be understood is treated
/// as a miss, not a panic).
fn predicate_matches(candidate: &str, node: &DomNode) -> bool {
    if let Some(caps) = ID_PREDICATE.captures(candidate) {
        return tag_matches(&caps[1], node) && node.attributes.get("id").map(String::as_str) == Some(&caps[2]);
    }
    if let Some(caps) = NAME_PREDICATE.captures(candidate) {
        return tag_matches(&caps[1], node)
            && node.attributes.get("name").map(String::as_str) == Some(&caps[2]);
    }
    if let Some(caps) = PLACEHOLDER_PREDICATE.captures(candidate) {
        return tag_matches(&caps[1], node)
            && node.attributes.get("placeholder").map(String::as_str) == Some(&caps[2]);
    }
    if let Some(caps) = CLASS_CONTAINS_PREDICATE.captures(candidate) {
        return tag_matches(&caps[1], node)
            && node
                .attributes
                .get("class")
                .is_some_and(|class| class.split_whitespace().any(|token| token == &caps[2]));
    }
    if let Some(caps) = TEXT_PREDICATE.captures(candidate) {
        return tag_matches(&caps[1], node)
            && node.text.as_deref().map(str::trim) == Some(&caps[2]);
    }
    // Positional candidates (`//tag[N]`) cannot be re-checked against a
    // single node in isolation (they depend on sibling position); treat
    // as a non-match here and let the original/alternative/attribute
    // strategies above carry that case instead.
    let _ = &*POSITIONAL_PREDICATE;
    false
}

fn tag_matches(candidate_tag: &str, node: &DomNode) -> bool {
    candidate_tag.eq_ignore_ascii_case(&node.tag_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn summary_with(nodes: Vec<(u32, DomNode)>) -> BrowserStateSummary {
        BrowserStateSummary {
            url: "https://example.org".to_string(),
            title: "Example".to_string(),
            tabs: vec![],
            selector_map: nodes.into_iter().collect(),
            html: String::new(),
            pixels_above: 0,
            pixels_below: 0,
            screenshot_base64: None,
        }
    }

    fn node_with_id(tag: &str, id: &str) -> DomNode {
        let mut attributes = BTreeMap::new();
        attributes.insert("id".to_string(), id.to_string());
        DomNode {
            tag_name: tag.to_string(),
            attributes,
            xpath: format!("/html/body/{tag}[1]"),
            text: None,
            is_visible: true,
            is_enabled: true,
            bounding_box: None,
        }
    }

    fn dom_data_for(node: &DomNode, alternatives: Vec<String>) -> DomElementData {
        DomElementData {
            tag_name: node.tag_name.clone(),
            attributes: node.attributes.clone(),
            xpath: node.xpath.clone(),
            alternative_relative_xpaths: alternatives,
            bounding_box: None,
        }
    }

    struct UnusedBrowser;

    #[async_trait::async_trait]
    impl BrowserController for UnusedBrowser {
        async fn goto(&self, _url: &str) -> OrchestratorResult<()> {
            Ok(())
        }
        async fn wait_for_load_state(
            &self,
            _state: soulbrowser_core_types::LoadState,
        ) -> OrchestratorResult<()> {
            Ok(())
        }
        async fn evaluate(&self, _js_expr: &str) -> OrchestratorResult<serde_json::Value> {
            Ok(serde_json::Value::Null)
        }
        async fn mouse_wheel(&self, _dx: f64, _dy: f64) -> OrchestratorResult<()> {
            Ok(())
        }
        async fn screencap(&self) -> OrchestratorResult<Vec<u8>> {
            Ok(Vec::new())
        }
        async fn dump_dom_summary(&self) -> OrchestratorResult<BrowserStateSummary> {
            Ok(summary_with(vec![]))
        }
        async fn click(&self, _index: u32) -> OrchestratorResult<()> {
            Ok(())
        }
        async fn double_click(&self, _index: u32) -> OrchestratorResult<()> {
            Ok(())
        }
        async fn hover(&self, _index: u32) -> OrchestratorResult<()> {
            Ok(())
        }
        async fn type_text(&self, _index: u32, _text: &str) -> OrchestratorResult<()> {
            Ok(())
        }
        async fn fill(&self, _index: u32, _text: &str) -> OrchestratorResult<()> {
            Ok(())
        }
        async fn select_option(&self, _index: u32, _value: &str) -> OrchestratorResult<()> {
            Ok(())
        }
        async fn drag_to(&self, _index: u32, _target_index: u32) -> OrchestratorResult<()> {
            Ok(())
        }
        async fn get_dropdown_options(&self, _index: u32) -> OrchestratorResult<Vec<String>> {
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
        async fn scroll_into_view_if_needed(&self, _index: u32) -> OrchestratorResult<()> {
            Ok(())
        }
        async fn press_key(&self, _key: &str) -> OrchestratorResult<()> {
            Ok(())
        }
        async fn open_new_tab(&self, _url: Option<&str>) -> OrchestratorResult<()> {
            Ok(())
        }
        async fn switch_tab(&self, _tab_index: u32) -> OrchestratorResult<()> {
            Ok(())
        }
        async fn close_tab(&self, _tab_index: u32) -> OrchestratorResult<()> {
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

    #[tokio::test]
    async fn original_xpath_wins_when_still_unique() {
        let node = node_with_id("button", "go");
        let summary = summary_with(vec![(0, node.clone())]);
        let dom_data = dom_data_for(&node, vec![]);
        let browser: Arc<dyn BrowserController> = Arc::new(UnusedBrowser);
        let outcome = locate(&browser, &summary, &dom_data).await.unwrap().unwrap();
        assert_eq!(outcome.index, 0);
        assert_eq!(outcome.strategy, LocatorStrategy::OriginalXpath);
    }

    #[tokio::test]
    async fn falls_back_to_alternative_xpath_when_original_moved() {
        let mut node = node_with_id("button", "go");
        node.xpath = "/html/body/div[2]/button[1]".to_string();
        let summary = summary_with(vec![(0, node.clone())]);
        let mut dom_data = dom_data_for(&node, vec!["//button[@id='go']".to_string()]);
        dom_data.xpath = "/html/body/button[1]".to_string();
        let browser: Arc<dyn BrowserController> = Arc::new(UnusedBrowser);
        let outcome = locate(&browser, &summary, &dom_data).await.unwrap().unwrap();
        assert_eq!(outcome.index, 0);
        assert_eq!(outcome.strategy, LocatorStrategy::Alternative);
    }

    #[tokio::test]
    async fn attribute_reconstruction_used_when_xpaths_all_miss() {
        let node = node_with_id("button", "go");
        let summary = summary_with(vec![(0, node.clone())]);
        let mut dom_data = dom_data_for(&node, vec![]);
        dom_data.xpath = "/html/body/div[9]/button[1]".to_string();
        let browser: Arc<dyn BrowserController> = Arc::new(UnusedBrowser);
        let outcome = locate(&browser, &summary, &dom_data).await.unwrap().unwrap();
        assert_eq!(outcome.strategy, LocatorStrategy::AttributeReconstruction);
    }

    #[tokio::test]
    async fn ambiguous_match_is_rejected_as_not_unique() {
        let node_a = node_with_id("button", "go");
        let mut node_b = node_with_id("button", "go");
        node_b.xpath = "/html/body/button[2]".to_string();
        let summary = summary_with(vec![(0, node_a.clone()), (1, node_b)]);
        let mut dom_data = dom_data_for(&node_a, vec![]);
        dom_data.xpath = "/html/body/div[9]/button[1]".to_string();
        let browser: Arc<dyn BrowserController> = Arc::new(UnusedBrowser);
        let outcome = locate(&browser, &summary, &dom_data).await.unwrap();
        assert!(outcome.is_none());
    }

    #[tokio::test]
    async fn every_strategy_exhausted_returns_none() {
        let node = node_with_id("button", "go");
        let summary = summary_with(vec![]);
        let dom_data = dom_data_for(&node, vec![]);
        let browser: Arc<dyn BrowserController> = Arc::new(UnusedBrowser);
        let outcome = locate(&browser, &summary, &dom_data).await.unwrap();
        assert!(outcome.is_none());
    }
}
