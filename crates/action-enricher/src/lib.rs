//! Action Enricher (C2): wrap a just-emitted LLM action with DOM element
//! evidence when the action is selector-oriented, producing an ordered
//! sequence of [`ExtendedAction`]s (§4.2).
//!
//! The enricher never fails the whole batch: a single action with a
//! missing or stale `index` degrades to `dom_element_data = None` rather
//! than aborting the step (§4.2 "degraded but non-fatal").

use soulbrowser_core_types::{
    ActionKind, BrainStateId, BrowserStateSummary, DomElementData, DomNode, ExtendedAction,
};

/// Enrich one step's raw LLM action batch into the ordered
/// [`ExtendedAction`] records the traversal will append (§4.2).
///
/// `brain_state_id` is the id of the brain state that was just recorded
/// for this step; every produced action references it (Invariant 1).
pub fn enrich_actions(
    actions: &[ActionKind],
    summary: &BrowserStateSummary,
    brain_state_id: &BrainStateId,
) -> Vec<ExtendedAction> {
    actions
        .iter()
        .map(|action| enrich_one(action, summary, brain_state_id))
        .collect()
}

fn enrich_one(
    action: &ActionKind,
    summary: &BrowserStateSummary,
    brain_state_id: &BrainStateId,
) -> ExtendedAction {
    let dom_element_data = if action.is_selector_oriented() {
        action
            .element_index()
            .and_then(|index| summary.element(index))
            .map(|node| build_dom_element_data(node, &summary.html))
    } else {
        None
    };

    ExtendedAction {
        brain_state_id: brain_state_id.clone(),
        action: action.clone(),
        dom_element_data,
        screenshot_filename: None,
    }
}

fn build_dom_element_data(node: &DomNode, page_html: &str) -> DomElementData {
    let xpath = normalize_leading_slashes(&node.xpath);
    let alternative_relative_xpaths = selector_factory::generate_candidates(&xpath, page_html);
    DomElementData {
        tag_name: node.tag_name.clone(),
        attributes: node.attributes.clone(),
        xpath,
        alternative_relative_xpaths,
        bounding_box: node.bounding_box,
    }
}

/// Ensure the xpath carries a leading `//` (§4.2 "XPath normalization").
/// An absolute `/html/...` path is left as-is; anything else gets a `//`
/// prefix unless it already has one.
fn normalize_leading_slashes(xpath: &str) -> String {
    if xpath.starts_with('/') {
        xpath.to_string()
    } else {
        format!("//{xpath}")
    }
}

/// Attach a screenshot filename to an already-enriched action, mirroring
/// how the Navigation Loop records the screenshot taken just before
/// executing the action (§3 `ExtendedAction.screenshot_filename`).
pub fn with_screenshot(mut action: ExtendedAction, filename: impl Into<String>) -> ExtendedAction {
    action.screenshot_filename = Some(filename.into());
    action
}
