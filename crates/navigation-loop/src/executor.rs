//! §4.4 step 4 "Execute": dispatch one recorded action against the
//! browser controller, substituting secrets into text parameters at this
//! boundary and never earlier (Invariant 7).

use std::sync::Arc;

use soulbrowser_core_types::{
    ActionKind, BrowserController, BrowserStateSummary, ErrorContext, LoadState,
    OrchestratorError, OrchestratorResult, SecretMap,
};

/// What happened after executing one action, from the loop's point of
/// view — whether to keep stepping or that a `done` action ended the run.
pub enum ActionEffect {
    Continued,
    Done { success: bool, text: Option<String> },
}

/// Execute `action` against `browser`. `summary` is the DOM snapshot the
/// action's index (if any) was resolved against during enrichment —
/// selector-oriented actions are dispatched by that same index, per
/// §4.4 step 4 ("locate the target element by index against the current
/// DOM summary").
pub async fn execute_action(
    browser: &Arc<dyn BrowserController>,
    secrets: &SecretMap,
    summary: &BrowserStateSummary,
    action: &ActionKind,
) -> OrchestratorResult<ActionEffect> {
    match action {
        ActionKind::ClickElementByIndex { index } => {
            require_visible_enabled(summary, *index)?;
            browser.click(*index).await?;
        }
        ActionKind::InputText { index, text } => {
            require_visible_enabled(summary, *index)?;
            let substituted = secrets.substitute(text);
            browser.fill(*index, &substituted).await?;
        }
        ActionKind::GetDropdownOptions { index } => {
            browser.get_dropdown_options(*index).await?;
        }
        ActionKind::SelectDropdownOption { index, value } => {
            require_visible_enabled(summary, *index)?;
            browser.select_option(*index, value).await?;
        }
        ActionKind::DragDrop { index, target_index } => {
            require_visible_enabled(summary, *index)?;
            browser.drag_to(*index, *target_index).await?;
        }
        ActionKind::GoToUrl { url } => {
            browser.goto(url).await?;
            browser.wait_for_load_state(LoadState::Load).await?;
        }
        ActionKind::OpenNewTab { url } => {
            browser.open_new_tab(url.as_deref()).await?;
        }
        ActionKind::SwitchTab { tab_index } => {
            browser.switch_tab(*tab_index).await?;
        }
        ActionKind::CloseTab { tab_index } => {
            browser.close_tab(*tab_index).await?;
        }
        ActionKind::Wait { seconds } => {
            tokio::time::sleep(std::time::Duration::from_secs_f64(seconds.max(0.0))).await;
        }
        ActionKind::ScrollUp { amount } => {
            browser.mouse_wheel(0.0, -(amount.unwrap_or(400) as f64)).await?;
        }
        ActionKind::ScrollDown { amount } => {
            browser.mouse_wheel(0.0, amount.unwrap_or(400) as f64).await?;
        }
        ActionKind::PressKey { key } => {
            browser.press_key(key).await?;
        }
        ActionKind::ExtractContent { goal: _ } => {
            browser.evaluate("document.body.innerText").await?;
        }
        ActionKind::Done { success, text } => {
            return Ok(ActionEffect::Done {
                success: *success,
                text: text.clone(),
            });
        }
    }
    Ok(ActionEffect::Continued)
}

fn require_visible_enabled(summary: &BrowserStateSummary, index: u32) -> OrchestratorResult<()> {
    let Some(node) = summary.element(index) else {
        return Err(OrchestratorError::browser(format!(
            "element index {index} not present in current DOM summary"
        ))
        .with_context(ErrorContext::new()));
    };
    if !node.is_visible {
        return Err(OrchestratorError::browser(format!(
            "element index {index} is not visible"
        )));
    }
    if !node.is_enabled {
        return Err(OrchestratorError::browser(format!(
            "element index {index} is not enabled"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeBrowserController;
    use std::collections::{BTreeMap, HashMap};

    fn summary_with(index: u32, visible: bool, enabled: bool) -> BrowserStateSummary {
        let mut selector_map = BTreeMap::new();
        selector_map.insert(
            index,
            soulbrowser_core_types::DomNode {
                tag_name: "button".to_string(),
                attributes: BTreeMap::new(),
                xpath: "/html/body/button[1]".to_string(),
                text: Some("Go".to_string()),
                is_visible: visible,
                is_enabled: enabled,
                bounding_box: None,
            },
        );
        BrowserStateSummary {
            url: "https://example.org".to_string(),
            title: "Example".to_string(),
            tabs: vec![],
            selector_map,
            html: String::new(),
            pixels_above: 0,
            pixels_below: 0,
            screenshot_base64: None,
        }
    }

    #[tokio::test]
    async fn secrets_substituted_only_at_execution_boundary() {
        let fake = Arc::new(FakeBrowserController::new(vec![]));
        let browser: Arc<dyn BrowserController> = fake.clone();
        let summary = summary_with(0, true, true);
        let mut map = HashMap::new();
        map.insert("PASSWORD".to_string(), "hunter2".to_string());
        let secrets = SecretMap::from_map(map);
        let action = ActionKind::InputText {
            index: 0,
            text: "{{PASSWORD}}".to_string(),
        };
        execute_action(&browser, &secrets, &summary, &action)
            .await
            .unwrap();
        assert_eq!(fake.last_fill_text(), Some("hunter2".to_string()));
    }

    #[tokio::test]
    async fn click_on_invisible_element_is_a_browser_error() {
        let fake = Arc::new(FakeBrowserController::new(vec![]));
        let browser: Arc<dyn BrowserController> = fake;
        let summary = summary_with(0, false, true);
        let secrets = SecretMap::new();
        let action = ActionKind::ClickElementByIndex { index: 0 };
        let err = execute_action(&browser, &secrets, &summary, &action)
            .await
            .unwrap_err();
        assert_eq!(err.kind_name(), "browser_error");
    }

    #[tokio::test]
    async fn done_action_reports_effect_without_calling_browser() {
        let fake = Arc::new(FakeBrowserController::new(vec![]));
        let browser: Arc<dyn BrowserController> = fake;
        let summary = summary_with(0, true, true);
        let secrets = SecretMap::new();
        let action = ActionKind::Done {
            success: true,
            text: Some("ok".to_string()),
        };
        let effect = execute_action(&browser, &secrets, &summary, &action)
            .await
            .unwrap();
        assert!(matches!(effect, ActionEffect::Done { success: true, .. }));
    }
}
