//! The closed action-kind model (§6).

use serde::{Deserialize, Serialize};

/// The closed set of action kinds (§6). Selector-oriented variants carry
/// an `index` into the current DOM selector map; non-selector variants do
/// not address a specific element.
///
/// Serializes as the single-key tagged object the rest of the system
/// expects: `{"click_element_by_index": {"index": 3}}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    // --- selector-oriented: REQUIRE dom_element_data ---
    ClickElementByIndex { index: u32 },
    InputText { index: u32, text: String },
    GetDropdownOptions { index: u32 },
    SelectDropdownOption { index: u32, value: String },
    DragDrop { index: u32, target_index: u32 },

    // --- non-selector ---
    GoToUrl { url: String },
    OpenNewTab { url: Option<String> },
    SwitchTab { tab_index: u32 },
    CloseTab { tab_index: u32 },
    Wait { seconds: f64 },
    ScrollUp { amount: Option<i32> },
    ScrollDown { amount: Option<i32> },
    PressKey { key: String },
    ExtractContent { goal: String },
    Done { success: bool, text: Option<String> },
}

impl ActionKind {
    /// True for the closed subset of action kinds that target a specific
    /// DOM element and therefore must carry `dom_element_data` (Invariant
    /// 2, Testable Property 1).
    pub fn is_selector_oriented(&self) -> bool {
        matches!(
            self,
            ActionKind::ClickElementByIndex { .. }
                | ActionKind::InputText { .. }
                | ActionKind::GetDropdownOptions { .. }
                | ActionKind::SelectDropdownOption { .. }
                | ActionKind::DragDrop { .. }
        )
    }

    /// The element-map index this action targets, if selector-oriented.
    pub fn element_index(&self) -> Option<u32> {
        match self {
            ActionKind::ClickElementByIndex { index } => Some(*index),
            ActionKind::InputText { index, .. } => Some(*index),
            ActionKind::GetDropdownOptions { index } => Some(*index),
            ActionKind::SelectDropdownOption { index, .. } => Some(*index),
            ActionKind::DragDrop { index, .. } => Some(*index),
            _ => None,
        }
    }

    /// A short machine-stable name for logging, matching the JSON tag.
    pub fn kind_name(&self) -> &'static str {
        match self {
            ActionKind::ClickElementByIndex { .. } => "click_element_by_index",
            ActionKind::InputText { .. } => "input_text",
            ActionKind::GetDropdownOptions { .. } => "get_dropdown_options",
            ActionKind::SelectDropdownOption { .. } => "select_dropdown_option",
            ActionKind::DragDrop { .. } => "drag_drop",
            ActionKind::GoToUrl { .. } => "go_to_url",
            ActionKind::OpenNewTab { .. } => "open_new_tab",
            ActionKind::SwitchTab { .. } => "switch_tab",
            ActionKind::CloseTab { .. } => "close_tab",
            ActionKind::Wait { .. } => "wait",
            ActionKind::ScrollUp { .. } => "scroll_up",
            ActionKind::ScrollDown { .. } => "scroll_down",
            ActionKind::PressKey { .. } => "press_key",
            ActionKind::ExtractContent { .. } => "extract_content",
            ActionKind::Done { .. } => "done",
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, ActionKind::Done { .. })
    }
}
