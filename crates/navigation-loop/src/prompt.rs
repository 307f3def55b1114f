//! Rendering a [`BrowserStateSummary`] into the text blob sent to the LLM
//! (§4.4 step 2), and parsing a completed `done` action's free-text
//! payload into the output-schema-shaped `extracted_data` map.

use std::collections::BTreeMap;

use soulbrowser_core_types::BrowserStateSummary;

/// Render the indexed DOM summary the way the teacher's agent loop does
/// (`agent_loop::element_tree`): one line per selector-map entry, index
/// first so the LLM can reference it back in `index` action params.
pub fn render_dom_summary(summary: &BrowserStateSummary) -> String {
    let mut out = format!("URL: {}\nTitle: {}\n\n", summary.url, summary.title);
    for (index, node) in &summary.selector_map {
        let text = node.text.as_deref().unwrap_or("");
        out.push_str(&format!(
            "[{index}] <{}> {}{}\n",
            node.tag_name,
            text,
            if node.is_visible { "" } else { " (hidden)" }
        ));
    }
    out
}

/// Resolve a `done` action's free-text payload against an output schema
/// (SPEC_FULL §9 open-question resolution, recorded in `DESIGN.md`):
/// when an output schema is present, the text is first tried as a JSON
/// object whose keys intersect the schema; if that fails and the schema
/// has exactly one key, the raw text is stored under that key; otherwise
/// no data is extracted and the caller should log a warning.
pub fn resolve_extracted_data(
    output_schema: &BTreeMap<String, String>,
    done_text: Option<&str>,
) -> BTreeMap<String, String> {
    let Some(text) = done_text else {
        return BTreeMap::new();
    };
    if output_schema.is_empty() {
        return BTreeMap::new();
    }

    if let Ok(serde_json::Value::Object(obj)) = serde_json::from_str::<serde_json::Value>(text) {
        let mut extracted = BTreeMap::new();
        for key in output_schema.keys() {
            if let Some(value) = obj.get(key) {
                let rendered = match value {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                extracted.insert(key.clone(), rendered);
            }
        }
        if !extracted.is_empty() {
            return extracted;
        }
    }

    if output_schema.len() == 1 {
        let key = output_schema.keys().next().unwrap().clone();
        return BTreeMap::from([(key, text.to_string())]);
    }

    BTreeMap::new()
}
