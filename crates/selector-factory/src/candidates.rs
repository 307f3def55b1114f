//! The ordered candidate-generation algorithm (§4.1).

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;

use crate::dom::{
    count_by_class_contains, count_by_id, count_by_name, count_by_nth_of_type,
    count_by_placeholder, count_by_text, ElementDescriptor,
};

const PLACEHOLDER_MAX_LEN: usize = 100;
const TEXT_MAX_LEN: usize = 50;

static SELECTOR_SAFE_CLASS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("static regex is valid"));

fn quote_escape_ok(value: &str) -> bool {
    !value.contains('\'')
}

/// Ordered, unique-on-the-page relative XPath candidates for `desc`,
/// following the six-step algorithm verbatim.
pub fn generate(doc: &Html, desc: &ElementDescriptor) -> Vec<String> {
    let tag = desc.tag_name.as_str();
    let mut candidates = Vec::new();

    // 1. id
    if let Some(id) = &desc.id {
        if quote_escape_ok(id) && count_by_id(doc, tag, id) == 1 {
            candidates.push(format!("//{tag}[@id='{id}']"));
        }
    }

    // 2. name
    if let Some(name) = &desc.name_attr {
        if quote_escape_ok(name) && count_by_name(doc, tag, name) == 1 {
            candidates.push(format!("//{tag}[@name='{name}']"));
        }
    }

    // 3. placeholder
    if let Some(placeholder) = &desc.placeholder {
        if placeholder.len() < PLACEHOLDER_MAX_LEN
            && quote_escape_ok(placeholder)
            && count_by_placeholder(doc, tag, placeholder) == 1
        {
            candidates.push(format!("//{tag}[@placeholder='{placeholder}']"));
        }
    }

    // 4a. first-class-only
    if let Some(first_class) = desc.classes.first() {
        if SELECTOR_SAFE_CLASS.is_match(first_class)
            && count_by_class_contains(doc, tag, first_class) == 1
        {
            candidates.push(format!("//{tag}[contains(@class,'{first_class}')]"));
        }
    }

    // 4b. full-class-combination
    if desc.classes.len() > 1 && desc.classes.iter().all(|c| SELECTOR_SAFE_CLASS.is_match(c)) {
        let full = desc.classes.join(" ");
        if count_by_class_contains(doc, tag, &full) == 1 {
            candidates.push(format!("//{tag}[contains(@class,'{full}')]"));
        }
    }

    // 5. text
    if !desc.own_text.is_empty()
        && desc.own_text.len() < TEXT_MAX_LEN
        && quote_escape_ok(&desc.own_text)
        && count_by_text(doc, tag, &desc.own_text) == 1
    {
        candidates.push(format!("//{tag}[normalize-space()='{}']", desc.own_text));
    }

    // 6. positional fallback
    if count_by_nth_of_type(doc, tag, desc.nth_of_type) == 1 {
        candidates.push(format!("//{tag}[{}]", desc.nth_of_type));
    }

    candidates
}
