//! Minimal DOM-walking helpers built on `scraper`, scoped to exactly what
//! the candidate-generation algorithm (§4.1) needs: resolving an absolute
//! XPath to an element, describing that element, and counting how many
//! elements in the document satisfy a given candidate predicate.

use scraper::{ElementRef, Html};

use crate::errors::SelectorFactoryError;

/// Everything the candidate generator needs to know about the element an
/// absolute XPath resolved to.
#[derive(Debug, Clone)]
pub struct ElementDescriptor {
    pub tag_name: String,
    pub id: Option<String>,
    pub name_attr: Option<String>,
    pub placeholder: Option<String>,
    pub classes: Vec<String>,
    pub own_text: String,
    /// 1-based position among same-tag siblings under the same parent.
    pub nth_of_type: u32,
}

pub fn parse_document(html: &str) -> Html {
    Html::parse_document(html)
}

/// Resolve a `/html/body/div[2]/button[1]`-style absolute XPath against a
/// parsed document. Only the narrow `tag` / `tag[N]` step grammar produced
/// by this crate's own generator (and expected of upstream full-xpath
/// input) is supported; anything else is rejected.
pub fn resolve_absolute_xpath<'a>(
    doc: &'a Html,
    xpath: &str,
) -> Result<ElementRef<'a>, SelectorFactoryError> {
    let segments: Vec<&str> = xpath.trim().split('/').filter(|s| !s.is_empty()).collect();
    let mut iter = segments.into_iter();

    let first = iter
        .next()
        .ok_or_else(|| SelectorFactoryError::UnresolvedXPath(xpath.to_string()))?;
    let (root_tag, _) = parse_segment(first)?;
    let mut current = doc.root_element();
    if current.value().name() != root_tag {
        return Err(SelectorFactoryError::UnresolvedXPath(xpath.to_string()));
    }

    for seg in iter {
        let (tag, want_idx) = parse_segment(seg)?;
        let matching: Vec<ElementRef<'a>> = current
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|e| e.value().name() == tag)
            .collect();
        let want = want_idx.unwrap_or(1);
        if want == 0 || want > matching.len() {
            return Err(SelectorFactoryError::UnresolvedXPath(xpath.to_string()));
        }
        current = matching[want - 1];
    }

    Ok(current)
}

fn parse_segment(segment: &str) -> Result<(&str, Option<usize>), SelectorFactoryError> {
    if let Some(open) = segment.find('[') {
        if !segment.ends_with(']') {
            return Err(SelectorFactoryError::MalformedXPath(segment.to_string()));
        }
        let tag = &segment[..open];
        let idx_str = &segment[open + 1..segment.len() - 1];
        let idx = idx_str
            .parse::<usize>()
            .map_err(|_| SelectorFactoryError::MalformedXPath(segment.to_string()))?;
        Ok((tag, Some(idx)))
    } else {
        Ok((segment, None))
    }
}

pub fn describe(element: &ElementRef) -> ElementDescriptor {
    let el = element.value();
    ElementDescriptor {
        tag_name: el.name().to_string(),
        id: el.id().map(|s| s.to_string()),
        name_attr: el.attr("name").map(|s| s.to_string()),
        placeholder: el.attr("placeholder").map(|s| s.to_string()),
        classes: el.classes().map(|c| c.to_string()).collect(),
        own_text: normalize_space(&element.text().collect::<String>()),
        nth_of_type: nth_of_type(element),
    }
}

fn nth_of_type(element: &ElementRef) -> u32 {
    let tag = element.value().name();
    let target_id = element.id();
    match element.parent().and_then(ElementRef::wrap) {
        Some(parent) => {
            let mut n = 0u32;
            for sibling in parent.children().filter_map(ElementRef::wrap) {
                if sibling.value().name() == tag {
                    n += 1;
                    if sibling.id() == target_id {
                        break;
                    }
                }
            }
            n.max(1)
        }
        None => 1,
    }
}

/// XPath `normalize-space()`: trim and collapse internal whitespace runs.
pub fn normalize_space(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn all_elements<'a>(doc: &'a Html) -> impl Iterator<Item = ElementRef<'a>> {
    doc.root_element().descendants().filter_map(ElementRef::wrap)
}

pub fn count_by_id(doc: &Html, tag: &str, id: &str) -> usize {
    all_elements(doc)
        .filter(|e| e.value().name() == tag && e.value().id() == Some(id))
        .count()
}

pub fn count_by_name(doc: &Html, tag: &str, name: &str) -> usize {
    all_elements(doc)
        .filter(|e| e.value().name() == tag && e.value().attr("name") == Some(name))
        .count()
}

pub fn count_by_placeholder(doc: &Html, tag: &str, placeholder: &str) -> usize {
    all_elements(doc)
        .filter(|e| e.value().name() == tag && e.value().attr("placeholder") == Some(placeholder))
        .count()
}

/// Mirrors XPath `contains(@class, needle)`: a literal substring check
/// against the raw `class` attribute value, not token membership.
pub fn count_by_class_contains(doc: &Html, tag: &str, needle: &str) -> usize {
    all_elements(doc)
        .filter(|e| {
            e.value().name() == tag
                && e.value()
                    .attr("class")
                    .map(|c| c.contains(needle))
                    .unwrap_or(false)
        })
        .count()
}

pub fn count_by_text(doc: &Html, tag: &str, text: &str) -> usize {
    all_elements(doc)
        .filter(|e| {
            e.value().name() == tag && normalize_space(&e.text().collect::<String>()) == text
        })
        .count()
}

pub fn count_by_nth_of_type(doc: &Html, tag: &str, n: u32) -> usize {
    all_elements(doc)
        .filter(|e| e.value().name() == tag && nth_of_type(e) == n)
        .count()
}
