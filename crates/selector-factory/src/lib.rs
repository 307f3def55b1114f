//! Selector Factory (C1): from a full element XPath and the page HTML at
//! the moment of observation, derive an ordered list of relative XPath
//! candidates robust to small DOM perturbations.
//!
//! A full absolute XPath is brittle — any ancestor insertion breaks it.
//! Several relative anchors (id, name, placeholder, class, text, nth-of-
//! type position) give replay (C5) multiple chances before giving up.

mod candidates;
mod dom;
mod errors;

pub use errors::SelectorFactoryError;

use tracing::{debug, warn};

/// Derive ordered, best-first relative XPath candidates for the element
/// addressed by `full_xpath` within `html`.
///
/// Per §4.1's failure mode, any internal error (unparsable HTML,
/// unresolvable xpath) yields an empty list rather than propagating —
/// callers MUST tolerate empty alternatives.
pub fn generate_candidates(full_xpath: &str, html: &str) -> Vec<String> {
    let doc = dom::parse_document(html);
    let element = match dom::resolve_absolute_xpath(&doc, full_xpath) {
        Ok(el) => el,
        Err(err) => {
            warn!(xpath = %full_xpath, error = %err, "selector factory: xpath did not resolve, returning no alternatives");
            return Vec::new();
        }
    };

    let descriptor = dom::describe(&element);
    let result = candidates::generate(&doc, &descriptor);
    debug!(
        xpath = %full_xpath,
        candidate_count = result.len(),
        "selector factory: generated relative xpath candidates"
    );
    result
}

/// Strategy-pipeline view of the same algorithm, useful when a caller wants
/// to test or reuse an individual candidate strategy in isolation (§9
/// design note: "represent the ordered strategy list ... as an enum-driven
/// pipeline").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CandidateStrategy {
    Id,
    Name,
    Placeholder,
    FirstClass,
    FullClassCombination,
    Text,
    NthOfType,
}

impl CandidateStrategy {
    pub const ORDER: [CandidateStrategy; 7] = [
        CandidateStrategy::Id,
        CandidateStrategy::Name,
        CandidateStrategy::Placeholder,
        CandidateStrategy::FirstClass,
        CandidateStrategy::FullClassCombination,
        CandidateStrategy::Text,
        CandidateStrategy::NthOfType,
    ];
}
