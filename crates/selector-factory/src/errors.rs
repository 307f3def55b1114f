use thiserror::Error;

/// Internal failures of the selector factory. Per §4.1's failure mode,
/// callers never see this type directly: [`crate::generate_candidates`]
/// converts any error into an empty candidate list.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SelectorFactoryError {
    #[error("page HTML could not be parsed")]
    UnparsableHtml,

    #[error("full xpath did not resolve to an element: {0}")]
    UnresolvedXPath(String),

    #[error("full xpath segment was malformed: {0}")]
    MalformedXPath(String),
}
