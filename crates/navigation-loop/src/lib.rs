//! Navigation Loop (C4): drives one browser-automation run end to end —
//! perceive, decide via the LLM, enrich and durably record, execute, and
//! stop on `done`, budget exhaustion or cancellation (§4.4).

mod cancellation;
mod config;
mod controller;
mod executor;
mod prompt;

#[cfg(any(test, feature = "test-harness"))]
pub mod testing;
#[cfg(not(any(test, feature = "test-harness")))]
mod testing;

pub use cancellation::CancellationToken;
pub use config::NavigationLoopConfig;
pub use controller::{NavigationLoop, NavigationOutcome};
pub use executor::{execute_action, ActionEffect};
pub use prompt::{render_dom_summary, resolve_extracted_data};
