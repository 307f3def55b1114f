//! Replay + Healing (C5): deterministic re-execution of a sealed
//! [`soulbrowser_core_types::Traversal`] with a selector-fallback locator
//! chain and one-time-per-action LLM-assisted healing (§4.5).

mod healer;
mod locator;
mod replay;

pub use healer::{HealLedger, HealOutcome};
pub use locator::{locate, LocateOutcome, LocatorStrategy};
pub use replay::{AutoContinue, ReplayConfig, ReplayOutcome, ReplayRunner, StepGate};
