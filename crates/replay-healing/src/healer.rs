//! §4.5 healing transition: a one-time-per-action escape hatch handing
//! control to the Navigation Loop with a reduced budget. Grounded in the
//! teacher's `action-locator::healer::DefaultSelfHealer` — same one-time
//! heal limit via a `HashSet`, same "try, mark, return an outcome rather
//! than an error" shape.

use std::collections::HashSet;
use std::sync::Mutex;

use soulbrowser_core_types::ActionKey;

/// What happened when healing was attempted for one action.
#[derive(Debug)]
pub enum HealOutcome {
    Healed,
    /// Healing was attempted but the sub-run never reached `done`.
    Exhausted,
    /// Healing was not attempted because this action already consumed
    /// its one-time allowance, or healing is disabled.
    Skipped { reason: String },
}

/// Tracks which actions have already consumed their one healing attempt
/// (§4.5: healing is invoked at most once per failing action).
pub struct HealLedger {
    healed: Mutex<HashSet<String>>,
}

impl HealLedger {
    pub fn new() -> Self {
        Self {
            healed: Mutex::new(HashSet::new()),
        }
    }

    pub fn is_available(&self, action_key: &ActionKey) -> bool {
        !self.healed.lock().unwrap().contains(&action_key.0)
    }

    pub fn mark_healed(&self, action_key: &ActionKey) {
        self.healed.lock().unwrap().insert(action_key.0.clone());
    }
}

impl Default for HealLedger {
    fn default() -> Self {
        Self::new()
    }
}
