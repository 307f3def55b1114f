//! Per-run configuration for the Navigation Loop (§4.4, SPEC_FULL "ambient
//! interfaces added by this expansion" — `EngineConfig`'s navigation-loop
//! slice). No global/ambient state: every entry point takes this struct
//! explicitly (§9 design note).

use std::time::Duration;

/// Knobs the Navigation Loop needs for one run. A subset of the
/// workspace-wide `EngineConfig` (see `orchestrator`), scoped to what C4
/// itself consumes.
#[derive(Clone, Debug)]
pub struct NavigationLoopConfig {
    /// §4.4 step 5: terminate with `budget_exhausted` if no `done` by
    /// this many steps.
    pub max_steps: u32,
    /// §4.4 step 3: cap on actions executed per decided batch, mirroring
    /// the teacher's `max_actions_per_step`.
    pub max_actions_per_step: u32,
    /// §7 propagation policy: bounded retry for an unparseable
    /// structured LLM response.
    pub llm_parse_retry_limit: u32,
    /// §5: bounded timeout for one LLM decision call.
    pub llm_timeout: Duration,
    /// §5: bounded timeout for one browser action.
    pub browser_action_timeout: Duration,
}

impl Default for NavigationLoopConfig {
    fn default() -> Self {
        Self {
            max_steps: 50,
            max_actions_per_step: 10,
            llm_parse_retry_limit: 2,
            llm_timeout: Duration::from_secs(30),
            browser_action_timeout: Duration::from_secs(30),
        }
    }
}

impl NavigationLoopConfig {
    /// A reduced-budget configuration for a healing sub-run (§4.5 healing
    /// transition step 3: "a reduced budget").
    pub fn reduced_for_healing(&self, max_steps: u32) -> Self {
        Self {
            max_steps,
            ..self.clone()
        }
    }
}
