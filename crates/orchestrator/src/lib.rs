//! Orchestrator: the top-level glue crate. Wires the Traversal Store
//! (C3), Navigation Loop (C4), Replay + Healing (C5) and Pipeline DAG
//! Runner (C6) behind one explicit [`EngineConfig`] and two standalone
//! entry points (`run_navigation`, `run_replay`), each of which records
//! its outcome to Run-History (C7). Pipeline execution is exposed
//! directly from `pipeline-runner` — see the re-exports below — since
//! that crate already owns the full build-then-execute flow end to end.

mod config;
mod navigate;
mod replay;

pub use config::EngineConfig;
pub use navigate::{run_navigation, NavigationRequest};
pub use replay::{auto_continue_gate, run_replay};

// Re-exported so a host only needs to depend on `orchestrator` to reach
// every top-level capability described in SPEC_FULL §6.
pub use pipeline_runner::{
    build_plan, BrowserClientFactory, ClientStrategy, ExecutionPlan, NoTaskRefs, PipelineOutcome,
    PipelineRunner, ResolvedNode, TaskResolver,
};
pub use replay_healing::{AutoContinue, ReplayConfig, ReplayOutcome, StepGate};
pub use run_history::{RunHistory, RunHistoryStore};
