//! Pipeline DAG Runner (C6): resolve task sources, validate I/O schema
//! compatibility, topologically order nodes (Kahn's algorithm), and
//! execute each node's Navigation Loop with per-task client isolation,
//! propagating extracted outputs from parents to children (§4.6).

mod client_factory;
mod plan;
mod resolver;
mod runner;
mod toposort;

pub use client_factory::{BrowserClientFactory, ClientStrategy};
pub use plan::{build_plan, ExecutionPlan, ResolvedNode};
pub use resolver::{NoTaskRefs, TaskResolver};
pub use runner::{PipelineOutcome, PipelineRunner};
pub use toposort::topo_sort;
