//! End-to-end scenarios E2 (two-node pipeline with data flow), E3
//! (schema conflict) and E4 (cyclic DAG) from SPEC_FULL §8, driven
//! against the scripted `navigation-loop` test harness so no real
//! browser or LLM is required.

use std::collections::BTreeMap;
use std::sync::Arc;

use navigation_loop::testing::{FakeBrowserController, FakeLlmClient};
use navigation_loop::NavigationLoopConfig;
use pipeline_runner::{build_plan, ClientStrategy, NoTaskRefs, PipelineRunner};
use soulbrowser_core_types::{
    ActionKind, BrainStateId, BrowserStateSummary, LlmDecision, NodeId, OrchestratorError,
    PipelineNode, TaskSource, TaskSpec,
};

fn done_decision(text: &str) -> LlmDecision {
    LlmDecision {
        current_state: soulbrowser_core_types::BrainState {
            id: BrainStateId::from_ordinal(1),
            evaluation_previous_goal: "n/a".to_string(),
            memory: String::new(),
            next_goal: "finish".to_string(),
        },
        action: vec![ActionKind::Done {
            success: true,
            text: Some(text.to_string()),
        }],
    }
}

fn empty_summary() -> BrowserStateSummary {
    BrowserStateSummary {
        url: "https://example.org".to_string(),
        title: "Example".to_string(),
        ..Default::default()
    }
}

fn runner_with_llm(llm: Arc<FakeLlmClient>) -> (PipelineRunner, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let traversal_dir = dir.path().join("traversals");
    let history_dir = dir.path().join("history");
    let runner = PipelineRunner {
        llm,
        clients: ClientStrategy::Shared(Arc::new(FakeBrowserController::new(vec![empty_summary()]))),
        loop_config: NavigationLoopConfig::default(),
        traversal_base_dir: traversal_dir,
        history_base_dir: history_dir,
    };
    (runner, dir)
}

fn spec(output: &[(&str, &str)], input: &[(&str, &str)]) -> TaskSpec {
    let mut spec = TaskSpec::inline("do the thing");
    spec.output_schema = output.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    spec.input_schema = input.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    spec
}

#[tokio::test]
async fn e2_two_node_pipeline_propagates_extracted_data() {
    let llm = Arc::new(FakeLlmClient::new(vec![
        Ok(done_decision("buy-milk")),
        Ok(done_decision("ack")),
    ]));
    let (runner, _dir) = runner_with_llm(llm);

    let a = PipelineNode::new(
        "a",
        TaskSource::Inline(spec(&[("SELECTED", "item to buy")], &[])),
    );
    let b = PipelineNode::new(
        "b",
        TaskSource::Inline(spec(&[], &[("SELECTED", "item to buy")])),
    )
    .with_parents([NodeId::from("a")]);

    let plan = build_plan(vec![a, b], &NoTaskRefs).await.unwrap();
    let outcome = runner.run_plan(&plan, &BTreeMap::new()).await.unwrap();

    assert_eq!(outcome.order, vec![NodeId::from("a"), NodeId::from("b")]);
    assert!(outcome.all_succeeded());
    let a_result = &outcome.results[&NodeId::from("a")];
    assert_eq!(a_result.extracted_data.get("SELECTED"), Some(&"buy-milk".to_string()));
}

#[tokio::test]
async fn e3_schema_conflict_aborts_before_child_starts() {
    let llm = Arc::new(FakeLlmClient::new(vec![
        Ok(done_decision("1")),
        Ok(done_decision("2")),
    ]));
    let (runner, _dir) = runner_with_llm(llm);

    let a = PipelineNode::new("a", TaskSource::Inline(spec(&[("X", "d")], &[])));
    let b = PipelineNode::new("b", TaskSource::Inline(spec(&[("X", "d")], &[])));
    let c = PipelineNode::new("c", TaskSource::Inline(spec(&[], &[("X", "d")])))
        .with_parents([NodeId::from("a"), NodeId::from("b")]);

    let plan = build_plan(vec![a, b, c], &NoTaskRefs).await.unwrap();
    let (error, outcome) = runner.run_plan(&plan, &BTreeMap::new()).await.unwrap_err();

    assert_eq!(error.kind_name(), "dependency_conflict");
    assert!(!outcome.results.contains_key(&NodeId::from("c")));
}

#[tokio::test]
async fn e4_cyclic_dag_is_rejected_with_zero_nodes_executed() {
    let a = PipelineNode::new("a", TaskSource::Inline(TaskSpec::inline("a")))
        .with_parents([NodeId::from("b")]);
    let b = PipelineNode::new("b", TaskSource::Inline(TaskSpec::inline("b")))
        .with_parents([NodeId::from("a")]);

    let err = build_plan(vec![a, b], &NoTaskRefs).await.unwrap_err();
    assert!(matches!(err, OrchestratorError::CyclicDependency { .. }));
}
