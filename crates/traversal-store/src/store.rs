//! Traversal Store (C3): owns the current traversal in memory, and makes
//! every mutation durable via incremental atomic writes before returning
//! control to the caller (§4.3, Invariant 4).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use soulbrowser_core_types::{
    BrainState, BrowserConfig, ExtendedAction, IoSchema, RunId, Traversal, TraversalStatus,
};
use tracing::{debug, info};

use crate::errors::TraversalStoreError;
use crate::layout;
use crate::observer::{NoopObserver, ProgressObserver, TraversalEvent};

/// Everything needed to start a new traversal (§4.3 `start(meta)`).
#[derive(Clone, Debug)]
pub struct TraversalMeta {
    pub test_case: String,
    pub extra_instructions: Vec<String>,
    pub browser_config: BrowserConfig,
    pub secret_names: Vec<String>,
    pub io_schema: Option<IoSchema>,
}

/// A run's traversal, backed by a directory on disk. Every mutating call
/// serializes the whole current traversal to a temp file and renames it
/// over the final path before returning (Invariant 4): a reader never
/// observes a torn write.
pub struct TraversalStore {
    dir: PathBuf,
    run_id: RunId,
    started_at: chrono::DateTime<Utc>,
    traversal: Traversal,
    observer: Arc<dyn ProgressObserver>,
}

impl TraversalStore {
    /// Begin a new traversal for `run_id`, rooted at `dir`. Performs the
    /// first durable write immediately so a crash right after `start`
    /// still leaves a valid (empty, in-progress) traversal file on disk.
    pub fn start(
        dir: impl Into<PathBuf>,
        run_id: RunId,
        meta: TraversalMeta,
    ) -> Result<Self, TraversalStoreError> {
        Self::start_with_observer(dir, run_id, meta, Arc::new(NoopObserver))
    }

    pub fn start_with_observer(
        dir: impl Into<PathBuf>,
        run_id: RunId,
        meta: TraversalMeta,
        observer: Arc<dyn ProgressObserver>,
    ) -> Result<Self, TraversalStoreError> {
        let traversal = Traversal::new(
            meta.test_case,
            meta.extra_instructions,
            meta.browser_config,
            meta.secret_names,
            meta.io_schema,
        );
        let mut store = Self {
            dir: dir.into(),
            run_id,
            started_at: Utc::now(),
            traversal,
            observer,
        };
        store.persist()?;
        store.observer.on_event(TraversalEvent::Started);
        info!(run_id = %store.run_id, path = %store.path().display(), "traversal store: started");
        Ok(store)
    }

    pub fn run_id(&self) -> &RunId {
        &self.run_id
    }

    pub fn path(&self) -> PathBuf {
        layout::traversal_path(&self.dir, self.started_at, &self.run_id)
    }

    pub fn screenshot_dir(&self) -> PathBuf {
        layout::screenshot_dir(&self.dir, &self.run_id)
    }

    pub fn traversal(&self) -> &Traversal {
        &self.traversal
    }

    pub fn append_brain_state(&mut self, state: BrainState) -> Result<(), TraversalStoreError> {
        let id = state.id.clone();
        self.traversal.append_brain_state(state)?;
        self.persist()?;
        debug!(run_id = %self.run_id, brain_state_id = %id, "traversal store: appended brain state");
        self.observer
            .on_event(TraversalEvent::BrainStateAppended(id));
        Ok(())
    }

    pub fn append_action(
        &mut self,
        action: ExtendedAction,
    ) -> Result<soulbrowser_core_types::ActionKey, TraversalStoreError> {
        let key = self.traversal.append_action(action)?;
        self.persist()?;
        debug!(run_id = %self.run_id, action_key = %key, "traversal store: appended action");
        self.observer.on_event(TraversalEvent::ActionAppended(key.clone()));
        Ok(key)
    }

    pub fn set_extracted(&mut self, data: BTreeMap<String, String>) -> Result<(), TraversalStoreError> {
        self.traversal.set_extracted(data);
        self.persist()?;
        self.observer.on_event(TraversalEvent::ExtractedDataSet);
        Ok(())
    }

    pub fn seal(&mut self, status: TraversalStatus) -> Result<(), TraversalStoreError> {
        self.traversal.seal(status);
        self.persist()?;
        info!(run_id = %self.run_id, status = ?status, "traversal store: sealed");
        self.observer.on_event(TraversalEvent::Sealed(status));
        Ok(())
    }

    fn persist(&self) -> Result<(), TraversalStoreError> {
        let bytes = serde_json::to_vec_pretty(&self.traversal).map_err(TraversalStoreError::Serialize)?;
        soulbrowser_core_types::write_atomic(&self.path(), &bytes).map_err(TraversalStoreError::Io)
    }
}

/// Outcome of attempting to read a traversal file that may still be
/// mid-write (Invariant 4 / Testable Property 3).
pub enum ReadOutcome {
    Complete(Traversal),
    /// The file could not be parsed as JSON; per Invariant 4 this must be
    /// treated as "a writer is mid-append", not a corruption — callers
    /// should retry rather than erroring.
    InProgress,
}

/// Read a traversal file, tolerating transient parse failures from a
/// concurrent writer (§4.3 durability note, Testable Property 3).
pub fn read_traversal(path: &Path) -> Result<ReadOutcome, TraversalStoreError> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(ReadOutcome::InProgress),
        Err(err) => return Err(TraversalStoreError::Read(err)),
    };
    match serde_json::from_slice::<Traversal>(&bytes) {
        Ok(traversal) => Ok(ReadOutcome::Complete(traversal)),
        Err(_) => Ok(ReadOutcome::InProgress),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use soulbrowser_core_types::{ActionKind, BrainStateId};
    use std::sync::Mutex;

    fn meta() -> TraversalMeta {
        TraversalMeta {
            test_case: "open example.org".to_string(),
            extra_instructions: vec![],
            browser_config: BrowserConfig::desktop_default(),
            secret_names: vec![],
            io_schema: None,
        }
    }

    #[test]
    fn start_writes_a_readable_file_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let store = TraversalStore::start(dir.path(), RunId::new(), meta()).unwrap();
        let outcome = read_traversal(&store.path()).unwrap();
        assert!(matches!(outcome, ReadOutcome::Complete(_)));
    }

    #[test]
    fn append_action_persists_before_returning() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = TraversalStore::start(dir.path(), RunId::new(), meta()).unwrap();
        store
            .append_brain_state(BrainState {
                id: BrainStateId::from_ordinal(1),
                evaluation_previous_goal: "n/a".to_string(),
                memory: String::new(),
                next_goal: "go".to_string(),
            })
            .unwrap();
        store
            .append_action(ExtendedAction {
                brain_state_id: BrainStateId::from_ordinal(1),
                action: ActionKind::GoToUrl {
                    url: "https://example.org".to_string(),
                },
                dom_element_data: None,
                screenshot_filename: None,
            })
            .unwrap();

        let outcome = read_traversal(&store.path()).unwrap();
        match outcome {
            ReadOutcome::Complete(t) => assert_eq!(t.actions.len(), 1),
            ReadOutcome::InProgress => panic!("expected a complete file"),
        }
    }

    #[test]
    fn read_traversal_of_missing_file_is_in_progress_not_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        let outcome = read_traversal(&missing).unwrap();
        assert!(matches!(outcome, ReadOutcome::InProgress));
    }

    #[test]
    fn read_traversal_of_garbage_is_in_progress_not_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.json");
        std::fs::write(&path, b"{not valid json").unwrap();
        let outcome = read_traversal(&path).unwrap();
        assert!(matches!(outcome, ReadOutcome::InProgress));
    }

    struct RecordingObserver(Mutex<Vec<String>>);

    impl ProgressObserver for RecordingObserver {
        fn on_event(&self, event: TraversalEvent) {
            self.0.lock().unwrap().push(format!("{event:?}"));
        }
    }

    #[test]
    fn observer_receives_one_event_per_mutation() {
        let dir = tempfile::tempdir().unwrap();
        let observer = Arc::new(RecordingObserver(Mutex::new(Vec::new())));
        let mut store = TraversalStore::start_with_observer(
            dir.path(),
            RunId::new(),
            meta(),
            observer.clone(),
        )
        .unwrap();
        store
            .append_brain_state(BrainState {
                id: BrainStateId::from_ordinal(1),
                evaluation_previous_goal: "n/a".to_string(),
                memory: String::new(),
                next_goal: "go".to_string(),
            })
            .unwrap();
        store.seal(TraversalStatus::Success).unwrap();

        let events = observer.0.lock().unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0], "Started");
        assert!(events[2].starts_with("Sealed"));
    }
}
