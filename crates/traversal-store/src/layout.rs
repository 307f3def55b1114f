//! File-naming conventions for traversals and their screenshots (§4.3
//! "Identifiers", §6 "Traversal file (produced)").

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use soulbrowser_core_types::RunId;

/// `traverse_<YYYYMMDD>_<HHMMSS>_<run_id>.json`, as specified in §6.
pub fn traversal_file_name(started_at: DateTime<Utc>, run_id: &RunId) -> String {
    format!(
        "traverse_{}_{}.json",
        started_at.format("%Y%m%d_%H%M%S"),
        run_id
    )
}

pub fn traversal_path(dir: &Path, started_at: DateTime<Utc>, run_id: &RunId) -> PathBuf {
    dir.join(traversal_file_name(started_at, run_id))
}

/// Screenshots for a run live in a subdirectory named after the run-id
/// (§4.3). Each screenshot's filename encodes the action's ordinal and
/// kind so it can be matched back to its `ExtendedAction` by inspection.
pub fn screenshot_dir(dir: &Path, run_id: &RunId) -> PathBuf {
    dir.join(format!("run_{run_id}"))
}

pub fn screenshot_file_name(action_ordinal: u32, action_kind: &str) -> String {
    format!("{action_ordinal:04}_{action_kind}.png")
}

pub fn screenshot_path(dir: &Path, run_id: &RunId, action_ordinal: u32, action_kind: &str) -> PathBuf {
    screenshot_dir(dir, run_id).join(screenshot_file_name(action_ordinal, action_kind))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn traversal_file_name_matches_spec_shape() {
        let started_at = Utc.with_ymd_and_hms(2026, 7, 29, 14, 30, 5).unwrap();
        let run_id = RunId("abc123".to_string());
        let name = traversal_file_name(started_at, &run_id);
        assert_eq!(name, "traverse_20260729_143005_abc123.json");
    }

    #[test]
    fn screenshot_file_name_encodes_ordinal_and_kind() {
        assert_eq!(
            screenshot_file_name(3, "click_element_by_index"),
            "0003_click_element_by_index.png"
        );
    }
}
