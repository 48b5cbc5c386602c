use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use crate::snapshot::Snapshot;
use crate::snapshot::SnapshotId;
use crate::snapshot::SnapshotOrigin;

/// Stage of the edit session.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, strum_macros::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Phase {
    /// Nothing loaded.
    #[default]
    Idle,
    /// A snapshot is current and the user can type an instruction.
    Editing,
    /// An edit request is outstanding.
    Processing,
    /// A generated candidate is waiting to be accepted.
    Viewing,
}

impl Phase {
    /// Whether a new edit submission may start from this phase.
    pub fn accepts_submission(self) -> bool {
        !matches!(self, Phase::Processing)
    }
}

/// One row of the history sidebar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntryView {
    pub index: usize,
    pub id: SnapshotId,
    pub label: String,
    pub media_type: String,
    pub size_bytes: usize,
    pub created_at: DateTime<Utc>,
    pub origin: SnapshotOrigin,
    pub is_current: bool,
}

impl HistoryEntryView {
    pub fn new(index: usize, snapshot: &Snapshot, is_current: bool) -> Self {
        let label = if index == 0 {
            "Original Upload".to_string()
        } else {
            format!("Edit #{index}")
        };
        Self {
            index,
            id: snapshot.id(),
            label,
            media_type: snapshot.media_type().to_string(),
            size_bytes: snapshot.payload().len(),
            created_at: snapshot.created_at(),
            origin: snapshot.origin(),
            is_current,
        }
    }
}

/// Summary of the pending generated result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateView {
    pub id: SnapshotId,
    pub media_type: String,
    pub size_bytes: usize,
    /// Snapshot the candidate was generated from (the "before" side).
    pub source_id: SnapshotId,
}

/// Read-only projection of a session for rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionView {
    pub phase: Phase,
    pub history: Vec<HistoryEntryView>,
    /// Index of the current entry, or -1 when nothing is loaded.
    pub cursor: isize,
    pub can_undo: bool,
    pub can_redo: bool,
    pub candidate: Option<CandidateView>,
    pub prompt: String,
    pub error: Option<String>,
    pub suggestions: Vec<String>,
    pub loading_suggestions: bool,
}

impl SessionView {
    pub fn current(&self) -> Option<&HistoryEntryView> {
        self.history.iter().find(|entry| entry.is_current)
    }

    /// Header title for the current screen.
    pub fn title(&self) -> &'static str {
        match (self.current(), &self.candidate) {
            (None, _) => "Dashboard",
            (Some(_), Some(_)) => "Comparison",
            (Some(_), None) => "Edit Mode",
        }
    }
}
