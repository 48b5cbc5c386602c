//! The edit session state machine.
//!
//! `EditSession` owns the history, the phase, the pending candidate and the
//! derived UI state (prompt, error message, suggestion list). It never awaits:
//! the two network round trips are split into a `begin_*` step that hands out
//! a ticket and a `complete_*`/`apply_*` step that only takes effect if the
//! ticket is still current. `SessionHandle` in `driver` runs the requests in
//! between.

use std::sync::Arc;

use retouch_protocol::CandidateView;
use retouch_protocol::HistoryEntryView;
use retouch_protocol::ImagePayload;
use retouch_protocol::Phase;
use retouch_protocol::SessionView;
use retouch_protocol::Snapshot;
use retouch_protocol::SnapshotId;
use retouch_protocol::default_suggestions;

use crate::error::EditError;
use crate::error::SessionError;
use crate::error::ValidationError;
use crate::history::HistoryStore;
use crate::shortcuts::HistoryShortcut;

/// One outstanding edit submission.
#[derive(Debug, Clone)]
pub struct EditTicket {
    pub submission: u64,
    /// Snapshot the edit was requested against.
    pub source: SnapshotId,
    pub payload: Arc<ImagePayload>,
    pub instruction: String,
}

/// Result of finishing (or trying to start) a submission.
#[derive(Debug)]
pub enum SubmitOutcome {
    /// A submission is already outstanding; nothing was sent.
    Busy,
    /// The edit succeeded and its result is now the pending candidate.
    Candidate(SnapshotId),
    /// The edit failed; the message is now the session error.
    Failed(EditError),
    /// The session moved on (reset, navigation, new upload or a newer
    /// submission) before the response arrived; the result was dropped.
    Stale,
}

/// Snapshot whose suggestions should be fetched once the debounce settles.
#[derive(Debug, Clone)]
pub struct SuggestionRequest {
    pub generation: u64,
    pub snapshot_id: SnapshotId,
    pub payload: Arc<ImagePayload>,
}

/// What the driver should do about suggestions after an operation.
#[derive(Debug, Clone)]
pub enum SuggestionRefresh {
    Fetch(SuggestionRequest),
    /// The current snapshot went away; drop any pending refresh.
    Cancel,
}

#[derive(Debug, Clone)]
struct Candidate {
    snapshot: Snapshot,
    source: SnapshotId,
}

#[derive(Debug)]
pub struct EditSession {
    history: HistoryStore,
    phase: Phase,
    candidate: Option<Candidate>,
    prompt: String,
    error: Option<String>,
    suggestions: Vec<String>,
    loading_suggestions: bool,
    /// Id of the most recently started submission.
    submission: u64,
    /// Bumped whenever the current snapshot identity changes.
    refresh_generation: u64,
    pending_refresh: Option<SuggestionRefresh>,
}

impl Default for EditSession {
    fn default() -> Self {
        Self::new()
    }
}

impl EditSession {
    pub fn new() -> Self {
        Self {
            history: HistoryStore::new(),
            phase: Phase::Idle,
            candidate: None,
            prompt: String::new(),
            error: None,
            suggestions: default_suggestions(),
            loading_suggestions: false,
            submission: 0,
            refresh_generation: 0,
            pending_refresh: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn current(&self) -> Option<&Snapshot> {
        self.history.current()
    }

    pub fn candidate(&self) -> Option<&Snapshot> {
        self.candidate.as_ref().map(|c| &c.snapshot)
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn suggestions(&self) -> &[String] {
        &self.suggestions
    }

    pub fn loading_suggestions(&self) -> bool {
        self.loading_suggestions
    }

    pub fn refresh_generation(&self) -> u64 {
        self.refresh_generation
    }

    /// Start over from a freshly uploaded snapshot.
    ///
    /// Any pending candidate is discarded and an outstanding submission
    /// becomes stale. The prompt text is kept so users can type first and
    /// upload second.
    pub fn seed(&mut self, snapshot: Snapshot) {
        tracing::info!(
            id = %snapshot.id(),
            media_type = snapshot.media_type(),
            bytes = snapshot.payload().len(),
            "seeding session"
        );
        self.history.seed(snapshot);
        self.candidate = None;
        self.error = None;
        self.set_phase(Phase::Editing);
        self.current_changed();
    }

    pub fn set_prompt(&mut self, text: impl Into<String>) {
        self.prompt = text.into();
    }

    /// Submit the current prompt text.
    pub fn submit_prompt(&mut self) -> Result<Option<EditTicket>, ValidationError> {
        let instruction = self.prompt.clone();
        self.begin_submit(&instruction)
    }

    /// Validate and start an edit submission.
    ///
    /// Returns `Ok(None)` without side effects while another submission is
    /// outstanding. Validation failures set the error message and leave the
    /// phase untouched.
    pub fn begin_submit(&mut self, instruction: &str) -> Result<Option<EditTicket>, ValidationError> {
        if !self.phase.accepts_submission() {
            tracing::debug!("submission ignored while processing");
            return Ok(None);
        }

        let Some(current) = self.history.current() else {
            return Err(self.reject(ValidationError::MissingSnapshot));
        };
        let instruction = instruction.trim();
        if instruction.is_empty() {
            return Err(self.reject(ValidationError::EmptyInstruction));
        }

        self.submission += 1;
        let ticket = EditTicket {
            submission: self.submission,
            source: current.id(),
            payload: current.shared_payload(),
            instruction: instruction.to_string(),
        };

        self.prompt = ticket.instruction.clone();
        self.error = None;
        self.candidate = None;
        self.set_phase(Phase::Processing);
        tracing::info!(
            submission = ticket.submission,
            source = %ticket.source,
            "edit submitted"
        );
        Ok(Some(ticket))
    }

    /// Apply the response to `ticket`, unless the session has moved on.
    pub fn complete_submit(
        &mut self,
        ticket: &EditTicket,
        result: Result<ImagePayload, EditError>,
    ) -> SubmitOutcome {
        if self.phase != Phase::Processing || ticket.submission != self.submission {
            tracing::debug!(
                submission = ticket.submission,
                latest = self.submission,
                phase = %self.phase,
                "discarding stale edit response"
            );
            return SubmitOutcome::Stale;
        }

        match result {
            Ok(payload) => {
                let snapshot = Snapshot::generated(payload);
                let id = snapshot.id();
                self.candidate = Some(Candidate {
                    snapshot,
                    source: ticket.source,
                });
                self.set_phase(Phase::Viewing);
                SubmitOutcome::Candidate(id)
            }
            Err(err) => {
                tracing::warn!(kind = err.kind(), "edit failed: {err}");
                self.error = Some(err.to_string());
                self.set_phase(Phase::Editing);
                SubmitOutcome::Failed(err)
            }
        }
    }

    /// "Continue editing": commit the candidate and make it current.
    pub fn accept_candidate(&mut self) -> Result<SnapshotId, SessionError> {
        let candidate = self.candidate.take().ok_or(SessionError::NoCandidate)?;
        let id = candidate.snapshot.id();
        self.history.commit(candidate.snapshot);
        self.prompt.clear();
        self.error = None;
        self.set_phase(Phase::Editing);
        self.current_changed();
        Ok(id)
    }

    pub fn step_back(&mut self) -> bool {
        let moved = self.history.step_back();
        self.after_navigation(moved)
    }

    pub fn step_forward(&mut self) -> bool {
        let moved = self.history.step_forward();
        self.after_navigation(moved)
    }

    /// Sidebar selection. Selecting the entry that is already current does
    /// not move the cursor but still drops the pending candidate and error.
    pub fn jump_to(&mut self, index: usize) -> bool {
        if self.history.cursor() == Some(index) {
            self.leave_result_view();
            return false;
        }
        let moved = self.history.jump_to(index);
        self.after_navigation(moved)
    }

    pub fn apply_shortcut(&mut self, shortcut: HistoryShortcut) -> bool {
        match shortcut {
            HistoryShortcut::StepBack => self.step_back(),
            HistoryShortcut::StepForward => self.step_forward(),
        }
    }

    /// Back to an empty session with default suggestions.
    pub fn reset(&mut self) {
        tracing::info!("resetting session");
        self.history.reset();
        self.candidate = None;
        self.prompt.clear();
        self.error = None;
        self.suggestions = default_suggestions();
        self.set_phase(Phase::Idle);
        self.current_changed();
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    /// Hand the pending suggestion directive to the driver.
    pub fn take_suggestion_refresh(&mut self) -> Option<SuggestionRefresh> {
        self.pending_refresh.take()
    }

    /// Mark a debounced fetch as started. Returns `false` if `request` has
    /// been superseded and should not be sent.
    pub fn begin_suggestion_fetch(&mut self, request: &SuggestionRequest) -> bool {
        if !self.is_refresh_current(request) {
            return false;
        }
        self.loading_suggestions = true;
        true
    }

    /// Apply fetched suggestions if `request` is still current.
    ///
    /// An empty result keeps the previous list. Returns whether the request
    /// was current.
    pub fn apply_suggestions(&mut self, request: &SuggestionRequest, suggestions: Vec<String>) -> bool {
        if !self.is_refresh_current(request) {
            tracing::debug!(
                generation = request.generation,
                latest = self.refresh_generation,
                "discarding stale suggestions"
            );
            return false;
        }
        self.loading_suggestions = false;
        if !suggestions.is_empty() {
            self.suggestions = suggestions;
        }
        true
    }

    /// Read-only projection for the presentation layer.
    pub fn view(&self) -> SessionView {
        let cursor = self.history.cursor();
        let history = self
            .history
            .snapshots()
            .iter()
            .enumerate()
            .map(|(index, snapshot)| HistoryEntryView::new(index, snapshot, cursor == Some(index)))
            .collect();
        let candidate = self.candidate.as_ref().map(|c| CandidateView {
            id: c.snapshot.id(),
            media_type: c.snapshot.media_type().to_string(),
            size_bytes: c.snapshot.payload().len(),
            source_id: c.source,
        });

        SessionView {
            phase: self.phase,
            history,
            cursor: self.history.position(),
            can_undo: self.history.can_undo(),
            can_redo: self.history.can_redo(),
            candidate,
            prompt: self.prompt.clone(),
            error: self.error.clone(),
            suggestions: self.suggestions.clone(),
            loading_suggestions: self.loading_suggestions,
        }
    }

    fn reject(&mut self, err: ValidationError) -> ValidationError {
        tracing::debug!("submission rejected: {err}");
        self.error = Some(err.to_string());
        err
    }

    fn after_navigation(&mut self, moved: bool) -> bool {
        if !moved {
            return false;
        }
        self.leave_result_view();
        self.current_changed();
        true
    }

    fn leave_result_view(&mut self) {
        self.candidate = None;
        self.error = None;
        self.set_phase(Phase::Editing);
    }

    fn set_phase(&mut self, phase: Phase) {
        if self.phase != phase {
            tracing::debug!(from = %self.phase, to = %phase, "phase change");
            self.phase = phase;
        }
    }

    fn current_changed(&mut self) {
        self.refresh_generation += 1;
        self.loading_suggestions = false;
        self.pending_refresh = Some(match self.history.current() {
            Some(current) => SuggestionRefresh::Fetch(SuggestionRequest {
                generation: self.refresh_generation,
                snapshot_id: current.id(),
                payload: current.shared_payload(),
            }),
            None => SuggestionRefresh::Cancel,
        });
    }

    fn is_refresh_current(&self, request: &SuggestionRequest) -> bool {
        request.generation == self.refresh_generation
            && self.history.current().map(Snapshot::id) == Some(request.snapshot_id)
    }
}
