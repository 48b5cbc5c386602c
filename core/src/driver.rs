//! Async driver around [`EditSession`].
//!
//! `SessionHandle` is the single owner of the session state. It holds the lock
//! only for the synchronous transitions and never across a network call, so
//! navigation, reset and new uploads stay responsive while an edit or a
//! suggestion fetch is in flight. Late responses are filtered by the session
//! itself.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use retouch_async_utils::Debouncer;
use retouch_async_utils::OrCancelExt;
use retouch_protocol::ImagePayload;
use retouch_protocol::SessionView;
use retouch_protocol::Snapshot;
use retouch_protocol::SnapshotId;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::config::RetouchConfig;
use crate::error::SessionError;
use crate::error::ValidationError;
use crate::intake::IntakePolicy;
use crate::service::RemoteEditService;
use crate::session::EditSession;
use crate::session::SubmitOutcome;
use crate::session::SuggestionRefresh;
use crate::session::SuggestionRequest;
use crate::shortcuts::KeyChord;
use crate::shortcuts::history_shortcut;

/// Cloneable handle to a running edit session.
#[derive(Clone)]
pub struct SessionHandle {
    inner: Arc<Inner>,
}

struct Inner {
    session: Mutex<EditSession>,
    service: Arc<dyn RemoteEditService>,
    intake: IntakePolicy,
    debouncer: Debouncer,
}

impl SessionHandle {
    pub fn new(
        service: Arc<dyn RemoteEditService>,
        intake: IntakePolicy,
        suggestion_debounce: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                session: Mutex::new(EditSession::new()),
                service,
                intake,
                debouncer: Debouncer::new(suggestion_debounce),
            }),
        }
    }

    pub fn from_config(service: Arc<dyn RemoteEditService>, config: &RetouchConfig) -> Self {
        Self::new(
            service,
            IntakePolicy::from(config),
            config.suggestion_debounce(),
        )
    }

    pub async fn view(&self) -> SessionView {
        self.inner.session.lock().await.view()
    }

    /// Run `f` against the session state without mutating it.
    pub async fn inspect<R>(&self, f: impl FnOnce(&EditSession) -> R) -> R {
        let session = self.inner.session.lock().await;
        f(&session)
    }

    /// Load `path` through the intake policy and seed the session with it.
    ///
    /// Rejected files leave the session untouched.
    pub async fn open_file(&self, path: &Path) -> Result<SnapshotId, SessionError> {
        let snapshot = self.inner.intake.load_file(path).await?;
        Ok(self.seed(snapshot).await)
    }

    /// Seed the session from an in-memory upload.
    pub async fn open_payload(&self, payload: ImagePayload) -> Result<SnapshotId, ValidationError> {
        let snapshot = self.inner.intake.accept(payload)?;
        Ok(self.seed(snapshot).await)
    }

    async fn seed(&self, snapshot: Snapshot) -> SnapshotId {
        let id = snapshot.id();
        self.mutate(|session| session.seed(snapshot)).await;
        id
    }

    pub async fn set_prompt(&self, text: impl Into<String>) {
        let text = text.into();
        self.mutate(|session| session.set_prompt(text)).await;
    }

    pub async fn dismiss_error(&self) {
        self.mutate(EditSession::dismiss_error).await;
    }

    /// Submit `instruction`, or the current prompt text when `None`, and wait
    /// for the edit to come back.
    pub async fn submit(&self, instruction: Option<&str>) -> Result<SubmitOutcome, SessionError> {
        let ticket = {
            let mut session = self.inner.session.lock().await;
            let started = match instruction {
                Some(text) => session.begin_submit(text),
                None => session.submit_prompt(),
            };
            match started? {
                Some(ticket) => ticket,
                None => return Ok(SubmitOutcome::Busy),
            }
        };

        let result = self
            .inner
            .service
            .edit(&ticket.payload, &ticket.instruction)
            .await;

        let mut session = self.inner.session.lock().await;
        Ok(session.complete_submit(&ticket, result))
    }

    pub async fn accept_candidate(&self) -> Result<SnapshotId, SessionError> {
        self.mutate(EditSession::accept_candidate).await
    }

    pub async fn step_back(&self) -> bool {
        self.mutate(EditSession::step_back).await
    }

    pub async fn step_forward(&self) -> bool {
        self.mutate(EditSession::step_forward).await
    }

    pub async fn jump_to(&self, index: usize) -> bool {
        self.mutate(|session| session.jump_to(index)).await
    }

    /// Route a key press; returns whether it moved the history cursor.
    pub async fn handle_key(&self, chord: KeyChord, text_input_focused: bool) -> bool {
        match history_shortcut(chord, text_input_focused) {
            Some(shortcut) => self.mutate(|session| session.apply_shortcut(shortcut)).await,
            None => false,
        }
    }

    pub async fn reset(&self) {
        self.mutate(EditSession::reset).await;
    }

    /// Apply a synchronous transition, then act on any suggestion directive
    /// it produced while the lock is still held so directives stay ordered.
    async fn mutate<R>(&self, f: impl FnOnce(&mut EditSession) -> R) -> R {
        let mut session = self.inner.session.lock().await;
        let result = f(&mut session);
        match session.take_suggestion_refresh() {
            Some(SuggestionRefresh::Fetch(request)) => self.schedule_refresh(request),
            Some(SuggestionRefresh::Cancel) => self.inner.debouncer.cancel(),
            None => {}
        }
        result
    }

    fn schedule_refresh(&self, request: SuggestionRequest) {
        let token = self.inner.debouncer.restart();
        let handle = self.clone();
        tokio::spawn(async move {
            handle.run_refresh(request, token).await;
        });
    }

    async fn run_refresh(&self, request: SuggestionRequest, token: CancellationToken) {
        if self.inner.debouncer.settle(&token).await.is_err() {
            tracing::trace!(generation = request.generation, "suggestion refresh superseded");
            return;
        }

        if !self
            .inner
            .session
            .lock()
            .await
            .begin_suggestion_fetch(&request)
        {
            return;
        }

        tracing::debug!(
            generation = request.generation,
            snapshot = %request.snapshot_id,
            "fetching suggestions"
        );
        let Ok(suggestions) = self
            .inner
            .service
            .suggest(&request.payload)
            .or_cancel(&token)
            .await
        else {
            tracing::debug!(generation = request.generation, "suggestion fetch cancelled");
            return;
        };

        let mut session = self.inner.session.lock().await;
        session.apply_suggestions(&request, suggestions);
    }
}
