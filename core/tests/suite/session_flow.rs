use std::sync::Arc;
use std::time::Duration;

use core_test_support::MockEditService;
use core_test_support::ServiceCall;
use core_test_support::tagged_png;
use pretty_assertions::assert_eq;
use retouch_core::EditError;
use retouch_core::IntakePolicy;
use retouch_core::SessionError;
use retouch_core::SessionHandle;
use retouch_core::SubmitOutcome;
use retouch_core::ValidationError;
use retouch_core::protocol::Phase;
use retouch_core::protocol::default_suggestions;
use retouch_core::shortcuts::KeyChord;
use tokio::time::sleep;

const DEBOUNCE: Duration = Duration::from_millis(500);

fn handle_with(service: MockEditService) -> (SessionHandle, Arc<MockEditService>) {
    let service = Arc::new(service);
    let handle = SessionHandle::new(service.clone(), IntakePolicy::default(), DEBOUNCE);
    (handle, service)
}

async fn history_tags(handle: &SessionHandle) -> Vec<u8> {
    handle
        .inspect(|session| {
            session
                .history()
                .snapshots()
                .iter()
                .map(|s| s.payload().data[0])
                .collect()
        })
        .await
}

#[tokio::test(start_paused = true)]
async fn edit_accept_and_navigate() {
    let (handle, service) = handle_with(MockEditService::new());
    handle.open_payload(tagged_png(1)).await.unwrap();

    let outcome = handle.submit(Some("brighten")).await.unwrap();
    assert!(matches!(outcome, SubmitOutcome::Candidate(_)));
    let view = handle.view().await;
    assert_eq!(view.phase, Phase::Viewing);
    assert_eq!(view.history.len(), 1);

    handle.accept_candidate().await.unwrap();
    assert_eq!(history_tags(&handle).await, vec![1, 2]);

    assert!(handle.handle_key(KeyChord::ctrl('z'), false).await);
    assert_eq!(handle.view().await.cursor, 0);
    assert!(!handle.handle_key(KeyChord::ctrl('y'), true).await);
    assert!(handle.handle_key(KeyChord::ctrl('z').with_shift(), false).await);
    assert_eq!(handle.view().await.cursor, 1);

    assert_eq!(
        service.calls().first(),
        Some(&ServiceCall::Edit {
            source_tag: 1,
            instruction: "brighten".to_string()
        })
    );
}

#[tokio::test(start_paused = true)]
async fn failed_edit_shows_error_and_keeps_history() {
    let (handle, service) = handle_with(MockEditService::new());
    service.push_edit(Err(EditError::ModelRefusal {
        reason: "SAFETY".to_string(),
    }));
    handle.open_payload(tagged_png(1)).await.unwrap();

    let outcome = handle.submit(Some("remove the sky")).await.unwrap();

    assert!(matches!(outcome, SubmitOutcome::Failed(_)));
    let view = handle.view().await;
    assert_eq!(view.phase, Phase::Editing);
    assert_eq!(view.error.as_deref(), Some("Generation stopped due to: SAFETY"));
    assert_eq!(history_tags(&handle).await, vec![1]);

    handle.dismiss_error().await;
    assert_eq!(handle.view().await.error, None);
}

#[tokio::test(start_paused = true)]
async fn submitting_current_prompt_text() {
    let (handle, service) = handle_with(MockEditService::new());
    handle.set_prompt("  add a sunset  ").await;
    handle.open_payload(tagged_png(4)).await.unwrap();

    handle.submit(None).await.unwrap();

    assert_eq!(
        service.calls().first(),
        Some(&ServiceCall::Edit {
            source_tag: 4,
            instruction: "add a sunset".to_string()
        })
    );
}

#[tokio::test(start_paused = true)]
async fn validation_errors_do_not_reach_the_service() {
    let (handle, service) = handle_with(MockEditService::new());

    let err = handle.submit(Some("sharpen")).await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::Validation(ValidationError::MissingSnapshot)
    ));

    handle.open_payload(tagged_png(1)).await.unwrap();
    let err = handle.submit(Some("   ")).await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::Validation(ValidationError::EmptyInstruction)
    ));
    assert_eq!(handle.view().await.phase, Phase::Editing);

    assert!(
        service
            .calls()
            .iter()
            .all(|c| !matches!(c, ServiceCall::Edit { .. }))
    );
}

#[tokio::test(start_paused = true)]
async fn second_submission_while_processing_is_ignored() {
    let (handle, service) =
        handle_with(MockEditService::new().with_edit_latency(Duration::from_secs(1)));
    handle.open_payload(tagged_png(1)).await.unwrap();

    let first = tokio::spawn({
        let handle = handle.clone();
        async move { handle.submit(Some("one")).await }
    });
    sleep(Duration::from_millis(10)).await;
    assert_eq!(handle.view().await.phase, Phase::Processing);

    let second = handle.submit(Some("two")).await.unwrap();
    assert!(matches!(second, SubmitOutcome::Busy));

    assert!(matches!(
        first.await.unwrap().unwrap(),
        SubmitOutcome::Candidate(_)
    ));
    let edits = service
        .calls()
        .into_iter()
        .filter(|c| matches!(c, ServiceCall::Edit { .. }))
        .count();
    assert_eq!(edits, 1);
}

#[tokio::test(start_paused = true)]
async fn reset_during_processing_discards_late_result() {
    let (handle, _service) =
        handle_with(MockEditService::new().with_edit_latency(Duration::from_secs(1)));
    handle.open_payload(tagged_png(1)).await.unwrap();

    let pending = tokio::spawn({
        let handle = handle.clone();
        async move { handle.submit(Some("one")).await }
    });
    sleep(Duration::from_millis(100)).await;
    handle.reset().await;

    assert!(matches!(
        pending.await.unwrap().unwrap(),
        SubmitOutcome::Stale
    ));
    let view = handle.view().await;
    assert_eq!(view.phase, Phase::Idle);
    assert!(view.candidate.is_none());
    assert!(view.history.is_empty());
}

#[tokio::test(start_paused = true)]
async fn new_upload_during_processing_discards_late_result() {
    let (handle, _service) =
        handle_with(MockEditService::new().with_edit_latency(Duration::from_secs(1)));
    handle.open_payload(tagged_png(1)).await.unwrap();

    let pending = tokio::spawn({
        let handle = handle.clone();
        async move { handle.submit(Some("one")).await }
    });
    sleep(Duration::from_millis(100)).await;
    handle.open_payload(tagged_png(7)).await.unwrap();

    assert!(matches!(
        pending.await.unwrap().unwrap(),
        SubmitOutcome::Stale
    ));
    assert_eq!(handle.view().await.phase, Phase::Editing);
    assert_eq!(history_tags(&handle).await, vec![7]);
}

#[tokio::test(start_paused = true)]
async fn rapid_changes_fetch_suggestions_once() {
    let (handle, service) = handle_with(MockEditService::new());

    handle.open_payload(tagged_png(1)).await.unwrap();
    sleep(Duration::from_millis(100)).await;
    handle.open_payload(tagged_png(2)).await.unwrap();
    sleep(Duration::from_millis(100)).await;
    handle.open_payload(tagged_png(3)).await.unwrap();
    sleep(Duration::from_secs(1)).await;

    assert_eq!(service.calls(), vec![ServiceCall::Suggest { source_tag: 3 }]);
    let view = handle.view().await;
    assert_eq!(view.suggestions, MockEditService::suggestions_for(3));
    assert!(!view.loading_suggestions);
}

#[tokio::test(start_paused = true)]
async fn suggestions_wait_for_quiet_period() {
    let (handle, service) = handle_with(MockEditService::new());

    handle.open_payload(tagged_png(1)).await.unwrap();
    sleep(Duration::from_millis(400)).await;
    assert_eq!(service.suggest_calls(), 0);
    assert_eq!(handle.view().await.suggestions, default_suggestions());

    sleep(Duration::from_millis(200)).await;
    assert_eq!(service.suggest_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn in_flight_suggestions_for_old_snapshot_are_dropped() {
    let (handle, service) =
        handle_with(MockEditService::new().with_suggest_latency(Duration::from_secs(1)));

    handle.open_payload(tagged_png(1)).await.unwrap();
    // Past the debounce, so the fetch for snapshot 1 is running.
    sleep(Duration::from_millis(700)).await;
    assert!(handle.view().await.loading_suggestions);

    handle.open_payload(tagged_png(2)).await.unwrap();
    sleep(Duration::from_millis(1200)).await;
    assert_eq!(handle.view().await.suggestions, default_suggestions());

    sleep(Duration::from_secs(2)).await;
    assert_eq!(
        service.calls(),
        vec![
            ServiceCall::Suggest { source_tag: 1 },
            ServiceCall::Suggest { source_tag: 2 },
        ]
    );
    assert_eq!(
        handle.view().await.suggestions,
        MockEditService::suggestions_for(2)
    );
}

#[tokio::test(start_paused = true)]
async fn accepting_candidate_refreshes_suggestions_for_it() {
    let (handle, service) = handle_with(MockEditService::new());
    handle.open_payload(tagged_png(1)).await.unwrap();
    sleep(Duration::from_secs(1)).await;

    handle.submit(Some("brighten")).await.unwrap();
    handle.accept_candidate().await.unwrap();
    sleep(Duration::from_secs(1)).await;

    assert_eq!(
        handle.view().await.suggestions,
        MockEditService::suggestions_for(2)
    );
    assert_eq!(service.suggest_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn reset_cancels_pending_refresh() {
    let (handle, service) = handle_with(MockEditService::new());

    handle.open_payload(tagged_png(1)).await.unwrap();
    sleep(Duration::from_millis(100)).await;
    handle.reset().await;
    sleep(Duration::from_secs(1)).await;

    assert_eq!(service.suggest_calls(), 0);
    let view = handle.view().await;
    assert_eq!(view.suggestions, default_suggestions());
    assert_eq!(view.phase, Phase::Idle);
}

#[tokio::test]
async fn rejected_file_leaves_session_untouched() {
    let (handle, _service) = handle_with(MockEditService::new());
    let dir = tempfile::tempdir().unwrap();
    let notes = dir.path().join("notes.txt");
    std::fs::write(&notes, b"not an image").unwrap();

    let err = handle.open_file(&notes).await.unwrap_err();

    assert!(matches!(
        err,
        SessionError::Validation(ValidationError::UnsupportedMediaType { .. })
    ));
    assert_eq!(handle.view().await.phase, Phase::Idle);
}

#[tokio::test]
async fn accepted_file_seeds_session() {
    let (handle, _service) = handle_with(MockEditService::new());
    let dir = tempfile::tempdir().unwrap();
    let scan = dir.path().join("scan.pdf");
    std::fs::write(&scan, b"%PDF-1.7").unwrap();

    let id = handle.open_file(&scan).await.unwrap();

    let view = handle.view().await;
    assert_eq!(view.phase, Phase::Editing);
    let current = view.current().unwrap();
    assert_eq!(current.id, id);
    assert_eq!(current.media_type, "application/pdf");
    assert_eq!(view.title(), "Edit Mode");
}
