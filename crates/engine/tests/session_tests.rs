//! Integration tests for the annotation session: loading, propagation,
//! inference aggregation, and record reconciliation against the
//! in-memory store.

mod common;

use std::sync::Arc;

use assert_matches::assert_matches;
use tokio::sync::Notify;

use common::{filled_metadata, init_tracing, png_uploads, raw_uploads, test_config, FakePredictor};
use embryoseq_core::phase::Phase;
use embryoseq_core::CoreError;
use embryoseq_engine::{AnnotationSession, EngineError, SessionEvent};
use embryoseq_inference::InferenceError;
use embryoseq_records::{MemoryRecordStore, RecordStore};

fn session_with(
    predictor: FakePredictor,
) -> (Arc<AnnotationSession>, Arc<FakePredictor>, Arc<MemoryRecordStore>) {
    init_tracing();
    let predictor = Arc::new(predictor);
    let store = Arc::new(MemoryRecordStore::new());
    let session = Arc::new(AnnotationSession::new(
        predictor.clone(),
        store.clone(),
        test_config(),
    ));
    (session, predictor, store)
}

// ---------------------------------------------------------------------------
// Loading & annotation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn upload_natural_sorts_and_indexes_frames() {
    let (session, _, _) = session_with(FakePredictor::returning(vec![]));

    let mut uploads = raw_uploads(11);
    uploads.reverse(); // arrival order must not matter
    session.load_upload(uploads).await;

    let frames = session.frames().await;
    assert_eq!(frames.len(), 11);
    // img_2 before img_10: numeric, not lexical.
    let names: Vec<&str> = frames.iter().map(|f| f.source_name.as_str()).collect();
    assert_eq!(names[2], "img_2.png");
    assert_eq!(names[10], "img_10.png");
    let indices: Vec<usize> = frames.iter().map(|f| f.index).collect();
    assert_eq!(indices, (0..11).collect::<Vec<_>>());
    assert!(frames.iter().all(|f| f.phase == Phase::NotAvailable));
}

#[tokio::test]
async fn forward_fill_and_broadcast_have_distinct_scopes() {
    let (session, _, _) = session_with(FakePredictor::returning(vec![]));
    session.load_upload(raw_uploads(4)).await;

    session.broadcast_all(Phase::T2).await;
    session.propagate_forward(2, Phase::T4).await;

    let phases: Vec<Phase> = session.frames().await.iter().map(|f| f.phase).collect();
    assert_eq!(phases, vec![Phase::T2, Phase::T2, Phase::T4, Phase::T4]);

    session.broadcast_all(Phase::Anomaly).await;
    let phases: Vec<Phase> = session.frames().await.iter().map(|f| f.phase).collect();
    assert!(phases.iter().all(|p| *p == Phase::Anomaly));
}

#[tokio::test]
async fn propagation_on_empty_session_is_a_noop() {
    let (session, _, _) = session_with(FakePredictor::returning(vec![]));
    // Must not panic or error; there are simply no frames yet.
    session.propagate_forward(0, Phase::T2).await;
    session.broadcast_all(Phase::T2).await;
    assert_eq!(session.frame_count().await, 0);
}

// ---------------------------------------------------------------------------
// Inference preconditions
// ---------------------------------------------------------------------------

#[tokio::test]
async fn empty_sequence_fails_before_any_service_call() {
    let (session, predictor, _) = session_with(FakePredictor::returning(vec![0]));

    let err = session.run_inference(8).await.unwrap_err();
    assert_matches!(err, EngineError::Inference(InferenceError::NoFrames));
    assert_eq!(predictor.calls(), 0);
}

#[tokio::test]
async fn short_sequence_fails_before_any_service_call() {
    let (session, predictor, _) = session_with(FakePredictor::returning(vec![0]));
    session.load_upload(raw_uploads(5)).await;

    let err = session.run_inference(8).await.unwrap_err();
    assert_matches!(
        err,
        EngineError::Inference(InferenceError::InsufficientFrames { have: 5, need: 8 })
    );
    assert_eq!(predictor.calls(), 0);
}

#[tokio::test]
async fn unsupported_window_size_is_rejected() {
    let (session, predictor, _) = session_with(FakePredictor::returning(vec![0]));
    session.load_upload(raw_uploads(20)).await;

    let err = session.run_inference(16).await.unwrap_err();
    assert_matches!(
        err,
        EngineError::Inference(InferenceError::UnsupportedWindowSize(16))
    );
    assert_eq!(predictor.calls(), 0);
}

// ---------------------------------------------------------------------------
// Inference aggregation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn first_window_paints_whole_window_later_windows_one_frame_each() {
    let (session, _, _) = session_with(FakePredictor::returning(vec![0, 1, 0]));
    session.load_upload(png_uploads(10)).await;

    let outcome = session.run_inference(8).await.unwrap();
    assert_eq!(outcome.window_count, 3);
    assert!(!outcome.degraded);

    let painted: Vec<Option<bool>> = session
        .frames()
        .await
        .iter()
        .map(|f| f.predicted_transition)
        .collect();
    let mut expected = vec![Some(false); 8];
    expected.push(Some(true));
    expected.push(Some(false));
    assert_eq!(painted, expected);
}

#[tokio::test]
async fn rerun_replaces_previous_overlay_wholesale() {
    let predictor = FakePredictor::returning(vec![1, 1, 1]).then(vec![0, 0, 0]);
    let (session, _, _) = session_with(predictor);
    session.load_upload(png_uploads(10)).await;

    session.run_inference(8).await.unwrap();
    assert!(session
        .frames()
        .await
        .iter()
        .all(|f| f.predicted_transition == Some(true)));

    session.run_inference(8).await.unwrap();
    assert!(session
        .frames()
        .await
        .iter()
        .all(|f| f.predicted_transition == Some(false)));
}

#[tokio::test]
async fn reload_drops_stale_overlay() {
    let (session, _, _) = session_with(FakePredictor::returning(vec![1, 1, 1]));
    session.load_upload(png_uploads(10)).await;
    session.run_inference(8).await.unwrap();

    session.load_upload(png_uploads(10)).await;
    assert!(session
        .frames()
        .await
        .iter()
        .all(|f| f.predicted_transition.is_none()));
}

#[tokio::test]
async fn degraded_results_are_flagged_not_hidden() {
    let (session, _, _) = session_with(FakePredictor::returning(vec![1, 0, 1]).degraded());
    session.load_upload(png_uploads(10)).await;
    let mut rx = session.subscribe();

    let outcome = session.run_inference(8).await.unwrap();
    assert!(outcome.degraded);
    // Painted exactly like authoritative results.
    assert_eq!(
        session.frames().await[0].predicted_transition,
        Some(true)
    );

    // The completion event carries the advisory too.
    let mut saw_degraded_completion = false;
    while let Ok(event) = rx.try_recv() {
        if let SessionEvent::InferenceCompleted { degraded, .. } = event {
            saw_degraded_completion = degraded;
        }
    }
    assert!(saw_degraded_completion);
}

#[tokio::test]
async fn second_run_while_one_is_in_flight_is_rejected() {
    let gate = Arc::new(Notify::new());
    let (session, predictor, _) =
        session_with(FakePredictor::returning(vec![0, 0, 0]).gated(gate.clone()));
    session.load_upload(png_uploads(10)).await;

    let background = {
        let session = session.clone();
        tokio::spawn(async move { session.run_inference(8).await })
    };

    // Wait for the first run to reach the (gated) service call.
    while predictor.calls() == 0 {
        tokio::task::yield_now().await;
    }

    let err = session.run_inference(8).await.unwrap_err();
    assert_matches!(err, EngineError::Inference(InferenceError::Busy));

    gate.notify_one();
    let outcome = background.await.unwrap().unwrap();
    assert_eq!(outcome.window_count, 3);

    // The slot frees up once the run lands.
    gate.notify_one();
    session.run_inference(8).await.unwrap();
}

#[tokio::test]
async fn results_arriving_after_a_reload_are_discarded() {
    let gate = Arc::new(Notify::new());
    let (session, predictor, _) =
        session_with(FakePredictor::returning(vec![1, 1, 1]).gated(gate.clone()));
    session.load_upload(png_uploads(10)).await;

    let background = {
        let session = session.clone();
        tokio::spawn(async move { session.run_inference(8).await })
    };
    while predictor.calls() == 0 {
        tokio::task::yield_now().await;
    }

    // The operator reloads while the call is out.
    session.load_upload(png_uploads(10)).await;
    gate.notify_one();

    let err = background.await.unwrap().unwrap_err();
    assert_matches!(err, EngineError::Inference(InferenceError::Superseded));

    // The new sequence was never painted.
    assert!(session
        .frames()
        .await
        .iter()
        .all(|f| f.predicted_transition.is_none()));
}

#[tokio::test(start_paused = true)]
async fn a_timed_out_run_paints_nothing_and_frees_the_slot() {
    let gate = Arc::new(Notify::new()); // never notified
    let mut config = test_config();
    config.inference_timeout_secs = 1;

    init_tracing();
    let predictor = Arc::new(FakePredictor::returning(vec![0, 0, 0]).gated(gate));
    let store = Arc::new(MemoryRecordStore::new());
    let session = AnnotationSession::new(predictor, store, config);
    session.load_upload(png_uploads(10)).await;

    let err = session.run_inference(8).await.unwrap_err();
    assert_matches!(err, EngineError::Inference(InferenceError::Timeout(1)));
    assert!(session
        .frames()
        .await
        .iter()
        .all(|f| f.predicted_transition.is_none()));

    // Busy flag released despite the failure.
    let err = session.run_inference(16).await.unwrap_err();
    assert_matches!(
        err,
        EngineError::Inference(InferenceError::UnsupportedWindowSize(16))
    );
}

// ---------------------------------------------------------------------------
// Record reconciliation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn first_save_creates_and_binds_the_record() {
    let (session, _, store) = session_with(FakePredictor::returning(vec![]));
    session.load_upload(raw_uploads(3)).await;
    session.set_metadata(filled_metadata()).await;
    session.broadcast_all(Phase::T2).await;

    let outcome = session.save().await.unwrap();
    assert!(outcome.created);
    assert_eq!(session.metadata().await.record_id, Some(outcome.record_id));

    let persisted = store.fetch_record(outcome.record_id).await.unwrap();
    assert_eq!(persisted.source_names.len(), 3);
    assert!(persisted
        .annotations
        .iter()
        .all(|a| a.phase == Phase::T2));
}

#[tokio::test]
async fn second_save_updates_in_place() {
    let (session, _, store) = session_with(FakePredictor::returning(vec![]));
    session.load_upload(raw_uploads(3)).await;
    session.set_metadata(filled_metadata()).await;
    let created = session.save().await.unwrap();

    session.propagate_forward(1, Phase::TEB).await;
    let updated = session.save().await.unwrap();
    assert!(!updated.created);
    assert_eq!(updated.record_id, created.record_id);

    let persisted = store.fetch_record(created.record_id).await.unwrap();
    let phases: Vec<Phase> = persisted.annotations.iter().map(|a| a.phase).collect();
    assert_eq!(phases, vec![Phase::NotAvailable, Phase::TEB, Phase::TEB]);
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn hydrate_then_save_round_trips_unchanged() {
    let (session, _, store) = session_with(FakePredictor::returning(vec![]));
    session.load_upload(raw_uploads(4)).await;
    session.set_metadata(filled_metadata()).await;
    session.propagate_forward(2, Phase::TM).await;
    let id = session.save().await.unwrap().record_id;
    let before = store.fetch_record(id).await.unwrap();

    // A fresh session loads the record and saves it untouched.
    let reviewer = AnnotationSession::new(
        Arc::new(FakePredictor::returning(vec![])),
        store.clone(),
        test_config(),
    );
    reviewer.hydrate(id).await.unwrap();
    let outcome = reviewer.save().await.unwrap();
    assert!(!outcome.created);

    let after = store.fetch_record(id).await.unwrap();
    assert_eq!(after.metadata, before.metadata);
    assert_eq!(after.annotations, before.annotations);
    assert_eq!(after.source_names, before.source_names);
}

#[tokio::test]
async fn hydrate_defaults_unannotated_frames_to_na() {
    let (session, _, store) = session_with(FakePredictor::returning(vec![]));
    session.load_upload(raw_uploads(3)).await;
    session.set_metadata(filled_metadata()).await;
    let id = session.save().await.unwrap().record_id;

    // Persist an annotation set covering only one frame.
    let mut metadata = store.fetch_record(id).await.unwrap().metadata;
    metadata.record_id = Some(id);
    store
        .update_record(
            id,
            &metadata,
            &[embryoseq_records::AnnotationEntry {
                source_name: "img_1.png".to_string(),
                phase: Phase::T5,
            }],
        )
        .await
        .unwrap();

    session.hydrate(id).await.unwrap();
    let phases: Vec<Phase> = session.frames().await.iter().map(|f| f.phase).collect();
    assert_eq!(phases, vec![Phase::NotAvailable, Phase::T5, Phase::NotAvailable]);
}

#[tokio::test]
async fn inference_works_on_hydrated_records_via_image_fetch() {
    let (session, _, store) = session_with(FakePredictor::returning(vec![0, 1, 0]));
    session.load_upload(png_uploads(10)).await;
    session.set_metadata(filled_metadata()).await;
    let id = session.save().await.unwrap().record_id;

    let reviewer = AnnotationSession::new(
        Arc::new(FakePredictor::returning(vec![0, 1, 0])),
        store,
        test_config(),
    );
    reviewer.hydrate(id).await.unwrap();

    let outcome = reviewer.run_inference(8).await.unwrap();
    assert_eq!(outcome.window_count, 3);
    assert_eq!(
        reviewer.frames().await[8].predicted_transition,
        Some(true)
    );
}

#[tokio::test]
async fn save_requires_frames_and_complete_metadata() {
    let (session, _, _) = session_with(FakePredictor::returning(vec![]));

    // No frames at all.
    session.set_metadata(filled_metadata()).await;
    let err = session.save().await.unwrap_err();
    assert_matches!(err, EngineError::Core(CoreError::Validation(_)));

    // Frames, but a missing grade slot.
    session.load_upload(raw_uploads(2)).await;
    let mut incomplete = filled_metadata();
    incomplete.grade_components[2] = String::new();
    session.set_metadata(incomplete).await;
    let err = session.save().await.unwrap_err();
    assert_matches!(err, EngineError::Core(CoreError::Validation(_)));
}

#[tokio::test]
async fn deleting_the_loaded_record_resets_the_session() {
    let (session, _, store) = session_with(FakePredictor::returning(vec![]));
    session.load_upload(raw_uploads(3)).await;
    session.set_metadata(filled_metadata()).await;
    let id = session.save().await.unwrap().record_id;

    session.delete(id).await.unwrap();
    assert_eq!(session.frame_count().await, 0);
    assert!(session.metadata().await.is_draft());
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn deleting_another_record_leaves_the_session_alone() {
    let (session, _, store) = session_with(FakePredictor::returning(vec![]));

    // Persist one record from a side session.
    let other = AnnotationSession::new(
        Arc::new(FakePredictor::returning(vec![])),
        store.clone(),
        test_config(),
    );
    other.load_upload(raw_uploads(2)).await;
    other.set_metadata(filled_metadata()).await;
    let other_id = other.save().await.unwrap().record_id;

    session.load_upload(raw_uploads(5)).await;
    session.delete(other_id).await.unwrap();

    assert_eq!(session.frame_count().await, 5);
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn deleting_a_missing_record_propagates_the_failure() {
    let (session, _, _) = session_with(FakePredictor::returning(vec![]));
    session.load_upload(raw_uploads(2)).await;

    let err = session.delete(99).await.unwrap_err();
    assert_matches!(err, EngineError::Records(_));
    // Local state untouched by the failed delete.
    assert_eq!(session.frame_count().await, 2);
}

#[tokio::test]
async fn listing_shows_persisted_records() {
    let (session, _, _) = session_with(FakePredictor::returning(vec![]));
    session.load_upload(raw_uploads(2)).await;
    session.set_metadata(filled_metadata()).await;
    let id = session.save().await.unwrap().record_id;

    let listing = session.list_records().await.unwrap();
    assert_eq!(listing.len(), 1);
    assert_eq!(listing[0].record_id, id);
    assert_eq!(listing[0].contact, "Dr. Imani");
}
