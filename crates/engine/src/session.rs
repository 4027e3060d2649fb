//! One operator's annotation session.
//!
//! [`AnnotationSession`] owns the frame sequence of the record under
//! review and every operation on it: loading and clearing, annotation
//! propagation, cursor navigation and playback, the inference run
//! lifecycle, and save/load/delete against the persistence service.
//!
//! All mutations go through one `RwLock`-guarded [`SessionCore`] and hold
//! the write guard for their full extent, so no reader ever observes a
//! half-applied change. Network-bound work (hydration, image fetches, the
//! prediction call) runs outside the lock and re-validates the sequence
//! version before touching state again.

use std::sync::Arc;

use tokio::sync::{broadcast, RwLock};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use embryoseq_core::frame::{Frame, FrameLocation, SourceFrame, UploadFrame};
use embryoseq_core::metadata::RecordMetadata;
use embryoseq_core::phase::Phase;
use embryoseq_core::sequence::{FrameSequence, SequenceVersion};
use embryoseq_core::types::RecordId;
use embryoseq_core::CoreError;
use embryoseq_inference::api::{PredictRequest, TransitionPredictor};
use embryoseq_inference::{encode, window, HttpPredictor, InferenceError};
use embryoseq_records::dto::{FramePayload, NewRecord, RecordSummary};
use embryoseq_records::{HttpRecordStore, RecordStore};

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::events::{AnnotationScope, SessionEvent, StopReason};
use crate::playback::{spawn_playback, PlaybackState, PlaybackTask};

/// Broadcast capacity for session events.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Result of a successful save.
#[derive(Debug, Clone, Copy)]
pub struct SaveOutcome {
    pub record_id: RecordId,
    /// True when the save created the record (first persist).
    pub created: bool,
}

/// Result of a successful inference run.
#[derive(Debug, Clone, Copy)]
pub struct InferenceOutcome {
    pub run_id: Uuid,
    pub window_count: usize,
    /// True when the service substituted randomly generated scores for a
    /// missing model artifact. The overlay is painted either way; the
    /// caller must present it as low-confidence.
    pub degraded: bool,
}

/// Mutable state of one session, guarded by the session's `RwLock`.
pub(crate) struct SessionCore {
    pub sequence: FrameSequence,
    pub cursor: usize,
    pub metadata: RecordMetadata,
    pub playback: Option<PlaybackTask>,
    pub playback_generation: u64,
    pub inference_busy: bool,
}

/// An owned, explicitly scoped annotation session.
pub struct AnnotationSession {
    core: Arc<RwLock<SessionCore>>,
    predictor: Arc<dyn TransitionPredictor>,
    records: Arc<dyn RecordStore>,
    events: broadcast::Sender<SessionEvent>,
    config: EngineConfig,
}

impl AnnotationSession {
    /// Create a session over explicit service implementations.
    pub fn new(
        predictor: Arc<dyn TransitionPredictor>,
        records: Arc<dyn RecordStore>,
        config: EngineConfig,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let core = SessionCore {
            sequence: FrameSequence::new(),
            cursor: 0,
            metadata: RecordMetadata::draft(chrono::Utc::now().date_naive()),
            playback: None,
            playback_generation: 0,
            inference_busy: false,
        };
        Self {
            core: Arc::new(RwLock::new(core)),
            predictor,
            records,
            events,
            config,
        }
    }

    /// Create a session talking to the HTTP services named in `config`.
    pub fn with_http_services(config: EngineConfig) -> Self {
        let predictor = Arc::new(HttpPredictor::new(
            config.inference_api_url.clone(),
            config.inference_timeout(),
        ));
        let records = Arc::new(HttpRecordStore::new(config.records_api_url.clone()));
        Self::new(predictor, records, config)
    }

    /// Subscribe to this session's event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    // -----------------------------------------------------------------
    // Sequence loading
    // -----------------------------------------------------------------

    /// Replace the sequence with freshly uploaded files.
    ///
    /// Membership can only change wholesale, and images are immutable
    /// once persisted, so a new upload always makes the session a draft.
    /// Any running playback is invalidated and the prediction overlay is
    /// gone with the old frames.
    pub async fn load_upload(&self, uploads: Vec<UploadFrame>) -> SequenceVersion {
        let mut core = self.core.write().await;
        self.invalidate_playback(&mut core);

        let sources: Vec<SourceFrame> = uploads.into_iter().map(Into::into).collect();
        let version = core.sequence.load(sources);
        core.cursor = 0;
        core.metadata.record_id = None;

        tracing::info!(frame_count = core.sequence.len(), "Sequence loaded from upload");
        let _ = self.events.send(SessionEvent::SequenceLoaded {
            record_id: None,
            frame_count: core.sequence.len(),
            version,
        });
        version
    }

    /// Hydrate the session from a persisted record.
    ///
    /// Loads the frame identifiers, then replays the persisted
    /// annotations by `source_name`; frames without one stay "N/A".
    pub async fn hydrate(&self, id: RecordId) -> Result<(), EngineError> {
        let persisted = self.records.fetch_record(id).await?;

        let mut core = self.core.write().await;
        self.invalidate_playback(&mut core);

        let sources = persisted
            .source_names
            .iter()
            .map(|name| SourceFrame {
                source_name: name.clone(),
                location: FrameLocation::Remote { record_id: id },
            })
            .collect();
        let version = core.sequence.load(sources);
        core.sequence.apply_annotations(&persisted.annotations);
        core.metadata = persisted.metadata;
        core.metadata.record_id = Some(id);
        core.cursor = 0;

        tracing::info!(
            record_id = id,
            frame_count = core.sequence.len(),
            "Session hydrated from record",
        );
        let _ = self.events.send(SessionEvent::SequenceLoaded {
            record_id: Some(id),
            frame_count: core.sequence.len(),
            version,
        });
        Ok(())
    }

    /// Reset to an empty draft, releasing all locally held payloads.
    pub async fn clear(&self) {
        let mut core = self.core.write().await;
        self.invalidate_playback(&mut core);
        core.sequence.clear();
        core.cursor = 0;
        core.metadata = RecordMetadata::draft(chrono::Utc::now().date_naive());
        let _ = self.events.send(SessionEvent::SequenceCleared);
        tracing::debug!("Session cleared");
    }

    // -----------------------------------------------------------------
    // Views
    // -----------------------------------------------------------------

    pub async fn frame_count(&self) -> usize {
        self.core.read().await.sequence.len()
    }

    pub async fn current_index(&self) -> usize {
        self.core.read().await.cursor
    }

    /// Clone of one frame, including its annotation state.
    pub async fn frame(&self, index: usize) -> Result<Frame, EngineError> {
        let core = self.core.read().await;
        Ok(core.sequence.get(index)?.clone())
    }

    /// Clones of all frames, in order.
    pub async fn frames(&self) -> Vec<Frame> {
        self.core.read().await.sequence.frames().cloned().collect()
    }

    pub async fn metadata(&self) -> RecordMetadata {
        self.core.read().await.metadata.clone()
    }

    /// Replace the operator-entered metadata fields.
    ///
    /// The record binding (`record_id`) is owned by the session and
    /// cannot be changed this way.
    pub async fn set_metadata(&self, metadata: RecordMetadata) {
        let mut core = self.core.write().await;
        let bound_id = core.metadata.record_id;
        core.metadata = metadata;
        core.metadata.record_id = bound_id;
    }

    // -----------------------------------------------------------------
    // Annotation propagation
    // -----------------------------------------------------------------

    /// Forward-fill `phase` from `from_index` to the end of the sequence.
    ///
    /// A no-op on an empty sequence or out-of-range index.
    pub async fn propagate_forward(&self, from_index: usize, phase: Phase) {
        let mut core = self.core.write().await;
        core.sequence.propagate_forward(from_index, phase);
        let _ = self.events.send(SessionEvent::AnnotationChanged {
            scope: AnnotationScope::ForwardFrom { index: from_index },
            phase,
        });
    }

    /// Assign `phase` to every frame, regardless of cursor position.
    pub async fn broadcast_all(&self, phase: Phase) {
        let mut core = self.core.write().await;
        core.sequence.broadcast_all(phase);
        let _ = self.events.send(SessionEvent::AnnotationChanged {
            scope: AnnotationScope::All,
            phase,
        });
    }

    // -----------------------------------------------------------------
    // Navigation & playback
    // -----------------------------------------------------------------

    /// Step to the next frame; a no-op at the last frame.
    pub async fn next_frame(&self) {
        let mut core = self.core.write().await;
        if core.cursor + 1 < core.sequence.len() {
            core.cursor += 1;
            let _ = self.events.send(SessionEvent::CursorMoved { index: core.cursor });
        }
    }

    /// Step to the previous frame; a no-op at frame 0.
    pub async fn previous_frame(&self) {
        let mut core = self.core.write().await;
        if core.cursor > 0 {
            core.cursor -= 1;
            let _ = self.events.send(SessionEvent::CursorMoved { index: core.cursor });
        }
    }

    /// Jump directly to a frame.
    pub async fn jump_to(&self, index: usize) -> Result<(), EngineError> {
        let mut core = self.core.write().await;
        let len = core.sequence.len();
        if index >= len {
            return Err(CoreError::OutOfRange { index, len }.into());
        }
        core.cursor = index;
        let _ = self.events.send(SessionEvent::CursorMoved { index });
        Ok(())
    }

    pub async fn playback_state(&self) -> PlaybackState {
        if self.core.read().await.playback.is_some() {
            PlaybackState::Playing
        } else {
            PlaybackState::Stopped
        }
    }

    /// Begin timed playback from the current cursor.
    ///
    /// Idempotent: starting while already playing (or with no frames) is
    /// a no-op. Exactly one scheduled task is live at a time.
    pub async fn start_playback(&self) {
        let mut core = self.core.write().await;
        if core.playback.is_some() || core.sequence.is_empty() {
            return;
        }

        core.playback_generation += 1;
        let generation = core.playback_generation;
        let cancel = CancellationToken::new();
        core.playback = Some(PlaybackTask {
            cancel: cancel.clone(),
            generation,
        });

        spawn_playback(
            Arc::clone(&self.core),
            self.events.clone(),
            self.config.playback_tick(),
            generation,
            cancel,
        );
        let _ = self.events.send(SessionEvent::PlaybackStarted);
        tracing::debug!(generation, "Playback started");
    }

    /// Stop playback; a no-op when already stopped.
    pub async fn stop_playback(&self) {
        let mut core = self.core.write().await;
        if let Some(task) = core.playback.take() {
            task.cancel.cancel();
            let _ = self.events.send(SessionEvent::PlaybackStopped {
                reason: StopReason::Explicit,
            });
            tracing::debug!("Playback stopped");
        }
    }

    /// Cancel any live playback because the store is about to mutate.
    /// Caller must hold the write guard.
    fn invalidate_playback(&self, core: &mut SessionCore) {
        if let Some(task) = core.playback.take() {
            task.cancel.cancel();
            let _ = self.events.send(SessionEvent::PlaybackStopped {
                reason: StopReason::Invalidated,
            });
        }
    }

    // -----------------------------------------------------------------
    // Inference
    // -----------------------------------------------------------------

    /// Run transition inference over the current sequence.
    ///
    /// Preconditions are checked before any encoding or network traffic;
    /// a run already in flight is rejected with
    /// [`InferenceError::Busy`]. The run is bounded by the configured
    /// timeout, and its results are discarded (never painted) if the
    /// sequence was reloaded or cleared while the call was out.
    pub async fn run_inference(&self, window_size: usize) -> Result<InferenceOutcome, EngineError> {
        let run_id = Uuid::new_v4();

        let (version, names_and_locations) = {
            let mut core = self.core.write().await;
            if core.inference_busy {
                return Err(InferenceError::Busy.into());
            }
            window::check_preconditions(core.sequence.len(), window_size)?;
            core.inference_busy = true;

            let snapshot: Vec<(String, FrameLocation)> = core
                .sequence
                .frames()
                .map(|f| (f.source_name.clone(), f.location.clone()))
                .collect();
            (core.sequence.version(), snapshot)
        };

        let _ = self.events.send(SessionEvent::InferenceStarted { run_id, window_size });
        tracing::info!(
            %run_id,
            window_size,
            frame_count = names_and_locations.len(),
            "Inference run started",
        );

        let result = self
            .execute_inference(run_id, window_size, version, names_and_locations)
            .await;

        self.core.write().await.inference_busy = false;

        match &result {
            Ok(outcome) => {
                if outcome.degraded {
                    tracing::warn!(%run_id, "Inference used random fallback scores");
                }
                let _ = self.events.send(SessionEvent::InferenceCompleted {
                    run_id,
                    window_count: outcome.window_count,
                    degraded: outcome.degraded,
                });
            }
            Err(e) => {
                tracing::warn!(%run_id, error = %e, "Inference run failed");
                let _ = self.events.send(SessionEvent::InferenceFailed {
                    run_id,
                    error: e.to_string(),
                });
            }
        }
        result
    }

    /// The suspendable part of a run: resolve payloads, encode, call the
    /// service, validate, and paint under a version re-check.
    async fn execute_inference(
        &self,
        run_id: Uuid,
        window_size: usize,
        version: SequenceVersion,
        names_and_locations: Vec<(String, FrameLocation)>,
    ) -> Result<InferenceOutcome, EngineError> {
        let n = names_and_locations.len();

        // Resolve every frame's bytes: uploads are already in memory,
        // persisted frames come from the records service.
        let mut payloads: Vec<Arc<Vec<u8>>> = Vec::with_capacity(n);
        for (source_name, location) in &names_and_locations {
            match location {
                FrameLocation::Local { bytes } => payloads.push(Arc::clone(bytes)),
                FrameLocation::Remote { record_id } => {
                    let bytes = self.records.fetch_image(*record_id, source_name).await?;
                    payloads.push(Arc::new(bytes));
                }
            }
        }

        // JPEG re-encoding is CPU-bound; keep it off the async threads.
        let frames = tokio::task::spawn_blocking(move || {
            let slices: Vec<&[u8]> = payloads.iter().map(|p| p.as_slice()).collect();
            encode::encode_frames(&slices)
        })
        .await
        .map_err(|e| InferenceError::Encode {
            index: 0,
            reason: format!("encoding task failed: {e}"),
        })??;

        let request = PredictRequest {
            window_size,
            frames,
        };

        let timeout = self.config.inference_timeout();
        let response = match tokio::time::timeout(timeout, self.predictor.predict(&request)).await {
            Ok(result) => result?,
            Err(_) => return Err(InferenceError::Timeout(timeout.as_secs()).into()),
        };

        let scores = response.scores();
        let overlay = window::paint_transitions(n, window_size, &scores)?;

        let mut core = self.core.write().await;
        if core.sequence.version() != version {
            tracing::warn!(%run_id, "Sequence changed during inference; discarding results");
            return Err(InferenceError::Superseded.into());
        }
        // Drop any previous run's overlay before painting the new one.
        core.sequence.clear_predictions();
        core.sequence.set_predictions(&overlay)?;

        Ok(InferenceOutcome {
            run_id,
            window_count: scores.len(),
            degraded: response.is_random,
        })
    }

    // -----------------------------------------------------------------
    // Record reconciliation
    // -----------------------------------------------------------------

    /// Persist the session: create on first save, update afterwards.
    ///
    /// Create transmits the raw frame payloads; update sends metadata and
    /// annotations only, since images are immutable once created.
    pub async fn save(&self) -> Result<SaveOutcome, EngineError> {
        enum SavePlan {
            Create(Vec<FramePayload>),
            Update(RecordId),
        }

        let (metadata, annotations, plan, version) = {
            let core = self.core.read().await;
            core.metadata.validate_for_save()?;
            if core.sequence.is_empty() {
                return Err(CoreError::Validation(
                    "At least one frame is required before saving".to_string(),
                )
                .into());
            }

            let plan = match core.metadata.record_id {
                None => SavePlan::Create(Self::collect_payloads(&core.sequence)?),
                Some(id) => SavePlan::Update(id),
            };
            (
                core.metadata.clone(),
                core.sequence.annotations(),
                plan,
                core.sequence.version(),
            )
        };

        match plan {
            SavePlan::Create(frames) => {
                let record = NewRecord {
                    metadata: metadata.clone(),
                    frames,
                    annotations,
                };
                let id = self.records.create_record(&record).await?;

                let mut core = self.core.write().await;
                if core.sequence.version() == version {
                    core.metadata.record_id = Some(id);
                } else {
                    tracing::warn!(
                        record_id = id,
                        "Sequence changed during create; session stays unbound",
                    );
                }
                let _ = self.events.send(SessionEvent::RecordSaved {
                    record_id: id,
                    created: true,
                });
                tracing::info!(record_id = id, "Record created");
                Ok(SaveOutcome {
                    record_id: id,
                    created: true,
                })
            }
            SavePlan::Update(id) => {
                self.records.update_record(id, &metadata, &annotations).await?;
                let _ = self.events.send(SessionEvent::RecordSaved {
                    record_id: id,
                    created: false,
                });
                tracing::info!(record_id = id, "Record updated");
                Ok(SaveOutcome {
                    record_id: id,
                    created: false,
                })
            }
        }
    }

    /// Delete a record from the persistence service.
    ///
    /// Destructive and irreversible; on success, the session resets to an
    /// empty draft if (and only if) the deleted record is the one
    /// currently loaded.
    pub async fn delete(&self, id: RecordId) -> Result<(), EngineError> {
        self.records.delete_record(id).await?;

        let mut core = self.core.write().await;
        if core.metadata.record_id == Some(id) {
            self.invalidate_playback(&mut core);
            core.sequence.clear();
            core.cursor = 0;
            core.metadata = RecordMetadata::draft(chrono::Utc::now().date_naive());
            let _ = self.events.send(SessionEvent::SequenceCleared);
        }
        let _ = self.events.send(SessionEvent::RecordDeleted { record_id: id });
        tracing::info!(record_id = id, "Record deleted");
        Ok(())
    }

    /// All records visible to the operator, for the listing table.
    pub async fn list_records(&self) -> Result<Vec<RecordSummary>, EngineError> {
        Ok(self.records.list_records().await?)
    }

    /// Snapshot the raw payloads for a create. Every frame must still be
    /// local; a draft can only have been built from an upload.
    fn collect_payloads(sequence: &FrameSequence) -> Result<Vec<FramePayload>, CoreError> {
        sequence
            .frames()
            .map(|frame| match &frame.location {
                FrameLocation::Local { bytes } => Ok(FramePayload {
                    source_name: frame.source_name.clone(),
                    bytes: bytes.as_ref().clone(),
                }),
                FrameLocation::Remote { .. } => Err(CoreError::Validation(format!(
                    "Frame payload for '{}' is no longer available for upload",
                    frame.source_name
                ))),
            })
            .collect()
    }
}
