//! Run orchestration
//!
//! One run processes the blocker list of a single video. Eligible blockers go
//! through extraction, inference and persistence under a small concurrency
//! limit; every blocker ends up with exactly one outcome, reported in the order
//! of the input list. A failing blocker never affects its siblings.

use chrono::Utc;
use std::fmt::Display;
use std::future::Future;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use visionproxy_core::models::{
    Blocker, GenerationOutcome, RunReport, SkipReason, Stage, VideoRef,
};
use visionproxy_core::{
    evaluate, reading_budget_seconds, Eligibility, ExtractionError, InferenceError,
    PipelineConfig,
};

use super::DescriptionStore;
use crate::caption::Captioner;
use crate::clip::{ClipRange, ClipSource};

/// A stage is attempted at most this many times (one retry).
const MAX_ATTEMPTS: u32 = 2;

const CANCELLED: &str = "cancelled";

/// Common view over the stage error types for the retry loop.
trait StageError: Display {
    fn kind(&self) -> &'static str;
    fn is_retryable(&self) -> bool;
}

impl StageError for ExtractionError {
    fn kind(&self) -> &'static str {
        ExtractionError::kind(self)
    }

    fn is_retryable(&self) -> bool {
        ExtractionError::is_retryable(self)
    }
}

impl StageError for InferenceError {
    fn kind(&self) -> &'static str {
        InferenceError::kind(self)
    }

    fn is_retryable(&self) -> bool {
        InferenceError::is_retryable(self)
    }
}

enum StageFailure<E> {
    Cancelled,
    Failed(E),
}

/// Last stage a blocker task entered, so a panicked task is reported against
/// the stage it died in.
#[derive(Clone, Default)]
struct StageMarker(Arc<AtomicU8>);

impl StageMarker {
    fn enter(&self, stage: Stage) {
        self.0.store(stage as u8, Ordering::Relaxed);
    }

    fn current(&self) -> Stage {
        match self.0.load(Ordering::Relaxed) {
            0 => Stage::Extraction,
            1 => Stage::Inference,
            _ => Stage::Persistence,
        }
    }
}

/// Drives description generation for one video at a time.
#[derive(Clone)]
pub struct Orchestrator {
    worker: BlockerWorker,
    max_concurrency: usize,
}

/// Everything a spawned blocker task needs; cheap to clone.
#[derive(Clone)]
struct BlockerWorker {
    clips: Arc<dyn ClipSource>,
    captioner: Arc<dyn Captioner>,
    store: Arc<dyn DescriptionStore>,
    retry_backoff: Duration,
}

impl Orchestrator {
    pub fn new(
        clips: Arc<dyn ClipSource>,
        captioner: Arc<dyn Captioner>,
        store: Arc<dyn DescriptionStore>,
        config: &PipelineConfig,
    ) -> Self {
        Self {
            worker: BlockerWorker {
                clips,
                captioner,
                store,
                retry_backoff: config.retry_backoff(),
            },
            max_concurrency: visionproxy_core::config::clamp_concurrency(config.max_concurrency),
        }
    }

    /// Generate descriptions for `blockers` of `video`.
    ///
    /// Never fails as a whole: stage failures become per-blocker outcomes. Once
    /// `cancel` fires, blockers that have not started are skipped and in-flight
    /// ones stop at their current stage. Dropping the returned future cancels
    /// the run as well.
    #[tracing::instrument(
        skip(self, video, blockers, cancel),
        fields(run_id, video_ref = %video, blocker_count = blockers.len())
    )]
    pub async fn run(
        &self,
        video: &VideoRef,
        blockers: Vec<Blocker>,
        cancel: CancellationToken,
    ) -> RunReport {
        let run_id = Uuid::new_v4();
        tracing::Span::current().record("run_id", tracing::field::display(run_id));
        let started_at = Utc::now();

        if blockers.is_empty() {
            tracing::warn!("No blockers to process");
            return RunReport::no_blockers(run_id, video.clone(), started_at);
        }

        let run_token = cancel.child_token();
        let _cancel_on_drop = run_token.clone().drop_guard();
        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));

        let mut slots = Vec::with_capacity(blockers.len());
        for blocker in blockers {
            match evaluate(&blocker) {
                Eligibility::Skip(reason) => {
                    tracing::debug!(blocker_id = blocker.id, %reason, "Blocker skipped");
                    slots.push(Slot::Done(GenerationOutcome::skipped(blocker.id, reason)));
                }
                Eligibility::Process => {
                    let blocker_id = blocker.id;
                    let worker = self.worker.clone();
                    let semaphore = semaphore.clone();
                    let token = run_token.clone();
                    let video = video.clone();
                    let stage = StageMarker::default();
                    let marker = stage.clone();

                    let handle = tokio::spawn(
                        async move {
                            let permit = tokio::select! {
                                biased;
                                _ = token.cancelled() => None,
                                permit = semaphore.acquire_owned() => permit.ok(),
                            };
                            match permit {
                                Some(_permit) => {
                                    worker.process(&video, &blocker, &token, &marker).await
                                }
                                None => GenerationOutcome::skipped(blocker.id, SkipReason::Cancelled),
                            }
                        }
                        .in_current_span(),
                    );
                    slots.push(Slot::Running(blocker_id, stage, handle));
                }
            }
        }

        let mut outcomes = Vec::with_capacity(slots.len());
        for slot in slots {
            let outcome = match slot {
                Slot::Done(outcome) => outcome,
                Slot::Running(blocker_id, stage, handle) => match handle.await {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        let stage = stage.current();
                        tracing::error!(blocker_id, %stage, error = %e, "Blocker task aborted");
                        GenerationOutcome::failed(
                            blocker_id,
                            stage,
                            format!("worker aborted: {}", e),
                        )
                    }
                },
            };
            outcomes.push(outcome);
        }

        let report = RunReport::completed(run_id, video.clone(), started_at, outcomes);
        tracing::info!(
            generated = report.generated(),
            skipped = report.skipped(),
            failed = report.failed(),
            cancelled = run_token.is_cancelled(),
            duration_ms = (report.finished_at - report.started_at).num_milliseconds(),
            "Generation run finished"
        );
        report
    }
}

enum Slot {
    Done(GenerationOutcome),
    Running(i64, StageMarker, tokio::task::JoinHandle<GenerationOutcome>),
}

impl BlockerWorker {
    /// Take one eligible blocker through all three stages.
    ///
    /// The clip artifact is owned by this call and dropped (deleting it from
    /// disk) on every exit path. A blocker cancelled before its first stage
    /// starts counts as skipped.
    async fn process(
        &self,
        video: &VideoRef,
        blocker: &Blocker,
        cancel: &CancellationToken,
        stage: &StageMarker,
    ) -> GenerationOutcome {
        if cancel.is_cancelled() {
            return GenerationOutcome::skipped(blocker.id, SkipReason::Cancelled);
        }

        let span = tracing::info_span!(
            "blocker",
            blocker_id = blocker.id,
            start_time_ms = blocker.start_time_ms,
            duration_ms = blocker.duration_ms()
        );

        async move {
            let range = ClipRange::from(blocker);
            stage.enter(Stage::Extraction);
            let clip = match self
                .attempt(Stage::Extraction, cancel, || self.clips.extract(video, range))
                .await
            {
                Ok(clip) => clip,
                Err(failure) => return failed_outcome(blocker.id, Stage::Extraction, failure),
            };

            let budget = reading_budget_seconds(blocker.duration_ms());
            stage.enter(Stage::Inference);
            let described = self
                .attempt(Stage::Inference, cancel, || {
                    self.captioner.describe(&clip, budget)
                })
                .await;
            drop(clip);

            let description = match described {
                Ok(description) => description,
                Err(failure) => return failed_outcome(blocker.id, Stage::Inference, failure),
            };

            stage.enter(Stage::Persistence);
            match self.store.save_description(blocker.id, &description).await {
                Ok(()) => {
                    tracing::info!(chars = description.len(), "Description generated");
                    GenerationOutcome::generated(blocker.id, description)
                }
                Err(e) => {
                    tracing::error!(error = %e, kind = e.kind(), "Failed to store description");
                    GenerationOutcome::failed(
                        blocker.id,
                        Stage::Persistence,
                        format!("{}: {}", e.kind(), e),
                    )
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Run `op`, retrying once after the backoff when the error allows it.
    /// Cancellation interrupts both the attempt and the backoff.
    async fn attempt<T, E, F, Fut>(
        &self,
        stage: Stage,
        cancel: &CancellationToken,
        mut op: F,
    ) -> Result<T, StageFailure<E>>
    where
        E: StageError,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut attempt = 1;
        loop {
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(StageFailure::Cancelled),
                result = op() => result,
            };

            match result {
                Ok(value) => return Ok(value),
                Err(e) if attempt < MAX_ATTEMPTS && e.is_retryable() => {
                    tracing::warn!(
                        %stage,
                        attempt,
                        kind = e.kind(),
                        error = %e,
                        "Stage failed, retrying"
                    );
                }
                Err(e) => {
                    tracing::error!(%stage, attempt, kind = e.kind(), error = %e, "Stage failed");
                    return Err(StageFailure::Failed(e));
                }
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(StageFailure::Cancelled),
                _ = tokio::time::sleep(self.retry_backoff) => {}
            }
            attempt += 1;
        }
    }
}

fn failed_outcome<E: StageError>(
    blocker_id: i64,
    stage: Stage,
    failure: StageFailure<E>,
) -> GenerationOutcome {
    match failure {
        StageFailure::Cancelled => {
            tracing::info!(%stage, "Blocker cancelled in flight");
            GenerationOutcome::failed(blocker_id, stage, CANCELLED)
        }
        StageFailure::Failed(e) => {
            GenerationOutcome::failed(blocker_id, stage, format!("{}: {}", e.kind(), e))
        }
    }
}
