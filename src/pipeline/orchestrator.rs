//! Pipeline orchestrator: drives the frontier loop over the transition table.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use super::{
    capability::StageContext,
    error::PipelineError,
    executor::{StageExecutor, StageOutcome},
    models::{ContentRequest, ContentType, Draft, Score, ScoreKind},
    router::{Event, Stage, TableError, TransitionTable},
    stages::{QualityPolicy, init::initialize},
};
use crate::observability::metrics::Metrics;

/// Result of a run that reached a terminal stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentOutcome {
    pub run_id: Uuid,
    pub content_type: ContentType,
    pub topic: String,
    pub draft: Draft,
    pub score: Score,
    pub generations: u32,
    /// Finalized after the regeneration budget ran out, below the threshold.
    pub best_effort: bool,
    /// Stages in execution order, `init` first.
    pub trace: Vec<Stage>,
}

/// Core pipeline orchestrator. Shared read-only across runs.
pub struct ContentPipeline {
    table: TransitionTable,
    context: StageContext,
    policy: QualityPolicy,
    metrics: Option<Arc<Metrics>>,
}

impl ContentPipeline {
    /// Builds the pipeline with the standard wiring.
    ///
    /// # Errors
    /// Returns [`TableError`] when the wiring fails startup validation.
    pub fn new(context: StageContext, policy: QualityPolicy) -> Result<Self, TableError> {
        Self::with_table(TransitionTable::content_pipeline(), context, policy)
    }

    /// # Errors
    /// Returns [`TableError`] when `table` fails validation.
    pub fn with_table(
        table: TransitionTable,
        context: StageContext,
        policy: QualityPolicy,
    ) -> Result<Self, TableError> {
        table.validate()?;
        Ok(Self {
            table,
            context,
            policy,
            metrics: None,
        })
    }

    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    #[must_use]
    pub fn table(&self) -> &TransitionTable {
        &self.table
    }

    #[must_use]
    pub fn policy(&self) -> QualityPolicy {
        self.policy
    }

    /// Execute one run to completion.
    ///
    /// # Errors
    /// Any stage failure aborts the run; there is no partial result.
    pub async fn run(&self, request: ContentRequest) -> Result<ContentOutcome, PipelineError> {
        let run_id = Uuid::new_v4();
        let span = info_span!(
            "content_pipeline",
            %run_id,
            content_type = %request.content_type
        );
        if let Some(metrics) = &self.metrics {
            metrics.runs_started.inc();
        }

        let started = Instant::now();
        let result = self.drive(run_id, &request).instrument(span).await;

        if let Some(metrics) = &self.metrics {
            metrics.run_duration.observe(started.elapsed().as_secs_f64());
            match &result {
                Ok(outcome) => {
                    metrics.runs_completed.inc();
                    if outcome.best_effort {
                        metrics.runs_best_effort.inc();
                    }
                    metrics.generations.inc_by(f64::from(outcome.generations));
                    metrics
                        .regenerations
                        .inc_by(f64::from(outcome.generations.saturating_sub(1)));
                }
                Err(error) => {
                    metrics.runs_failed.with_label_values(&[error.kind()]).inc();
                }
            }
        }
        result
    }

    async fn drive(
        &self,
        run_id: Uuid,
        request: &ContentRequest,
    ) -> Result<ContentOutcome, PipelineError> {
        debug!("content pipeline started");
        let (mut state, event) = initialize(request).inspect_err(|error| {
            warn!(%error, "rejected content request");
        })?;
        let content_type = state.content_type();
        let topic = state.topic().to_string();

        let executor = StageExecutor::new(&self.context, &self.policy);
        let limit = self.policy.step_limit();
        let mut trace = vec![Stage::Init];
        let mut events: Vec<Event> = vec![event];
        let mut steps = 0usize;
        let mut last_stage = Stage::Init;

        loop {
            let frontier: Vec<Stage> = events
                .iter()
                .flat_map(|event| self.table.resolve(*event, &state))
                .collect();
            if frontier.is_empty() {
                warn!(%last_stage, "no stage listens to the emitted events");
                return Err(PipelineError::Stalled { last_stage });
            }
            debug!(
                events = ?events.iter().map(ToString::to_string).collect::<Vec<_>>(),
                frontier = ?frontier.iter().map(|s| s.label()).collect::<Vec<_>>(),
                "dispatching frontier"
            );

            events = Vec::with_capacity(frontier.len());
            for stage in frontier {
                if steps >= limit {
                    warn!(limit, "step ceiling reached");
                    return Err(PipelineError::StepLimitExceeded { limit });
                }
                steps += 1;
                trace.push(stage);
                last_stage = stage;

                let stage_started = Instant::now();
                let outcome = executor.execute(stage, state).await;
                self.record_stage(stage, stage_started, outcome.is_ok());

                match outcome? {
                    StageOutcome::Continue { state: next, event } => {
                        debug!(stage = %stage, %event, "stage completed");
                        state = next;
                        events.push(event);
                    }
                    StageOutcome::Finished(content) => {
                        info!(
                            stage = %stage,
                            score = content.score.score,
                            generations = content.generations,
                            best_effort = content.best_effort,
                            steps,
                            "content pipeline completed"
                        );
                        return Ok(ContentOutcome {
                            run_id,
                            content_type,
                            topic,
                            draft: content.draft,
                            score: content.score,
                            generations: content.generations,
                            best_effort: content.best_effort,
                            trace,
                        });
                    }
                }
            }
        }
    }

    fn record_stage(&self, stage: Stage, started: Instant, succeeded: bool) {
        let Some(metrics) = &self.metrics else {
            return;
        };
        metrics.observe_stage(stage.label(), started.elapsed());
        if !succeeded {
            metrics
                .capability_failures
                .with_label_values(&[stage.label()])
                .inc();
            return;
        }
        let scorer = match stage {
            Stage::ScoreSeo => ScoreKind::Seo,
            Stage::ScoreVirality => ScoreKind::Virality,
            _ => return,
        };
        metrics
            .scoring_passes
            .with_label_values(&[scorer.as_str()])
            .inc();
    }
}
