/// Prometheusメトリクス定義。
use std::sync::Arc;
use std::time::Duration;

use prometheus::{
    Counter, CounterVec, Histogram, HistogramVec, Registry, register_counter_vec_with_registry,
    register_counter_with_registry, register_histogram_vec_with_registry,
    register_histogram_with_registry,
};

/// メトリクスコレクター。
#[derive(Debug, Clone)]
pub struct Metrics {
    // カウンター
    pub runs_started: Counter,
    pub runs_completed: Counter,
    pub runs_best_effort: Counter,
    pub runs_failed: CounterVec,
    pub generations: Counter,
    pub regenerations: Counter,
    pub scoring_passes: CounterVec,
    pub capability_failures: CounterVec,

    // ヒストグラム
    pub run_duration: Histogram,
    pub stage_duration: HistogramVec,
}

impl Metrics {
    /// 新しいメトリクスコレクターを作成する。
    pub fn new(registry: Arc<Registry>) -> Result<Self, prometheus::Error> {
        Ok(Self {
            runs_started: register_counter_with_registry!(
                "content_pipeline_runs_started_total",
                "Total number of pipeline runs started",
                registry
            )?,
            runs_completed: register_counter_with_registry!(
                "content_pipeline_runs_completed_total",
                "Total number of pipeline runs that reached a terminal stage",
                registry
            )?,
            runs_best_effort: register_counter_with_registry!(
                "content_pipeline_runs_best_effort_total",
                "Runs finalized after exhausting the regeneration budget",
                registry
            )?,
            runs_failed: register_counter_vec_with_registry!(
                "content_pipeline_runs_failed_total",
                "Total number of aborted pipeline runs by reason",
                &["reason"],
                registry
            )?,
            generations: register_counter_with_registry!(
                "content_pipeline_generations_total",
                "Total number of generate passes in completed runs",
                registry
            )?,
            regenerations: register_counter_with_registry!(
                "content_pipeline_regenerations_total",
                "Total number of revision passes in completed runs",
                registry
            )?,
            scoring_passes: register_counter_vec_with_registry!(
                "content_pipeline_scoring_passes_total",
                "Total number of scoring passes by scorer",
                &["scorer"],
                registry
            )?,
            capability_failures: register_counter_vec_with_registry!(
                "content_pipeline_capability_failures_total",
                "Stage failures by stage",
                &["stage"],
                registry
            )?,
            run_duration: register_histogram_with_registry!(
                "content_pipeline_run_duration_seconds",
                "Duration of entire pipeline runs",
                registry
            )?,
            stage_duration: register_histogram_vec_with_registry!(
                "content_pipeline_stage_duration_seconds",
                "Duration of individual stages",
                &["stage"],
                registry
            )?,
        })
    }

    pub fn observe_stage(&self, stage: &str, elapsed: Duration) {
        self.stage_duration
            .with_label_values(&[stage])
            .observe(elapsed.as_secs_f64());
    }
}
