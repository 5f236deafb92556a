use anyhow::{Result, anyhow};
use tracing::info;

use crate::pipeline::{router::Event, state::PipelineState};

pub const DEFAULT_QUALITY_THRESHOLD: u8 = 7;
pub const DEFAULT_MAX_REGENERATIONS: u32 = 3;

/// 品質ゲートの閾値と再生成の上限。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QualityPolicy {
    /// これ以上のスコアで合格（境界値を含む）。
    pub threshold: u8,
    pub max_regenerations: u32,
}

impl Default for QualityPolicy {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_QUALITY_THRESHOLD,
            max_regenerations: DEFAULT_MAX_REGENERATIONS,
        }
    }
}

impl QualityPolicy {
    #[must_use]
    pub const fn new(threshold: u8, max_regenerations: u32) -> Self {
        Self {
            threshold,
            max_regenerations,
        }
    }

    /// 正常な実行がとりうる最大ステップ数。
    /// research + (generate, score, gate) × 生成回数 + finalize。
    #[must_use]
    pub fn step_limit(&self) -> usize {
        let generations = usize::try_from(self.max_regenerations)
            .unwrap_or(usize::MAX)
            .saturating_add(1);
        generations.saturating_mul(3).saturating_add(2)
    }
}

pub(crate) fn evaluate(state: &PipelineState, policy: &QualityPolicy) -> Result<Event> {
    let score = state
        .score()
        .ok_or_else(|| anyhow!("quality gate reached without a score"))?;
    let content_type = state.content_type();

    if score.score >= policy.threshold {
        info!(
            %content_type,
            score = score.score,
            threshold = policy.threshold,
            "score passed threshold, proceeding to finalize"
        );
        return Ok(Event::CheckPassed);
    }

    if state.regenerations() >= policy.max_regenerations {
        info!(
            %content_type,
            score = score.score,
            threshold = policy.threshold,
            regenerations = state.regenerations(),
            "regeneration budget exhausted, finalizing best effort"
        );
        return Ok(Event::RegenerationBudgetExhausted);
    }

    info!(
        %content_type,
        score = score.score,
        threshold = policy.threshold,
        "score below threshold, regenerating"
    );
    Ok(Event::Regenerate(content_type))
}
