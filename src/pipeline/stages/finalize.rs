use anyhow::{Result, anyhow};
use tracing::info;

use crate::pipeline::{
    models::{Draft, Score},
    state::PipelineState,
};

/// 終端ステージが返す完成品。
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FinalizedContent {
    pub(crate) draft: Draft,
    pub(crate) score: Score,
    pub(crate) generations: u32,
    pub(crate) best_effort: bool,
}

pub(crate) fn finalize(state: PipelineState, best_effort: bool) -> Result<FinalizedContent> {
    let content_type = state.content_type();
    let generations = state.generations();
    let (draft, score) = state.into_parts();
    let draft = draft.ok_or_else(|| anyhow!("finalize reached without a draft"))?;
    let score = score.ok_or_else(|| anyhow!("finalize reached without a score"))?;

    info!(
        %content_type,
        headline = %draft.headline(),
        score = score.score,
        generations,
        best_effort,
        "content ready for publication"
    );

    Ok(FinalizedContent {
        draft,
        score,
        generations,
        best_effort,
    })
}
