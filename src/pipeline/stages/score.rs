use anyhow::{Context, Result, anyhow};
use tracing::info;

use crate::pipeline::{
    capability::{ScoreRequest, StageContext},
    models::ScoreKind,
    router::Event,
    state::PipelineState,
};

/// SEO とバイラリティの両採点器で共通。どちらも `ScoreReady` を発行する。
pub(crate) async fn score(
    kind: ScoreKind,
    state: PipelineState,
    ctx: &StageContext,
) -> Result<(PipelineState, Event)> {
    let draft = state
        .draft()
        .ok_or_else(|| anyhow!("no draft available for {} check", kind.as_str()))?;
    let content = draft
        .to_json()
        .context("failed to serialize draft for scoring")?;

    info!(kind = kind.as_str(), content_type = %state.content_type(), "running quality check");

    let request = ScoreRequest {
        content_type: state.content_type(),
        content: &content,
        topic: state.topic(),
    };
    let score = ctx
        .scorer
        .score(kind, &request)
        .await
        .with_context(|| format!("{} scoring capability failed", kind.as_str()))?;

    info!(
        kind = kind.as_str(),
        score = score.score,
        reason = %score.reason,
        "quality check complete"
    );
    Ok((state.with_score(score), Event::ScoreReady))
}
