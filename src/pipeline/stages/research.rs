use anyhow::{Context, Result, ensure};
use tracing::info;

use crate::pipeline::{capability::StageContext, router::Event, state::PipelineState};

pub(crate) async fn research(
    state: PipelineState,
    ctx: &StageContext,
) -> Result<(PipelineState, Event)> {
    info!(topic = %state.topic(), "conducting research");

    let research = ctx
        .researcher
        .research(state.topic())
        .await
        .context("research capability failed")?;
    ensure!(
        !research.trim().is_empty(),
        "research capability returned empty text"
    );

    info!(chars = research.chars().count(), "research collected");
    Ok((state.with_research(research), Event::ResearchDone))
}
