use anyhow::{Context, Result, ensure};
use tracing::info;

use crate::pipeline::{
    capability::StageContext, models::ContentType, prompts::build_generation_prompt,
    router::Event, state::PipelineState,
};

/// 初回生成とリビジョンを兼ねる。モードは既存ドラフトの有無で決まる。
pub(crate) async fn generate(
    content_type: ContentType,
    state: PipelineState,
    ctx: &StageContext,
) -> Result<(PipelineState, Event)> {
    ensure!(
        content_type == state.content_type(),
        "generate stage for {content_type} invoked on a {} run",
        state.content_type()
    );

    let prompt = build_generation_prompt(&state)?;
    info!(
        %content_type,
        mode = prompt.mode.as_str(),
        generation = state.generations() + 1,
        "generating draft"
    );

    let draft = ctx
        .generator
        .generate(&prompt.text, content_type)
        .await
        .context("generation capability failed")?;
    let state = state.with_draft(draft)?;

    Ok((state, Event::DraftReady(content_type)))
}
