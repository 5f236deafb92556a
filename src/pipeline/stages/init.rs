use tracing::debug;

use crate::pipeline::{
    error::ValidationError,
    models::{ContentRequest, ContentType},
    router::Event,
    state::PipelineState,
};

/// 入力を検証し初期状態を作るエントリーステージ。
///
/// # Errors
/// 未知の `content_type` または空のトピックの場合は [`ValidationError`] を返す。
pub(crate) fn initialize(
    request: &ContentRequest,
) -> Result<(PipelineState, Event), ValidationError> {
    let content_type: ContentType = request.content_type.parse()?;

    let topic = request.topic.trim();
    if topic.is_empty() {
        return Err(ValidationError::EmptyTopic);
    }

    let state = PipelineState::new(content_type, topic.to_string());
    debug!(
        %content_type,
        max_length = state.max_length(),
        "content pipeline initialized"
    );
    Ok((state, Event::Initialized))
}
