use axum::{extract::State, http::header, response::IntoResponse};

use crate::app::AppState;

/// 遷移表の Mermaid 表現。
pub(crate) async fn mermaid(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        state.pipeline().table().to_mermaid(),
    )
}
