use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    app::AppState,
    pipeline::{ContentOutcome, ContentRequest, ContentType, Draft},
};

#[derive(Debug, Deserialize)]
pub(crate) struct GenerateRequest {
    #[serde(default)]
    content_type: Option<String>,
    #[serde(default)]
    topic: Option<String>,
}

#[derive(Debug, Serialize)]
struct GenerateResponse {
    content_type: ContentType,
    topic: String,
    score: u8,
    reason: String,
    content: Draft,
    generations: u32,
    best_effort: bool,
    run_id: Uuid,
}

impl From<ContentOutcome> for GenerateResponse {
    fn from(outcome: ContentOutcome) -> Self {
        Self {
            content_type: outcome.content_type,
            topic: outcome.topic,
            score: outcome.score.score,
            reason: outcome.score.reason,
            content: outcome.draft,
            generations: outcome.generations,
            best_effort: outcome.best_effort,
            run_id: outcome.run_id,
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    let body = Json(ErrorResponse {
        error: message.into(),
    });
    (status, body).into_response()
}

pub(crate) async fn generate(
    State(state): State<AppState>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Response {
    let payload = match payload {
        Ok(Json(payload)) => payload,
        Err(rejection) => {
            warn!(error = %rejection, "rejected malformed generate request");
            return error_response(StatusCode::BAD_REQUEST, rejection.body_text());
        }
    };

    let (Some(content_type), Some(topic)) = (
        payload.content_type.filter(|value| !value.is_empty()),
        payload.topic.filter(|value| !value.is_empty()),
    ) else {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Topic and content type are required",
        );
    };

    if content_type.parse::<ContentType>().is_err() {
        return error_response(StatusCode::BAD_REQUEST, "Invalid content type");
    }

    let pipeline = state.pipeline();
    let run_timeout = state.run_timeout();
    let request = ContentRequest::new(content_type, topic);

    match tokio::time::timeout(run_timeout, pipeline.run(request)).await {
        Ok(Ok(outcome)) => {
            info!(
                run_id = %outcome.run_id,
                score = outcome.score.score,
                best_effort = outcome.best_effort,
                "content generated"
            );
            (StatusCode::OK, Json(GenerateResponse::from(outcome))).into_response()
        }
        Ok(Err(error)) if error.is_validation() => {
            error_response(StatusCode::BAD_REQUEST, error.to_string())
        }
        Ok(Err(error)) => {
            error!(error = ?error, "content pipeline aborted");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Content generation failed",
            )
        }
        Err(_) => {
            error!(
                timeout_secs = run_timeout.as_secs_f64(),
                "content pipeline timed out"
            );
            error_response(
                StatusCode::GATEWAY_TIMEOUT,
                "Content generation timed out",
            )
        }
    }
}
