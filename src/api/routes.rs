//! HTTP route handlers for Axum.

use axum::{extract::State, http::StatusCode, Json};
use tracing::warn;

use crate::{
    api::types::{
        DistractorDto, DistractorRequest, HealthDto, KeywordDto, KeywordRequest, SummaryDto,
        SummaryRequest,
    },
    error::SummarizeError,
    nlp::{
        distractors::DistractorOutcome, keywords::common_keywords, summarizer::SummaryParams,
    },
};

use super::AppState;

type ApiResult<T> = Result<Json<T>, (StatusCode, String)>;

pub async fn health(State(state): State<AppState>) -> Json<HealthDto> {
    Json(HealthDto {
        status: "ok",
        summaries: state.pipelines.summarizer.is_ok(),
    })
}

pub async fn distractors(
    State(state): State<AppState>,
    Json(request): Json<DistractorRequest>,
) -> ApiResult<DistractorDto> {
    let generator = state.pipelines.distractors.clone();
    let answer = request.answer.clone();
    let outcome = tokio::task::spawn_blocking(move || generator.generate(&answer))
        .await
        .map_err(|err| (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?;

    let dto = match outcome {
        DistractorOutcome::Distractors { distractors } => DistractorDto {
            answer: request.answer,
            distractors: Some(distractors),
            reason: None,
        },
        DistractorOutcome::NoDistractors { reason } => DistractorDto {
            answer: request.answer,
            distractors: None,
            reason: Some(reason),
        },
    };
    Ok(Json(dto))
}

pub async fn keywords(
    State(state): State<AppState>,
    Json(request): Json<KeywordRequest>,
) -> ApiResult<KeywordDto> {
    let shared = common_keywords(
        state.pipelines.keywords.as_ref(),
        &request.original,
        &request.summarized,
    )
    .map_err(|err| (StatusCode::SERVICE_UNAVAILABLE, err.to_string()))?;
    Ok(Json(KeywordDto {
        keywords: shared.into_iter().collect(),
    }))
}

pub async fn summarize(
    State(state): State<AppState>,
    Json(request): Json<SummaryRequest>,
) -> ApiResult<SummaryDto> {
    let summarizer = state.pipelines.summarizer().map_err(status_for)?;
    let params = request.params(SummaryParams::from_settings(&state.settings));
    let summary = summarizer
        .summarize(&request.text, &params)
        .await
        .map_err(status_for)?;
    Ok(Json(SummaryDto { summary }))
}

fn status_for(err: SummarizeError) -> (StatusCode, String) {
    match err {
        SummarizeError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        SummarizeError::ModelUnavailable(_) => {
            warn!(%err, "summary request failed");
            (StatusCode::SERVICE_UNAVAILABLE, err.to_string())
        }
    }
}
