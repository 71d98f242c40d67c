//! Handlers for `/surveyAnswers` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/surveyAnswers?survey=<id>` | The caller's own response; 404 if none |
//! | `GET`  | `/surveyAnswers/{id}` | Owner or reviewer; 403 otherwise |
//! | `POST` | `/surveyAnswers` | Owner is always the caller; 400 on any failure |
//! | `PUT`  | `/surveyAnswers/{id}` | Owner only; honours `If-Match`; 400 on any other failure |
//!
//! Bodies are decoded with [`survey_core::codec`], so both answer shapes are
//! accepted and any `user` field in the payload is ignored.

use axum::{
  Json,
  extract::State,
  http::{HeaderMap, StatusCode, header},
  response::IntoResponse,
};
use bytes::Bytes;
use serde::Deserialize;
use survey_core::{codec, response::Response, store::SurveyStore};

use crate::{
  AppState,
  auth::{Authenticated, Role},
  error::ApiError,
  extract::{Path, Query},
  etag::{check_if_match, compute_etag},
};

fn with_etag(status: StatusCode, response: Response) -> impl IntoResponse {
  let etag = compute_etag(&response);
  (status, [(header::ETAG, etag)], Json(response))
}

// ─── Reads ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct OwnParams {
  pub survey: i64,
}

/// `GET /surveyAnswers?survey=<id>`
pub async fn own<S: SurveyStore + 'static>(
  State(state): State<AppState<S>>,
  Authenticated(principal): Authenticated,
  Query(params): Query<OwnParams>,
) -> Result<impl IntoResponse, ApiError> {
  state.auth.require(&principal, Role::User)?;
  let response = state
    .service
    .get_response_by_user_and_survey(&principal.user, params.survey)
    .await?;
  Ok(with_etag(StatusCode::OK, response))
}

/// `GET /surveyAnswers/{id}`
pub async fn get_one<S: SurveyStore + 'static>(
  State(state): State<AppState<S>>,
  Authenticated(principal): Authenticated,
  Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
  state.auth.require(&principal, Role::User)?;
  let response = state.service.get_response(id).await?;
  state.policy.authorize_read(&principal, &response)?;
  Ok(with_etag(StatusCode::OK, response))
}

// ─── Writes ───────────────────────────────────────────────────────────────────

/// `POST /surveyAnswers`
pub async fn create<S: SurveyStore + 'static>(
  State(state): State<AppState<S>>,
  Authenticated(principal): Authenticated,
  body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
  state.auth.require(&principal, Role::User)?;
  let input = codec::decode_response_bytes(&body).map_err(ApiError::client_fault)?;
  let response = state
    .service
    .create_response(&principal.user, input)
    .await
    .map_err(ApiError::client_fault)?;
  Ok(with_etag(StatusCode::CREATED, response))
}

/// `PUT /surveyAnswers/{id}`
///
/// Every check runs before the store is touched: a malformed body, an
/// unknown or foreign response, a mismatched id or a stale `If-Match` leave
/// the stored response unchanged.
pub async fn update<S: SurveyStore + 'static>(
  State(state): State<AppState<S>>,
  Authenticated(principal): Authenticated,
  Path(id): Path<i64>,
  headers: HeaderMap,
  body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
  state.auth.require(&principal, Role::User)?;
  let input = codec::decode_response_bytes(&body).map_err(ApiError::client_fault)?;

  let existing = state
    .service
    .get_response(id)
    .await
    .map_err(ApiError::client_fault)?;
  state
    .policy
    .authorize_write(&principal, &existing)
    .map_err(ApiError::client_fault)?;
  let if_unchanged = check_if_match(&headers, &existing)?;

  let response = state
    .service
    .update_response(&existing, input, if_unchanged)
    .await
    .map_err(|e| {
      tracing::warn!(response = id, error = %e, "response update rejected");
      ApiError::client_fault(e)
    })?;
  Ok(with_etag(StatusCode::CREATED, response))
}
