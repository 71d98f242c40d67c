//! Handlers for `/questions` endpoints.

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use bytes::Bytes;
use survey_core::{question::QuestionInput, store::SurveyStore};

use crate::{
  AppState, parse_body,
  auth::{Authenticated, Role},
  error::ApiError,
  extract::Path,
};

/// `POST /questions`
pub async fn create<S: SurveyStore + 'static>(
  State(state): State<AppState<S>>,
  Authenticated(principal): Authenticated,
  body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
  state.auth.require(&principal, Role::Admin)?;
  let input: QuestionInput = parse_body(&body)?;
  let question = state.service.create_question(input).await?;
  Ok((StatusCode::CREATED, Json(question)))
}

/// `PUT /questions/{id}`; a missing question is a bad request here.
pub async fn update<S: SurveyStore + 'static>(
  State(state): State<AppState<S>>,
  Authenticated(principal): Authenticated,
  Path(id): Path<i64>,
  body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
  state.auth.require(&principal, Role::Admin)?;
  let input: QuestionInput = parse_body(&body)?;
  let question = state
    .service
    .update_question(id, input)
    .await
    .map_err(ApiError::client_fault)?;
  tracing::info!(question = id, user = %principal.user, "question updated");
  Ok((StatusCode::CREATED, Json(question)))
}
