//! Handlers for survey endpoints.
//!
//! | Method | Path | Role | Notes |
//! |--------|------|------|-------|
//! | `GET`  | `/` | user | All surveys |
//! | `POST` | `/` | admin | 201; 400 on any failure |
//! | `GET`  | `/{id}` | user | 404 if not found |
//! | `PUT`  | `/{id}` | admin | 201; 400 on any failure |
//! | `GET`  | `/surveyByName/{name}` | user | 404 if not found |
//! | `GET`  | `/{id}/questions` | user | Ordered by sequence |
//! | `POST` | `/{id}/questions/{question}` | admin | Body: `{"sequence":1,"number":"1"}`, optional |
//! | `GET`  | `/{id}/summary` | admin | Answer distribution |

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use bytes::Bytes;
use survey_core::{
  store::SurveyStore,
  summary::SurveySummary,
  survey::{Survey, SurveyInput, SurveyQuestion, SurveyQuestionLink},
};

use crate::{
  AppState, parse_body,
  auth::{Authenticated, Role},
  error::ApiError,
  extract::Path,
};

// ─── Reads ────────────────────────────────────────────────────────────────────

/// `GET /`
pub async fn list<S: SurveyStore + 'static>(
  State(state): State<AppState<S>>,
  Authenticated(principal): Authenticated,
) -> Result<Json<Vec<Survey>>, ApiError> {
  state.auth.require(&principal, Role::User)?;
  Ok(Json(state.service.list_surveys().await?))
}

/// `GET /{id}`
pub async fn get_one<S: SurveyStore + 'static>(
  State(state): State<AppState<S>>,
  Authenticated(principal): Authenticated,
  Path(id): Path<i64>,
) -> Result<Json<Survey>, ApiError> {
  state.auth.require(&principal, Role::User)?;
  Ok(Json(state.service.get_survey(id).await?))
}

/// `GET /surveyByName/{name}`
pub async fn get_by_name<S: SurveyStore + 'static>(
  State(state): State<AppState<S>>,
  Authenticated(principal): Authenticated,
  Path(name): Path<String>,
) -> Result<Json<Survey>, ApiError> {
  state.auth.require(&principal, Role::User)?;
  Ok(Json(state.service.get_survey_by_name(&name).await?))
}

/// `GET /{id}/questions`
pub async fn questions<S: SurveyStore + 'static>(
  State(state): State<AppState<S>>,
  Authenticated(principal): Authenticated,
  Path(id): Path<i64>,
) -> Result<Json<Vec<SurveyQuestion>>, ApiError> {
  state.auth.require(&principal, Role::User)?;
  Ok(Json(state.service.get_survey_questions(id).await?))
}

/// `GET /{id}/summary`
pub async fn summary<S: SurveyStore + 'static>(
  State(state): State<AppState<S>>,
  Authenticated(principal): Authenticated,
  Path(id): Path<i64>,
) -> Result<Json<SurveySummary>, ApiError> {
  state.auth.require(&principal, Role::Admin)?;
  Ok(Json(state.service.get_survey_summary(id).await?))
}

// ─── Writes ───────────────────────────────────────────────────────────────────

/// `POST /`
pub async fn create<S: SurveyStore + 'static>(
  State(state): State<AppState<S>>,
  Authenticated(principal): Authenticated,
  body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
  state.auth.require(&principal, Role::Admin)?;
  let input: SurveyInput = parse_body(&body)?;
  let survey = state
    .service
    .create_survey(input, &principal.user)
    .await
    .map_err(ApiError::client_fault)?;
  Ok((StatusCode::CREATED, Json(survey)))
}

/// `PUT /{id}`
pub async fn update<S: SurveyStore + 'static>(
  State(state): State<AppState<S>>,
  Authenticated(principal): Authenticated,
  Path(id): Path<i64>,
  body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
  state.auth.require(&principal, Role::Admin)?;
  let input: SurveyInput = parse_body(&body)?;
  let survey = state
    .service
    .update_survey(id, input, &principal.user)
    .await
    .map_err(ApiError::client_fault)?;
  tracing::info!(survey = id, user = %principal.user, "survey updated");
  Ok((StatusCode::CREATED, Json(survey)))
}

/// `POST /{id}/questions/{question}`; an empty body links with default
/// placement.
pub async fn link_question<S: SurveyStore + 'static>(
  State(state): State<AppState<S>>,
  Authenticated(principal): Authenticated,
  Path((id, question)): Path<(i64, i64)>,
  body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
  state.auth.require(&principal, Role::Admin)?;
  let link: SurveyQuestionLink = if body.is_empty() {
    SurveyQuestionLink::default()
  } else {
    parse_body(&body)?
  };
  state
    .service
    .add_question_to_survey(id, question, link)
    .await
    .map_err(ApiError::client_fault)?;
  Ok((StatusCode::CREATED, Json(true)))
}
