//! Handlers for `/textGroup` endpoints.

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use bytes::Bytes;
use serde::Deserialize;
use survey_core::{store::SurveyStore, text_group::TextGroup};

use crate::{
  AppState, parse_body,
  auth::{Authenticated, Role},
  error::ApiError,
  extract::{Path, Query},
};

/// `POST /textGroup`; replaces the text of an existing key and variant.
pub async fn create<S: SurveyStore + 'static>(
  State(state): State<AppState<S>>,
  Authenticated(principal): Authenticated,
  body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
  state.auth.require(&principal, Role::Admin)?;
  let entry: TextGroup = parse_body(&body)?;
  let entry = state.service.create_text_group(entry).await?;
  Ok((StatusCode::CREATED, Json(entry)))
}

#[derive(Debug, Deserialize)]
pub struct VariantParams {
  pub variant: Option<String>,
}

/// `GET /textGroup/{key}[?variant=<name>]`, variant defaulting to
/// [`DEFAULT_VARIANT`](survey_core::text_group::DEFAULT_VARIANT).
pub async fn get_one<S: SurveyStore + 'static>(
  State(state): State<AppState<S>>,
  Authenticated(principal): Authenticated,
  Path(key): Path<String>,
  Query(params): Query<VariantParams>,
) -> Result<Json<TextGroup>, ApiError> {
  state.auth.require(&principal, Role::User)?;
  let entry = state
    .service
    .get_text_group(&key, params.variant.as_deref())
    .await?;
  Ok(Json(entry))
}
