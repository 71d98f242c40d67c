//! JSON REST API for the survey service.
//!
//! Exposes an axum [`Router`] backed by any [`SurveyStore`]. The caller's
//! identity and roles arrive as trusted headers from the host portal (see
//! [`auth`]); TLS and transport concerns belong to the binary.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/v1/surveys", survey_api::api_router(state))
//! ```

pub mod auth;
pub mod error;
pub mod etag;
pub mod extract;
pub mod questions;
pub mod reports;
pub mod responses;
pub mod surveys;
pub mod text_groups;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post, put},
};
use bytes::Bytes;
use serde::de::DeserializeOwned;
use survey_core::{
  access::AccessPolicy, report::ReportRegistry, service::SurveyService, store::SurveyStore,
};

pub use auth::AuthConfig;
pub use error::ApiError;

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all handlers. Everything in it is read-only
/// after startup.
pub struct AppState<S> {
  pub service: Arc<SurveyService<S>>,
  pub policy:  Arc<AccessPolicy>,
  pub reports: Arc<ReportRegistry>,
  pub auth:    Arc<AuthConfig>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      service: self.service.clone(),
      policy:  self.policy.clone(),
      reports: self.reports.clone(),
      auth:    self.auth.clone(),
    }
  }
}

impl<S: SurveyStore> AppState<S> {
  pub fn new(
    store: S,
    policy: AccessPolicy,
    reports: ReportRegistry,
    auth: AuthConfig,
  ) -> Self {
    Self {
      service: Arc::new(SurveyService::new(store)),
      policy:  Arc::new(policy),
      reports: Arc::new(reports),
      auth:    Arc::new(auth),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: AppState<S>) -> Router<()>
where
  S: SurveyStore + 'static,
{
  Router::new()
    // Surveys
    .route("/", get(surveys::list::<S>).post(surveys::create::<S>))
    .route("/{id}", get(surveys::get_one::<S>).put(surveys::update::<S>))
    .route("/surveyByName/{name}", get(surveys::get_by_name::<S>))
    .route("/{id}/questions", get(surveys::questions::<S>))
    .route("/{id}/questions/{question}", post(surveys::link_question::<S>))
    .route("/{id}/summary", get(surveys::summary::<S>))
    // Questions
    .route("/questions", post(questions::create::<S>))
    .route("/questions/{id}", put(questions::update::<S>))
    // Text groups
    .route("/textGroup", post(text_groups::create::<S>))
    .route("/textGroup/{key}", get(text_groups::get_one::<S>))
    // Responses
    .route("/surveyAnswers", get(responses::own::<S>).post(responses::create::<S>))
    .route("/surveyAnswers/{id}", get(responses::get_one::<S>).put(responses::update::<S>))
    // Reports
    .route("/surveyReport/{id}", get(reports::get_one::<S>))
    .with_state(state)
}

/// Deserialise a JSON request body, reporting every failure as 400.
pub(crate) fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, ApiError> {
  serde_json::from_slice(body).map_err(|e| ApiError::BadRequest(format!("invalid body: {e}")))
}
