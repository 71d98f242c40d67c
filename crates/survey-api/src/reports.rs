//! Handler for `GET /surveyReport/{id}`: the rendered report of one response.
//!
//! Readable by the response owner and by reviewers. The strategy is chosen
//! by the survey's canonical name through the configured
//! [`ReportRegistry`](survey_core::report::ReportRegistry); a survey with no
//! strategy is a server configuration fault (500).

use axum::{
  Json,
  extract::State,
};
use survey_core::{report::RenderableReport, store::SurveyStore};

use crate::{
  AppState,
  auth::{Authenticated, Role},
  error::ApiError,
  extract::Path,
};

pub async fn get_one<S: SurveyStore + 'static>(
  State(state): State<AppState<S>>,
  Authenticated(principal): Authenticated,
  Path(id): Path<i64>,
) -> Result<Json<RenderableReport>, ApiError> {
  state.auth.require(&principal, Role::User)?;
  let response = state.service.get_response(id).await?;
  state.policy.authorize_read(&principal, &response)?;

  let survey = state.service.get_survey(response.survey).await?;
  let report = state.reports.generate(&survey, &response)?;
  tracing::debug!(response = id, strategy = %report.strategy, "report rendered");
  Ok(Json(report))
}
