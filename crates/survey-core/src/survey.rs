//! Surveys and their ordered question links.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::question::Question;

/// Publication status shared by surveys and questions.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum PublishedState {
  #[default]
  Draft,
  Published,
  Retired,
}

/// A named collection of questions presented to users.
///
/// `canonical_name` is unique across surveys and never changes once the
/// survey is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Survey {
  pub id:               i64,
  pub canonical_name:   String,
  pub title:            Option<String>,
  pub description:      Option<String>,
  pub status:           PublishedState,
  /// Principal that last created or updated the survey.
  pub last_update_user: String,
  pub last_update_date: DateTime<Utc>,
  /// Linked questions ordered by `sequence`.
  pub survey_questions: Vec<SurveyQuestion>,
}

impl Survey {
  pub fn question(&self, question_id: i64) -> Option<&Question> {
    self
      .survey_questions
      .iter()
      .map(|sq| &sq.question)
      .find(|q| q.id == question_id)
  }
}

/// A question as it appears in one survey.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyQuestion {
  pub survey:   i64,
  pub question: Question,
  pub sequence: i32,
  /// Survey-specific label such as `"3"` or `"2b"`.
  pub number:   Option<String>,
}

/// Per-survey placement of a question: the body of the link operation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyQuestionLink {
  #[serde(default)]
  pub sequence: i32,
  #[serde(default)]
  pub number:   Option<String>,
}

/// Payload accepted by survey create and update. The acting principal, not
/// the payload, supplies `last_update_user`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyInput {
  #[serde(default)]
  pub id:             Option<i64>,
  pub canonical_name: String,
  #[serde(default)]
  pub title:          Option<String>,
  #[serde(default)]
  pub description:    Option<String>,
  #[serde(default)]
  pub status:         PublishedState,
}
