//! Questions and the answer options they offer.
//!
//! Answers are shared: the same [`Answer`] row may be offered by several
//! questions, each link carrying its own display sequence. Questions are in
//! turn shared between surveys (see [`crate::survey::SurveyQuestion`]).

use serde::{Deserialize, Serialize};

use crate::survey::PublishedState;

// ─── Answers ─────────────────────────────────────────────────────────────────

/// A selectable answer option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
  pub id:       i64,
  pub text:     String,
  pub alt_text: Option<String>,
}

/// An answer as offered by one particular question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionAnswer {
  pub answer:   Answer,
  pub sequence: i32,
}

// ─── Question ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
  pub id:               i64,
  pub text:             String,
  pub alt_text:         Option<String>,
  pub help_text:        Option<String>,
  pub canonical_name:   Option<String>,
  pub status:           PublishedState,
  /// Offered answers ordered by `sequence`.
  pub question_answers: Vec<QuestionAnswer>,
}

impl Question {
  pub fn offers(&self, answer_id: i64) -> bool {
    self.question_answers.iter().any(|qa| qa.answer.id == answer_id)
  }

  pub fn answer_text(&self, answer_id: i64) -> Option<&str> {
    self
      .question_answers
      .iter()
      .find(|qa| qa.answer.id == answer_id)
      .map(|qa| qa.answer.text.as_str())
  }
}

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// An answer option in a question payload. With an `id` the existing shared
/// answer is linked and its text replaced; without one a new answer is
/// created.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerInput {
  #[serde(default)]
  pub id:       Option<i64>,
  pub text:     String,
  #[serde(default)]
  pub alt_text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuestionAnswerInput {
  pub answer:   AnswerInput,
  #[serde(default)]
  pub sequence: i32,
}

/// Payload accepted by question create and update. Updates replace every
/// mutable field, including the answer links.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionInput {
  #[serde(default)]
  pub id:               Option<i64>,
  pub text:             String,
  #[serde(default)]
  pub alt_text:         Option<String>,
  #[serde(default)]
  pub help_text:        Option<String>,
  #[serde(default)]
  pub canonical_name:   Option<String>,
  #[serde(default)]
  pub status:           PublishedState,
  #[serde(default)]
  pub question_answers: Vec<QuestionAnswerInput>,
}
