//! Responses: one user's attempt at one survey.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::codec::{self, AnswerSelection};

/// A persisted response. The owning `user` is fixed at creation from the
/// acting principal and is never taken from a payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
  pub id:         i64,
  pub user:       String,
  pub survey:     i64,
  pub answers:    Vec<ResponseAnswer>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Response {
  pub fn answer_for(&self, question_id: i64) -> Option<&ResponseAnswer> {
    self.answers.iter().find(|ra| ra.question == question_id)
  }
}

/// The selection(s) made for one question. An empty `selected` set means the
/// question was left unanswered.
///
/// On the wire `selected` travels under `answer` in the same two shapes the
/// codec accepts, so a fetched response can be sent back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseAnswer {
  pub id:       i64,
  pub question: i64,
  #[serde(rename = "answer", with = "codec::selection")]
  pub selected: BTreeSet<i64>,
}

impl ResponseAnswer {
  pub fn is_answered(&self) -> bool { !self.selected.is_empty() }
}

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// One decoded `{question, answer}` fragment of a response payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseAnswerInput {
  pub question:  i64,
  pub selection: AnswerSelection,
}

/// A decoded response payload. Built by [`codec::decode_response`]; any
/// `user` field in the payload is discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseInput {
  pub id:      Option<i64>,
  pub survey:  i64,
  pub answers: Vec<ResponseAnswerInput>,
}
