//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings, publication status is its upper-case
//! name, and response selections are compact JSON arrays of answer ids.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use survey_core::{
  question::{Question, QuestionAnswer},
  response::{Response, ResponseAnswer},
  survey::{PublishedState, Survey, SurveyQuestion},
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── PublishedState ──────────────────────────────────────────────────────────

pub fn encode_status(s: PublishedState) -> String { s.to_string() }

pub fn decode_status(s: &str) -> Result<PublishedState> {
  s.parse().map_err(|_| Error::UnknownStatus(s.to_owned()))
}

// ─── Selections ──────────────────────────────────────────────────────────────

pub fn encode_ids(ids: &BTreeSet<i64>) -> Result<String> {
  Ok(serde_json::to_string(ids)?)
}

pub fn decode_ids(s: &str) -> Result<BTreeSet<i64>> { Ok(serde_json::from_str(s)?) }

// ─── Row types ───────────────────────────────────────────────────────────────

/// A `questions` row plus its already-typed answer links.
pub struct RawQuestion {
  pub id:               i64,
  pub text:             String,
  pub alt_text:         Option<String>,
  pub help_text:        Option<String>,
  pub canonical_name:   Option<String>,
  pub status:           String,
  pub question_answers: Vec<QuestionAnswer>,
}

impl RawQuestion {
  pub fn into_question(self) -> Result<Question> {
    Ok(Question {
      id:               self.id,
      text:             self.text,
      alt_text:         self.alt_text,
      help_text:        self.help_text,
      canonical_name:   self.canonical_name,
      status:           decode_status(&self.status)?,
      question_answers: self.question_answers,
    })
  }
}

pub struct RawSurveyQuestion {
  pub survey:   i64,
  pub sequence: i32,
  pub number:   Option<String>,
  pub question: RawQuestion,
}

impl RawSurveyQuestion {
  pub fn into_survey_question(self) -> Result<SurveyQuestion> {
    Ok(SurveyQuestion {
      survey:   self.survey,
      question: self.question.into_question()?,
      sequence: self.sequence,
      number:   self.number,
    })
  }
}

pub struct RawSurvey {
  pub id:               i64,
  pub canonical_name:   String,
  pub title:            Option<String>,
  pub description:      Option<String>,
  pub status:           String,
  pub last_update_user: String,
  pub last_update_date: String,
  pub survey_questions: Vec<RawSurveyQuestion>,
}

impl RawSurvey {
  pub fn into_survey(self) -> Result<Survey> {
    Ok(Survey {
      id:               self.id,
      canonical_name:   self.canonical_name,
      title:            self.title,
      description:      self.description,
      status:           decode_status(&self.status)?,
      last_update_user: self.last_update_user,
      last_update_date: decode_dt(&self.last_update_date)?,
      survey_questions: self
        .survey_questions
        .into_iter()
        .map(RawSurveyQuestion::into_survey_question)
        .collect::<Result<_>>()?,
    })
  }
}

pub struct RawResponseAnswer {
  pub id:         i64,
  pub question:   i64,
  pub answer_ids: String,
}

pub struct RawResponse {
  pub id:         i64,
  pub owner:      String,
  pub survey:     i64,
  pub created_at: String,
  pub updated_at: String,
  pub answers:    Vec<RawResponseAnswer>,
}

impl RawResponse {
  pub fn into_response(self) -> Result<Response> {
    let answers = self
      .answers
      .into_iter()
      .map(|ra| {
        Ok(ResponseAnswer {
          id:       ra.id,
          question: ra.question,
          selected: decode_ids(&ra.answer_ids)?,
        })
      })
      .collect::<Result<_>>()?;

    Ok(Response {
      id: self.id,
      user: self.owner,
      survey: self.survey,
      answers,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn status_uses_upper_case_names() {
    assert_eq!(encode_status(PublishedState::Published), "PUBLISHED");
    assert_eq!(decode_status("RETIRED").unwrap(), PublishedState::Retired);
    assert!(matches!(decode_status("archived"), Err(Error::UnknownStatus(_))));
  }

  #[test]
  fn selections_are_json_arrays() {
    let ids = BTreeSet::from([6, 5]);
    assert_eq!(encode_ids(&ids).unwrap(), "[5,6]");
    assert_eq!(decode_ids("[]").unwrap(), BTreeSet::new());
  }
}
