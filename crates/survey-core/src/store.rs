//! The `SurveyStore` trait: the persistence collaborator behind
//! [`crate::service::SurveyService`].
//!
//! Implemented by storage backends (e.g. `survey-store-sqlite`). The store
//! assigns ids and timestamps, and makes each write atomic; it performs no
//! authorisation and only the uniqueness checks noted per method.
//!
//! Concurrent updates to the same row are last-writer-wins unless the
//! caller makes the update conditional (see [`SurveyStore::update_response`]).

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::{
  question::{Answer, Question, QuestionInput},
  response::{Response, ResponseInput},
  survey::{Survey, SurveyInput, SurveyQuestion, SurveyQuestionLink},
  text_group::TextGroup,
};

/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait SurveyStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Questions and answers ─────────────────────────────────────────────

  /// Persist a question and its answer links. Answers without an id are
  /// created; answers with an id must exist and have their text replaced.
  /// `input.id` is ignored.
  fn insert_question(
    &self,
    input: QuestionInput,
  ) -> impl Future<Output = Result<Question, Self::Error>> + Send + '_;

  fn get_question(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<Question>, Self::Error>> + Send + '_;

  /// Replace every mutable field of question `id`, including its answer
  /// links. Returns `None` if the question does not exist.
  fn update_question(
    &self,
    id: i64,
    input: QuestionInput,
  ) -> impl Future<Output = Result<Option<Question>, Self::Error>> + Send + '_;

  fn get_answer(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<Answer>, Self::Error>> + Send + '_;

  // ── Surveys ───────────────────────────────────────────────────────────

  /// Persist a survey. Returns `None` without writing if the canonical name
  /// is already taken.
  fn insert_survey(
    &self,
    input: SurveyInput,
    last_update_user: String,
  ) -> impl Future<Output = Result<Option<Survey>, Self::Error>> + Send + '_;

  fn get_survey(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<Survey>, Self::Error>> + Send + '_;

  fn get_survey_by_name<'a>(
    &'a self,
    canonical_name: &'a str,
  ) -> impl Future<Output = Result<Option<Survey>, Self::Error>> + Send + 'a;

  fn list_surveys(
    &self,
  ) -> impl Future<Output = Result<Vec<Survey>, Self::Error>> + Send + '_;

  /// Replace the mutable fields of survey `id`; the canonical name is left
  /// untouched. Returns `None` if the survey does not exist.
  fn update_survey(
    &self,
    id: i64,
    input: SurveyInput,
    last_update_user: String,
  ) -> impl Future<Output = Result<Option<Survey>, Self::Error>> + Send + '_;

  /// Questions linked to `survey_id`, ordered by sequence.
  fn survey_questions(
    &self,
    survey_id: i64,
  ) -> impl Future<Output = Result<Vec<SurveyQuestion>, Self::Error>> + Send + '_;

  /// Create the `(survey, question)` link, or overwrite its placement if it
  /// already exists.
  fn link_question(
    &self,
    survey_id: i64,
    question_id: i64,
    link: SurveyQuestionLink,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Text groups ───────────────────────────────────────────────────────

  /// Insert or replace the text stored under `(key, variant)`.
  fn upsert_text_group(
    &self,
    entry: TextGroup,
  ) -> impl Future<Output = Result<TextGroup, Self::Error>> + Send + '_;

  fn get_text_group<'a>(
    &'a self,
    key: &'a str,
    variant: &'a str,
  ) -> impl Future<Output = Result<Option<TextGroup>, Self::Error>> + Send + 'a;

  // ── Responses ─────────────────────────────────────────────────────────

  /// Persist a response owned by `user`, together with its answers. Returns
  /// `None` without writing if `user` already has a response to the survey.
  fn insert_response(
    &self,
    user: String,
    input: ResponseInput,
  ) -> impl Future<Output = Result<Option<Response>, Self::Error>> + Send + '_;

  fn get_response(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<Response>, Self::Error>> + Send + '_;

  fn get_response_by_user_and_survey<'a>(
    &'a self,
    user: &'a str,
    survey_id: i64,
  ) -> impl Future<Output = Result<Option<Response>, Self::Error>> + Send + 'a;

  fn list_responses_by_survey(
    &self,
    survey_id: i64,
  ) -> impl Future<Output = Result<Vec<Response>, Self::Error>> + Send + '_;

  /// Replace the answers of response `id`. Answers for questions already
  /// present keep their ids; questions missing from `input` are dropped.
  /// Owner and survey never change.
  ///
  /// With `expected_updated_at`, the write only happens if the stored
  /// response still carries that timestamp; the comparison and the write
  /// are one atomic step.
  fn update_response(
    &self,
    id: i64,
    input: ResponseInput,
    expected_updated_at: Option<DateTime<Utc>>,
  ) -> impl Future<Output = Result<UpdateOutcome<Response>, Self::Error>> + Send + '_;
}

/// Result of a conditional update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome<T> {
  Updated(T),
  NotFound,
  /// The row changed since the caller read it.
  Stale,
}
