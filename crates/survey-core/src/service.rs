//! The survey service: the single entry point for reading and changing
//! surveys, questions, text groups and responses.
//!
//! The service enforces the invariants a [`SurveyStore`] cannot express on its
//! own (unique canonical names, one response per user and survey, answers
//! that belong to the survey being answered). It performs **no**
//! authorisation: callers gate reads through
//! [`AccessPolicy`](crate::access::AccessPolicy) and must confirm ownership
//! before calling [`SurveyService::update_response`].

use std::collections::BTreeSet;

use crate::{
  Error, Result,
  question::{Question, QuestionInput},
  response::{Response, ResponseAnswerInput, ResponseInput},
  store::{SurveyStore, UpdateOutcome},
  summary::SurveySummary,
  survey::{Survey, SurveyInput, SurveyQuestion, SurveyQuestionLink},
  text_group::{DEFAULT_VARIANT, TextGroup},
};

/// An id of `0` is what clients send for "not yet assigned".
fn is_unset(id: Option<i64>) -> bool { matches!(id, None | Some(0)) }

fn check_path_id(path: i64, body: Option<i64>) -> Result<()> {
  match body {
    Some(body) if body != 0 && body != path => Err(Error::IdMismatch { path, body }),
    _ => Ok(()),
  }
}

pub struct SurveyService<S> {
  store: S,
}

impl<S: SurveyStore> SurveyService<S> {
  pub fn new(store: S) -> Self { Self { store } }

  pub fn store(&self) -> &S { &self.store }

  // ── Questions ─────────────────────────────────────────────────────────

  /// Create a question that is not yet linked to any survey.
  pub async fn create_question(&self, input: QuestionInput) -> Result<Question> {
    if !is_unset(input.id) {
      return Err(Error::InvalidInput("a new question must not carry an id".into()));
    }
    self.check_question(&input).await?;

    let question = self.store.insert_question(input).await.map_err(Error::store)?;
    tracing::info!(question = question.id, "question created");
    Ok(question)
  }

  pub async fn get_question(&self, id: i64) -> Result<Question> {
    self
      .store
      .get_question(id)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::not_found("question", id))
  }

  /// Replace every mutable field of question `id`.
  pub async fn update_question(&self, id: i64, input: QuestionInput) -> Result<Question> {
    check_path_id(id, input.id)?;
    self.check_question(&input).await?;

    self
      .store
      .update_question(id, input)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::not_found("question", id))
  }

  async fn check_question(&self, input: &QuestionInput) -> Result<()> {
    if input.text.trim().is_empty() {
      return Err(Error::InvalidInput("question text must not be empty".into()));
    }
    let mut seen = BTreeSet::new();
    for id in input.question_answers.iter().filter_map(|qa| qa.answer.id) {
      if !seen.insert(id) {
        return Err(Error::InvalidInput(format!("answer {id} is listed twice")));
      }
      if self.store.get_answer(id).await.map_err(Error::store)?.is_none() {
        return Err(Error::not_found("answer", id));
      }
    }
    Ok(())
  }

  // ── Surveys ───────────────────────────────────────────────────────────

  /// Create a survey. `acting_user` becomes its last-update user.
  pub async fn create_survey(&self, input: SurveyInput, acting_user: &str) -> Result<Survey> {
    if !is_unset(input.id) {
      return Err(Error::InvalidInput("a new survey must not carry an id".into()));
    }
    if input.canonical_name.trim().is_empty() {
      return Err(Error::InvalidInput("canonical name must not be empty".into()));
    }

    let name = input.canonical_name.clone();
    let survey = self
      .store
      .insert_survey(input, acting_user.to_owned())
      .await
      .map_err(Error::store)?
      .ok_or(Error::DuplicateCanonicalName(name))?;
    tracing::info!(survey = survey.id, name = %survey.canonical_name, "survey created");
    Ok(survey)
  }

  pub async fn list_surveys(&self) -> Result<Vec<Survey>> {
    self.store.list_surveys().await.map_err(Error::store)
  }

  pub async fn get_survey(&self, id: i64) -> Result<Survey> {
    self
      .store
      .get_survey(id)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::not_found("survey", id))
  }

  pub async fn get_survey_by_name(&self, canonical_name: &str) -> Result<Survey> {
    self
      .store
      .get_survey_by_name(canonical_name)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::not_found("survey", canonical_name))
  }

  pub async fn get_survey_questions(&self, survey_id: i64) -> Result<Vec<SurveyQuestion>> {
    self.get_survey(survey_id).await?;
    self.store.survey_questions(survey_id).await.map_err(Error::store)
  }

  /// Replace the mutable fields of survey `id`. The canonical name cannot be
  /// changed.
  pub async fn update_survey(
    &self,
    id: i64,
    input: SurveyInput,
    acting_user: &str,
  ) -> Result<Survey> {
    check_path_id(id, input.id)?;
    let existing = self.get_survey(id).await?;
    if existing.canonical_name != input.canonical_name {
      return Err(Error::InvalidInput(format!(
        "canonical name {:?} cannot be changed",
        existing.canonical_name
      )));
    }

    self
      .store
      .update_survey(id, input, acting_user.to_owned())
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::not_found("survey", id))
  }

  /// Link an existing question to an existing survey. Linking an already
  /// linked pair updates its placement.
  pub async fn add_question_to_survey(
    &self,
    survey_id: i64,
    question_id: i64,
    link: SurveyQuestionLink,
  ) -> Result<()> {
    self.get_survey(survey_id).await?;
    self.get_question(question_id).await?;
    self
      .store
      .link_question(survey_id, question_id, link)
      .await
      .map_err(Error::store)?;
    tracing::info!(survey = survey_id, question = question_id, "question linked");
    Ok(())
  }

  // ── Text groups ───────────────────────────────────────────────────────

  pub async fn create_text_group(&self, entry: TextGroup) -> Result<TextGroup> {
    if entry.key.trim().is_empty() {
      return Err(Error::InvalidInput("text group key must not be empty".into()));
    }
    self.store.upsert_text_group(entry).await.map_err(Error::store)
  }

  pub async fn get_text_group(&self, key: &str, variant: Option<&str>) -> Result<TextGroup> {
    let variant = variant.unwrap_or(DEFAULT_VARIANT);
    self
      .store
      .get_text_group(key, variant)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::not_found("text group", format!("{key}/{variant}")))
  }

  // ── Responses ─────────────────────────────────────────────────────────

  pub async fn get_response(&self, id: i64) -> Result<Response> {
    self
      .store
      .get_response(id)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::not_found("response", id))
  }

  pub async fn get_response_by_user_and_survey(
    &self,
    user: &str,
    survey_id: i64,
  ) -> Result<Response> {
    self
      .store
      .get_response_by_user_and_survey(user, survey_id)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::not_found("response", format!("{user}/{survey_id}")))
  }

  /// Record `acting_user`'s response. A second response for the same user
  /// and survey is rejected; use [`Self::update_response`] instead.
  pub async fn create_response(&self, acting_user: &str, input: ResponseInput) -> Result<Response> {
    if !is_unset(input.id) {
      return Err(Error::InvalidInput("a new response must not carry an id".into()));
    }
    let survey = self.get_survey(input.survey).await?;
    validate_answers(&survey, &input.answers)?;

    let response = self
      .store
      .insert_response(acting_user.to_owned(), input)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::DuplicateResponse {
        user:   acting_user.to_owned(),
        survey: survey.id,
      })?;
    tracing::info!(response = response.id, survey = survey.id, "response created");
    Ok(response)
  }

  /// Replace the answers of `existing`. The caller has already loaded
  /// `existing` and confirmed that the acting principal owns it.
  ///
  /// With `if_unchanged`, the write fails with [`Error::StaleResponse`] when
  /// another request updated the response after `existing` was read.
  pub async fn update_response(
    &self,
    existing: &Response,
    input: ResponseInput,
    if_unchanged: bool,
  ) -> Result<Response> {
    check_path_id(existing.id, input.id)?;
    if input.survey != existing.survey {
      return Err(Error::InvalidInput(format!(
        "response {} belongs to survey {}, not {}",
        existing.id, existing.survey, input.survey
      )));
    }
    let survey = self.get_survey(existing.survey).await?;
    validate_answers(&survey, &input.answers)?;

    let expected = if_unchanged.then_some(existing.updated_at);
    match self
      .store
      .update_response(existing.id, input, expected)
      .await
      .map_err(Error::store)?
    {
      UpdateOutcome::Updated(response) => Ok(response),
      UpdateOutcome::NotFound => Err(Error::not_found("response", existing.id)),
      UpdateOutcome::Stale => {
        tracing::warn!(response = existing.id, "concurrent response update lost");
        Err(Error::StaleResponse(existing.id))
      }
    }
  }

  /// Answer distributions across every response to `survey_id`.
  pub async fn get_survey_summary(&self, survey_id: i64) -> Result<SurveySummary> {
    let survey = self.get_survey(survey_id).await?;
    let responses = self
      .store
      .list_responses_by_survey(survey_id)
      .await
      .map_err(Error::store)?;
    Ok(SurveySummary::tally(&survey, &responses))
  }
}

/// Every question must be linked to `survey`, appear once, and only select
/// answers it offers.
fn validate_answers(survey: &Survey, answers: &[ResponseAnswerInput]) -> Result<()> {
  let mut seen = BTreeSet::new();
  for input in answers {
    if !seen.insert(input.question) {
      return Err(Error::InvalidInput(format!(
        "question {} is answered twice",
        input.question
      )));
    }
    let question = survey.question(input.question).ok_or(Error::QuestionNotInSurvey {
      survey:   survey.id,
      question: input.question,
    })?;
    for answer in input.selection.clone().into_ids() {
      if !question.offers(answer) {
        return Err(Error::AnswerNotInQuestion { question: question.id, answer });
      }
    }
  }
  Ok(())
}
