//! Error types for `survey-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("{entity} not found: {key}")]
  NotFound { entity: &'static str, key: String },

  #[error("a survey named {0:?} already exists")]
  DuplicateCanonicalName(String),

  #[error("malformed answer payload: field `{field}` {reason}")]
  MalformedAnswerPayload { field: String, reason: String },

  #[error("response {0} is not owned by the acting user")]
  OwnershipMismatch(i64),

  #[error("access denied")]
  AccessDenied,

  #[error("no report strategy for survey {0:?}")]
  NoReportStrategy(String),

  #[error("payload id {body} does not match path id {path}")]
  IdMismatch { path: i64, body: i64 },

  #[error("user {user:?} already has a response for survey {survey}")]
  DuplicateResponse { user: String, survey: i64 },

  #[error("question {question} is not part of survey {survey}")]
  QuestionNotInSurvey { survey: i64, question: i64 },

  #[error("answer {answer} is not an option of question {question}")]
  AnswerNotInQuestion { question: i64, answer: i64 },

  #[error("response {0} was changed by another request")]
  StaleResponse(i64),

  #[error("invalid input: {0}")]
  InvalidInput(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub(crate) fn not_found(entity: &'static str, key: impl ToString) -> Self {
    Self::NotFound { entity, key: key.to_string() }
  }

  pub(crate) fn malformed(field: impl Into<String>, reason: impl Into<String>) -> Self {
    Self::MalformedAnswerPayload { field: field.into(), reason: reason.into() }
  }

  /// Box a persistence-layer error.
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }

  /// `true` for faults on the server side (configuration gaps and storage
  /// failures) as opposed to problems with the caller's request.
  pub fn is_server_fault(&self) -> bool {
    matches!(self, Self::NoReportStrategy(_) | Self::Store(_))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
