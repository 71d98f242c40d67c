//! ETag computation for [`Response`] resources.
//!
//! ETags are SHA-256 hashes over the response id, its update timestamp and
//! every `(question, answer)` selection, taken in a deterministic order.

use axum::http::{HeaderMap, header};
use sha2::{Digest, Sha256};
use survey_core::response::Response;

use crate::error::ApiError;

/// Compute the quoted ETag for `response`.
///
/// Stable: the same selections in any answer order give the same ETag.
pub fn compute_etag(response: &Response) -> String {
  let mut pairs: Vec<(i64, i64)> = response
    .answers
    .iter()
    .flat_map(|ra| ra.selected.iter().map(move |id| (ra.question, *id)))
    .collect();
  pairs.sort_unstable();

  let mut hasher = Sha256::new();
  hasher.update(response.id.to_le_bytes());
  hasher.update(response.updated_at.timestamp_micros().to_le_bytes());
  for (question, answer) in pairs {
    hasher.update(question.to_le_bytes());
    hasher.update(answer.to_le_bytes());
  }
  format!("\"{}\"", hex::encode(hasher.finalize()))
}

fn strip_quotes(s: &str) -> &str {
  let s = s.trim();
  let s = s.strip_prefix("W/").unwrap_or(s);
  s.trim_matches('"')
}

/// Fail with 412 when an `If-Match` header is present and names neither `*`
/// nor the current ETag of `response`.
///
/// Returns whether a precondition was given, in which case the write must
/// still be made conditional on `response` being unchanged.
pub fn check_if_match(headers: &HeaderMap, response: &Response) -> Result<bool, ApiError> {
  let Some(if_match) = headers.get(header::IF_MATCH) else { return Ok(false) };
  let if_match = if_match.to_str().map_err(|_| ApiError::PreconditionFailed)?;

  let current = compute_etag(response);
  let matches = if_match
    .split(',')
    .any(|tag| tag.trim() == "*" || strip_quotes(tag) == strip_quotes(&current));
  if matches {
    Ok(true)
  } else {
    tracing::warn!(response = response.id, "stale If-Match on response update");
    Err(ApiError::PreconditionFailed)
  }
}
