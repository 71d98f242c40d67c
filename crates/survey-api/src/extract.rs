//! `Path` and `Query` extractors whose rejections use the API's JSON error
//! body instead of axum's plain-text one.

use axum::{extract::FromRequestParts, http::request::Parts};
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// Typed path parameters. A segment that fails to parse is a 400.
#[derive(Debug)]
pub struct Path<T>(pub T);

impl<S, T> FromRequestParts<S> for Path<T>
where
  T: DeserializeOwned + Send,
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
    axum::extract::Path::<T>::from_request_parts(parts, state)
      .await
      .map(|axum::extract::Path(value)| Path(value))
      .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
  }
}

/// Typed query string. A missing or malformed parameter is a 400.
#[derive(Debug)]
pub struct Query<T>(pub T);

impl<S, T> FromRequestParts<S> for Query<T>
where
  T: DeserializeOwned + Send,
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
    axum::extract::Query::<T>::from_request_parts(parts, state)
      .await
      .map(|axum::extract::Query(value)| Query(value))
      .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
  }
}
