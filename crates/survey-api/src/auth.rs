//! Principal extraction from host-portal headers, and role gates.
//!
//! The portal in front of this service authenticates the user and forwards
//! the identity and role membership as trusted headers. A [`Principal`] is
//! rebuilt from them on every request; nothing is cached between requests.

use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, request::Parts},
};
use survey_core::{access::Principal, store::SurveyStore};

use crate::{AppState, error::ApiError};

/// Header names and role names the portal uses.
#[derive(Debug, Clone)]
pub struct AuthConfig {
  pub user_header:  String,
  /// Comma-separated role list.
  pub roles_header: String,
  pub admin_role:   String,
  pub user_role:    String,
}

impl Default for AuthConfig {
  fn default() -> Self {
    Self {
      user_header:  "x-remote-user".into(),
      roles_header: "x-remote-roles".into(),
      admin_role:   "survey-admin".into(),
      user_role:    "survey-user".into(),
    }
  }
}

/// The two access tiers of the resource surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
  Admin,
  User,
}

impl AuthConfig {
  /// Admins pass every gate; users pass only [`Role::User`].
  pub fn permits(&self, principal: &Principal, role: Role) -> bool {
    match role {
      Role::Admin => principal.has_role(&self.admin_role),
      Role::User => principal.has_role(&self.user_role) || principal.has_role(&self.admin_role),
    }
  }

  pub fn require(&self, principal: &Principal, role: Role) -> Result<(), ApiError> {
    if self.permits(principal, role) {
      Ok(())
    } else {
      tracing::warn!(user = %principal.user, ?role, "missing role");
      Err(ApiError::Forbidden(format!("{role:?} role required").to_lowercase()))
    }
  }
}

/// Build the request principal directly from headers.
pub fn principal_from_headers(headers: &HeaderMap, config: &AuthConfig) -> Result<Principal, ApiError> {
  let user = headers
    .get(config.user_header.as_str())
    .and_then(|v| v.to_str().ok())
    .map(str::trim)
    .filter(|u| !u.is_empty())
    .ok_or(ApiError::Unauthorized)?;

  let roles = headers
    .get_all(config.roles_header.as_str())
    .iter()
    .filter_map(|v| v.to_str().ok())
    .flat_map(|v| v.split(','))
    .map(str::trim)
    .filter(|r| !r.is_empty());

  Ok(Principal::new(user, roles))
}

/// Extractor: the authenticated principal of the current request.
pub struct Authenticated(pub Principal);

impl<S> FromRequestParts<AppState<S>> for Authenticated
where
  S: SurveyStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    principal_from_headers(&parts.headers, &state.auth).map(Authenticated)
  }
}
