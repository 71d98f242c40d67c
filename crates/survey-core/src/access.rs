//! Read and write authorisation for responses and the reports derived from
//! them.
//!
//! Reads may be delegated to reviewer roles; writes may not. The owner of a
//! response is the only principal who can ever modify it.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{Error, Result, response::Response};

/// The authenticated caller of one request, built fresh for every request
/// from facts supplied by the host portal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
  pub user:  String,
  pub roles: BTreeSet<String>,
}

impl Principal {
  pub fn new<I, R>(user: impl Into<String>, roles: I) -> Self
  where
    I: IntoIterator<Item = R>,
    R: Into<String>,
  {
    Self {
      user:  user.into(),
      roles: roles.into_iter().map(Into::into).collect(),
    }
  }

  pub fn has_role(&self, role: &str) -> bool { self.roles.contains(role) }
}

/// Decides who may read or write a [`Response`].
#[derive(Debug, Clone, Default)]
pub struct AccessPolicy {
  reviewer_roles: Vec<String>,
}

impl AccessPolicy {
  /// `reviewer_roles` keeps its configured order; it only affects which
  /// matching role is reported in logs.
  pub fn new(reviewer_roles: Vec<String>) -> Self { Self { reviewer_roles } }

  pub fn reviewer_roles(&self) -> &[String] { &self.reviewer_roles }

  pub fn is_owner(&self, principal: &Principal, response: &Response) -> bool {
    principal.user == response.user
  }

  /// The first configured reviewer role the principal holds.
  pub fn reviewer_role<'a>(&'a self, principal: &Principal) -> Option<&'a str> {
    self
      .reviewer_roles
      .iter()
      .map(String::as_str)
      .find(|role| principal.has_role(role))
  }

  pub fn can_read(&self, principal: &Principal, response: &Response) -> bool {
    self.is_owner(principal, response) || self.reviewer_role(principal).is_some()
  }

  /// Only the owner may write; reviewer roles are never consulted.
  pub fn can_write(&self, principal: &Principal, response: &Response) -> bool {
    self.is_owner(principal, response)
  }

  pub fn authorize_read(&self, principal: &Principal, response: &Response) -> Result<()> {
    if self.is_owner(principal, response) {
      return Ok(());
    }
    match self.reviewer_role(principal) {
      Some(role) => {
        tracing::debug!(
          user = %principal.user,
          response = response.id,
          role,
          "reading another user's response via reviewer role"
        );
        Ok(())
      }
      None => {
        tracing::warn!(
          user = %principal.user,
          response = response.id,
          "read access denied"
        );
        Err(Error::AccessDenied)
      }
    }
  }

  pub fn authorize_write(&self, principal: &Principal, response: &Response) -> Result<()> {
    if self.can_write(principal, response) {
      Ok(())
    } else {
      tracing::warn!(
        user = %principal.user,
        response = response.id,
        "write rejected: not the owner"
      );
      Err(Error::OwnershipMismatch(response.id))
    }
  }
}
