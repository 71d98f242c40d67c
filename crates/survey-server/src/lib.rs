//! Wiring for the survey server binary: configuration, report registry and
//! the top-level router.

use std::{
  collections::BTreeMap,
  path::{Path, PathBuf},
};

use anyhow::Context as _;
use axum::Router;
use serde::Deserialize;
use survey_api::{AppState, AuthConfig};
use survey_core::{access::AccessPolicy, report::ReportRegistry, store::SurveyStore};
use tower::Layer as _;
use tower_http::{
  normalize_path::{NormalizePath, NormalizePathLayer},
  trace::TraceLayer,
};

/// Path prefix the API is served under.
pub const API_PREFIX: &str = "/v1/surveys";

/// The served application: the router behind trailing-slash normalisation.
pub type App = NormalizePath<Router>;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `SURVEY_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub host:           String,
  pub port:           u16,
  pub store_path:     PathBuf,
  pub auth:           AuthSection,
  /// Roles allowed to read other users' responses and reports.
  pub reviewer_roles: Vec<String>,
  pub reports:        ReportsSection,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:           "127.0.0.1".into(),
      port:           8080,
      store_path:     PathBuf::from("~/.local/share/survey/survey.db"),
      auth:           AuthSection::default(),
      reviewer_roles: Vec::new(),
      reports:        ReportsSection::default(),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthSection {
  pub user_header:  String,
  pub roles_header: String,
  pub admin_role:   String,
  pub user_role:    String,
}

impl Default for AuthSection {
  fn default() -> Self {
    let d = AuthConfig::default();
    Self {
      user_header:  d.user_header,
      roles_header: d.roles_header,
      admin_role:   d.admin_role,
      user_role:    d.user_role,
    }
  }
}

impl From<AuthSection> for AuthConfig {
  fn from(s: AuthSection) -> Self {
    Self {
      user_header:  s.user_header.to_ascii_lowercase(),
      roles_header: s.roles_header.to_ascii_lowercase(),
      admin_role:   s.admin_role,
      user_role:    s.user_role,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReportsSection {
  /// Fallback strategy; empty means none.
  pub default: String,
  /// Survey canonical name → strategy name.
  pub surveys: BTreeMap<String, String>,
}

impl Default for ReportsSection {
  fn default() -> Self {
    Self {
      default: "answers".into(),
      surveys: BTreeMap::new(),
    }
  }
}

/// Layer `path` (optional) under `SURVEY_*` environment variables. Nested
/// keys use `__`, e.g. `SURVEY_AUTH__ADMIN_ROLE`; `SURVEY_REVIEWER_ROLES`
/// is comma-separated.
pub fn load_config(path: &Path) -> anyhow::Result<ServerConfig> {
  let settings = config::Config::builder()
    .add_source(config::File::from(path).required(false))
    .add_source(
      config::Environment::with_prefix("SURVEY")
        .prefix_separator("_")
        .separator("__")
        .list_separator(",")
        .with_list_parse_key("reviewer_roles")
        .try_parsing(true),
    )
    .build()
    .context("failed to read config file")?;

  settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Wiring ───────────────────────────────────────────────────────────────────

/// The built-in strategies with the configured default and survey mappings.
pub fn build_registry(reports: &ReportsSection) -> anyhow::Result<ReportRegistry> {
  let default = Some(reports.default.trim()).filter(|d| !d.is_empty());
  let builder = reports
    .surveys
    .iter()
    .fold(ReportRegistry::with_builtin().default_strategy(default), |b, (survey, strategy)| {
      b.map_survey(survey.clone(), strategy.clone())
    });
  builder.build().context("invalid report configuration")
}

pub fn build_state<S: SurveyStore>(store: S, config: &ServerConfig) -> anyhow::Result<AppState<S>> {
  let reports = build_registry(&config.reports)?;
  tracing::info!(
    strategies = ?reports.strategy_names().collect::<Vec<_>>(),
    reviewer_roles = ?config.reviewer_roles,
    "report registry ready"
  );
  Ok(AppState::new(
    store,
    AccessPolicy::new(config.reviewer_roles.clone()),
    reports,
    config.auth.clone().into(),
  ))
}

/// The API nested under [`API_PREFIX`], with request tracing.
///
/// A trailing slash is trimmed before routing, so `/v1/surveys/` and
/// `/v1/surveys/questions/` reach the same handlers as their bare forms.
/// The normaliser has to wrap the router; as a router layer it would run
/// after route matching.
pub fn router<S: SurveyStore + 'static>(state: AppState<S>) -> App {
  NormalizePathLayer::trim_trailing_slash().layer(
    Router::new()
      .nest(API_PREFIX, survey_api::api_router(state))
      .layer(TraceLayer::new_for_http()),
  )
}
