//! Completion reports and the registry that picks a strategy per survey.
//!
//! A strategy is a pure function of a survey and one response. The registry
//! holds named strategies, explicit `canonical name → strategy` overrides and
//! an optional default. It is built once at startup and read-only afterwards,
//! so a given survey always resolves to the same strategy instance.

mod answers;
mod completion;

use std::{collections::BTreeMap, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::{Error, Result, response::Response, survey::Survey};

pub use answers::AnswerListReport;
pub use completion::CompletionReport;

// ─── Rendered output ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSection {
  pub heading: String,
  pub lines:   Vec<String>,
}

/// A transport-neutral report; rendering to HTML or anything else is up to
/// the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderableReport {
  /// Name of the strategy that produced this report.
  pub strategy: String,
  pub title:    String,
  pub response: i64,
  pub sections: Vec<ReportSection>,
}

// ─── Strategy ────────────────────────────────────────────────────────────────

pub trait ReportGenerator: Send + Sync {
  /// Registry key for this strategy.
  fn name(&self) -> &str;

  fn generate(&self, survey: &Survey, response: &Response) -> RenderableReport;
}

fn report_title(survey: &Survey) -> String {
  survey
    .title
    .clone()
    .unwrap_or_else(|| survey.canonical_name.clone())
}

// ─── Registry ────────────────────────────────────────────────────────────────

pub struct ReportRegistry {
  strategies: BTreeMap<String, Arc<dyn ReportGenerator>>,
  surveys:    BTreeMap<String, String>,
  default:    Option<String>,
}

impl std::fmt::Debug for ReportRegistry {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ReportRegistry")
      .field("strategies", &self.strategies.keys().collect::<Vec<_>>())
      .field("surveys", &self.surveys)
      .field("default", &self.default)
      .finish()
  }
}

impl ReportRegistry {
  /// An empty builder: no strategies, no default.
  pub fn builder() -> ReportRegistryBuilder { ReportRegistryBuilder::default() }

  /// A builder preloaded with the built-in strategies, defaulting to
  /// [`AnswerListReport`].
  pub fn with_builtin() -> ReportRegistryBuilder {
    Self::builder()
      .register(AnswerListReport)
      .register(CompletionReport)
      .default_strategy(Some(AnswerListReport::NAME))
  }

  pub fn strategy_names(&self) -> impl Iterator<Item = &str> {
    self.strategies.keys().map(String::as_str)
  }

  /// Pick the strategy for `survey`: an explicit mapping first, then the
  /// default.
  pub fn resolve(&self, survey: &Survey) -> Result<&dyn ReportGenerator> {
    let name = self
      .surveys
      .get(&survey.canonical_name.to_lowercase())
      .or(self.default.as_ref())
      .ok_or_else(|| Error::NoReportStrategy(survey.canonical_name.clone()))?;

    self
      .strategies
      .get(name)
      .map(|g| &**g)
      .ok_or_else(|| Error::NoReportStrategy(survey.canonical_name.clone()))
  }

  pub fn generate(&self, survey: &Survey, response: &Response) -> Result<RenderableReport> {
    let generator = self.resolve(survey)?;
    tracing::debug!(
      survey = %survey.canonical_name,
      response = response.id,
      strategy = generator.name(),
      "generating report"
    );
    Ok(generator.generate(survey, response))
  }
}

#[derive(Default)]
pub struct ReportRegistryBuilder {
  strategies: BTreeMap<String, Arc<dyn ReportGenerator>>,
  surveys:    BTreeMap<String, String>,
  default:    Option<String>,
}

impl ReportRegistryBuilder {
  /// Register a strategy under its [`ReportGenerator::name`]; a later
  /// registration with the same name replaces the earlier one.
  pub fn register(mut self, generator: impl ReportGenerator + 'static) -> Self {
    self
      .strategies
      .insert(generator.name().to_owned(), Arc::new(generator));
    self
  }

  /// Route the survey with `canonical_name` to `strategy`. Names match
  /// case-insensitively.
  pub fn map_survey(
    mut self,
    canonical_name: impl Into<String>,
    strategy: impl Into<String>,
  ) -> Self {
    self.surveys.insert(canonical_name.into().to_lowercase(), strategy.into());
    self
  }

  /// Set or clear the fallback strategy.
  pub fn default_strategy(mut self, strategy: Option<impl Into<String>>) -> Self {
    self.default = strategy.map(Into::into);
    self
  }

  /// Finish the registry, rejecting mappings or a default that name an
  /// unregistered strategy.
  pub fn build(self) -> Result<ReportRegistry> {
    for (survey, strategy) in &self.surveys {
      if !self.strategies.contains_key(strategy) {
        return Err(Error::NoReportStrategy(format!(
          "{survey} (mapped to unknown strategy {strategy:?})"
        )));
      }
    }
    if let Some(strategy) = &self.default
      && !self.strategies.contains_key(strategy)
    {
      return Err(Error::NoReportStrategy(format!(
        "<default> (unknown strategy {strategy:?})"
      )));
    }

    Ok(ReportRegistry {
      strategies: self.strategies,
      surveys:    self.surveys,
      default:    self.default,
    })
  }
}
