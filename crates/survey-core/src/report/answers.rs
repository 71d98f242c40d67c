//! The default report: every question in survey order with the answers the
//! user picked.

use super::{RenderableReport, ReportGenerator, ReportSection, report_title};
use crate::{response::Response, survey::Survey};

pub struct AnswerListReport;

impl AnswerListReport {
  pub const NAME: &'static str = "answers";
}

impl ReportGenerator for AnswerListReport {
  fn name(&self) -> &str { Self::NAME }

  fn generate(&self, survey: &Survey, response: &Response) -> RenderableReport {
    let sections = survey
      .survey_questions
      .iter()
      .map(|sq| {
        let heading = match &sq.number {
          Some(n) => format!("{n}. {}", sq.question.text),
          None => sq.question.text.clone(),
        };
        let lines = match response.answer_for(sq.question.id) {
          Some(ra) if ra.is_answered() => ra
            .selected
            .iter()
            .map(|id| {
              sq.question
                .answer_text(*id)
                .map(str::to_owned)
                .unwrap_or_else(|| format!("answer #{id}"))
            })
            .collect(),
          _ => vec!["(no answer)".to_owned()],
        };
        ReportSection { heading, lines }
      })
      .collect();

    RenderableReport {
      strategy: Self::NAME.to_owned(),
      title: report_title(survey),
      response: response.id,
      sections,
    }
  }
}
