//! A progress report: how much of the survey has been answered.

use super::{RenderableReport, ReportGenerator, ReportSection, report_title};
use crate::{response::Response, survey::Survey};

pub struct CompletionReport;

impl CompletionReport {
  pub const NAME: &'static str = "completion";
}

impl ReportGenerator for CompletionReport {
  fn name(&self) -> &str { Self::NAME }

  fn generate(&self, survey: &Survey, response: &Response) -> RenderableReport {
    let (answered, unanswered): (Vec<_>, Vec<_>) =
      survey.survey_questions.iter().partition(|sq| {
        response
          .answer_for(sq.question.id)
          .is_some_and(|ra| ra.is_answered())
      });

    let total = survey.survey_questions.len();
    let mut sections = vec![ReportSection {
      heading: "Progress".to_owned(),
      lines:   vec![format!("{} of {total} questions answered", answered.len())],
    }];
    if !unanswered.is_empty() {
      sections.push(ReportSection {
        heading: "Unanswered".to_owned(),
        lines:   unanswered.iter().map(|sq| sq.question.text.clone()).collect(),
      });
    }

    RenderableReport {
      strategy: Self::NAME.to_owned(),
      title: report_title(survey),
      response: response.id,
      sections,
    }
  }
}
