//! Aggregate answer distributions across every response to a survey.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{response::Response, survey::Survey};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionSummary {
  pub question:      i64,
  /// Responses that selected at least one answer for this question.
  pub answered:      usize,
  /// Selection count per answer id.
  pub answer_counts: BTreeMap<i64, usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveySummary {
  pub survey:          i64,
  pub total_responses: usize,
  pub questions:       Vec<QuestionSummary>,
}

impl SurveySummary {
  /// Tally `responses` against the questions linked to `survey`, in survey
  /// order. Selections for questions no longer linked are not counted.
  pub fn tally(survey: &Survey, responses: &[Response]) -> Self {
    let questions = survey
      .survey_questions
      .iter()
      .map(|sq| {
        let mut summary = QuestionSummary {
          question:      sq.question.id,
          answered:      0,
          answer_counts: sq
            .question
            .question_answers
            .iter()
            .map(|qa| (qa.answer.id, 0))
            .collect(),
        };
        for ra in responses.iter().filter_map(|r| r.answer_for(sq.question.id)) {
          if ra.is_answered() {
            summary.answered += 1;
          }
          for id in &ra.selected {
            *summary.answer_counts.entry(*id).or_default() += 1;
          }
        }
        summary
      })
      .collect();

    Self {
      survey: survey.id,
      total_responses: responses.len(),
      questions,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::report::tests::{response, survey};

  #[test]
  fn counts_each_selected_answer() {
    let responses = vec![
      response(&[(1, &[3]), (2, &[5, 6])]),
      response(&[(1, &[4]), (2, &[5])]),
      response(&[(1, &[])]),
    ];
    let summary = SurveySummary::tally(&survey("career"), &responses);

    assert_eq!(summary.survey, 7);
    assert_eq!(summary.total_responses, 3);

    let q1 = &summary.questions[0];
    assert_eq!(q1.question, 1);
    assert_eq!(q1.answered, 2);
    assert_eq!(q1.answer_counts, BTreeMap::from([(3, 1), (4, 1)]));

    let q2 = &summary.questions[1];
    assert_eq!(q2.answered, 2);
    assert_eq!(q2.answer_counts, BTreeMap::from([(5, 2), (6, 1)]));
  }

  #[test]
  fn no_responses_yields_zeroes() {
    let summary = SurveySummary::tally(&survey("career"), &[]);
    assert_eq!(summary.total_responses, 0);
    assert!(summary.questions.iter().all(|q| q.answered == 0));
    assert_eq!(summary.questions[0].answer_counts.get(&3), Some(&0));
  }
}
