//! Integration tests for `SqliteStore` against an in-memory database, and
//! for `SurveyService` running on top of it.

use std::collections::BTreeSet;

use survey_core::{
  Error as CoreError,
  codec::AnswerSelection,
  question::{AnswerInput, QuestionAnswerInput, QuestionInput},
  response::{ResponseAnswerInput, ResponseInput},
  service::SurveyService,
  store::{SurveyStore, UpdateOutcome},
  survey::{PublishedState, SurveyInput, SurveyQuestionLink},
  text_group::TextGroup,
};

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

async fn service() -> SurveyService<SqliteStore> { SurveyService::new(store().await) }

fn question_input(text: &str, answers: &[&str]) -> QuestionInput {
  QuestionInput {
    id:               None,
    text:             text.into(),
    alt_text:         None,
    help_text:        None,
    canonical_name:   None,
    status:           PublishedState::Published,
    question_answers: answers
      .iter()
      .enumerate()
      .map(|(i, t)| QuestionAnswerInput {
        answer:   AnswerInput { id: None, text: (*t).into(), alt_text: None },
        sequence: i as i32 + 1,
      })
      .collect(),
  }
}

fn survey_input(name: &str) -> SurveyInput {
  SurveyInput {
    id:             None,
    canonical_name: name.into(),
    title:          Some("Career readiness".into()),
    description:    None,
    status:         PublishedState::Draft,
  }
}

fn single(question: i64, answer: i64) -> ResponseAnswerInput {
  ResponseAnswerInput { question, selection: AnswerSelection::SingleChoice(answer) }
}

fn multi(question: i64, answers: &[i64]) -> ResponseAnswerInput {
  ResponseAnswerInput {
    question,
    selection: AnswerSelection::MultiSelect(answers.iter().copied().collect()),
  }
}

fn response_input(survey: i64, answers: Vec<ResponseAnswerInput>) -> ResponseInput {
  ResponseInput { id: None, survey, answers }
}

// ─── Store: questions ────────────────────────────────────────────────────────

#[tokio::test]
async fn insert_and_get_question() {
  let s = store().await;

  let q = s.insert_question(question_input("Favourite colour?", &["Red", "Blue"])).await.unwrap();
  assert!(q.id > 0);
  assert_eq!(q.status, PublishedState::Published);
  let texts: Vec<_> = q.question_answers.iter().map(|qa| qa.answer.text.as_str()).collect();
  assert_eq!(texts, ["Red", "Blue"]);

  let fetched = s.get_question(q.id).await.unwrap().unwrap();
  assert_eq!(fetched, q);
}

#[tokio::test]
async fn get_question_missing_returns_none() {
  let s = store().await;
  assert!(s.get_question(42).await.unwrap().is_none());
  assert!(s.get_answer(42).await.unwrap().is_none());
}

#[tokio::test]
async fn answers_can_be_shared_between_questions() {
  let s = store().await;
  let q1 = s.insert_question(question_input("Q1", &["Yes", "No"])).await.unwrap();
  let yes = q1.question_answers[0].answer.id;

  let mut input = question_input("Q2", &[]);
  input.question_answers.push(QuestionAnswerInput {
    answer:   AnswerInput { id: Some(yes), text: "Yes".into(), alt_text: Some("Y".into()) },
    sequence: 1,
  });
  let q2 = s.insert_question(input).await.unwrap();

  assert_eq!(q2.question_answers[0].answer.id, yes);
  let shared = s.get_answer(yes).await.unwrap().unwrap();
  assert_eq!(shared.alt_text.as_deref(), Some("Y"));
}

#[tokio::test]
async fn update_question_replaces_answer_links() {
  let s = store().await;
  let q = s.insert_question(question_input("Q", &["A", "B"])).await.unwrap();

  let mut input = question_input("Q (edited)", &["C"]);
  input.status = PublishedState::Retired;
  let updated = s.update_question(q.id, input).await.unwrap().unwrap();

  assert_eq!(updated.text, "Q (edited)");
  assert_eq!(updated.status, PublishedState::Retired);
  assert_eq!(updated.question_answers.len(), 1);
  assert_eq!(updated.question_answers[0].answer.text, "C");

  assert!(s.update_question(999, question_input("x", &[])).await.unwrap().is_none());
}

// ─── Store: surveys ──────────────────────────────────────────────────────────

#[tokio::test]
async fn insert_survey_rejects_taken_name() {
  let s = store().await;
  let first = s.insert_survey(survey_input("career"), "admin".into()).await.unwrap();
  assert!(first.is_some());

  let second = s.insert_survey(survey_input("career"), "admin".into()).await.unwrap();
  assert!(second.is_none());
  assert_eq!(s.list_surveys().await.unwrap().len(), 1);
}

#[tokio::test]
async fn get_survey_by_name_and_id_agree() {
  let s = store().await;
  let created = s.insert_survey(survey_input("career"), "admin".into()).await.unwrap().unwrap();
  assert_eq!(created.last_update_user, "admin");

  let by_id = s.get_survey(created.id).await.unwrap().unwrap();
  let by_name = s.get_survey_by_name("career").await.unwrap().unwrap();
  assert_eq!(by_id, by_name);
  assert!(s.get_survey_by_name("nope").await.unwrap().is_none());
}

#[tokio::test]
async fn link_question_orders_by_sequence_and_relinks_in_place() {
  let s = store().await;
  let survey = s.insert_survey(survey_input("career"), "admin".into()).await.unwrap().unwrap();
  let q1 = s.insert_question(question_input("Q1", &["A"])).await.unwrap();
  let q2 = s.insert_question(question_input("Q2", &["B"])).await.unwrap();

  s.link_question(survey.id, q1.id, SurveyQuestionLink { sequence: 2, number: Some("2".into()) })
    .await
    .unwrap();
  s.link_question(survey.id, q2.id, SurveyQuestionLink { sequence: 1, number: Some("1".into()) })
    .await
    .unwrap();

  let order: Vec<_> = s
    .survey_questions(survey.id)
    .await
    .unwrap()
    .iter()
    .map(|sq| sq.question.id)
    .collect();
  assert_eq!(order, [q2.id, q1.id]);

  s.link_question(survey.id, q1.id, SurveyQuestionLink { sequence: 0, number: Some("0".into()) })
    .await
    .unwrap();
  let links = s.survey_questions(survey.id).await.unwrap();
  assert_eq!(links.len(), 2);
  assert_eq!(links[0].question.id, q1.id);
  assert_eq!(links[0].number.as_deref(), Some("0"));

  let loaded = s.get_survey(survey.id).await.unwrap().unwrap();
  assert_eq!(loaded.survey_questions, links);
}

#[tokio::test]
async fn update_survey_keeps_canonical_name() {
  let s = store().await;
  let survey = s.insert_survey(survey_input("career"), "admin".into()).await.unwrap().unwrap();

  let mut input = survey_input("renamed");
  input.title = Some("New title".into());
  input.status = PublishedState::Published;
  let updated = s.update_survey(survey.id, input, "editor".into()).await.unwrap().unwrap();

  assert_eq!(updated.canonical_name, "career");
  assert_eq!(updated.title.as_deref(), Some("New title"));
  assert_eq!(updated.status, PublishedState::Published);
  assert_eq!(updated.last_update_user, "editor");
  assert!(updated.last_update_date >= survey.last_update_date);
}

// ─── Store: text groups ──────────────────────────────────────────────────────

#[tokio::test]
async fn text_group_upsert_replaces_text_per_variant() {
  let s = store().await;
  let entry = |variant: &str, text: &str| TextGroup {
    key:     "welcome".into(),
    variant: variant.into(),
    text:    text.into(),
  };

  s.upsert_text_group(entry("default", "Hello")).await.unwrap();
  s.upsert_text_group(entry("formal", "Good day")).await.unwrap();
  s.upsert_text_group(entry("default", "Hi")).await.unwrap();

  let default = s.get_text_group("welcome", "default").await.unwrap().unwrap();
  assert_eq!(default.text, "Hi");
  let formal = s.get_text_group("welcome", "formal").await.unwrap().unwrap();
  assert_eq!(formal.text, "Good day");
  assert!(s.get_text_group("welcome", "casual").await.unwrap().is_none());
}

// ─── Store: responses ────────────────────────────────────────────────────────

#[tokio::test]
async fn insert_response_is_unique_per_user_and_survey() {
  let s = store().await;
  let survey = s.insert_survey(survey_input("career"), "admin".into()).await.unwrap().unwrap();

  let first = s.insert_response("alice".into(), response_input(survey.id, vec![])).await.unwrap();
  assert!(first.is_some());
  let again = s.insert_response("alice".into(), response_input(survey.id, vec![])).await.unwrap();
  assert!(again.is_none());
  let other = s.insert_response("bob".into(), response_input(survey.id, vec![])).await.unwrap();
  assert!(other.is_some());

  assert_eq!(s.list_responses_by_survey(survey.id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn update_response_keeps_answer_ids_and_drops_missing_questions() {
  let s = store().await;
  let survey = s.insert_survey(survey_input("career"), "admin".into()).await.unwrap().unwrap();

  let q1 = s.insert_question(question_input("Q1", &["A", "B"])).await.unwrap().id;
  let q2 = s.insert_question(question_input("Q2", &["C", "D"])).await.unwrap().id;

  let created = s
    .insert_response(
      "alice".into(),
      response_input(survey.id, vec![single(q1, 10), multi(q2, &[20, 21])]),
    )
    .await
    .unwrap()
    .unwrap();
  let first_id = created.answer_for(q1).unwrap().id;

  let UpdateOutcome::Updated(updated) = s
    .update_response(created.id, response_input(survey.id, vec![single(q1, 11)]), None)
    .await
    .unwrap()
  else {
    panic!("expected the response to be updated");
  };

  assert_eq!(updated.user, "alice");
  assert_eq!(updated.answers.len(), 1);
  let answer = updated.answer_for(q1).unwrap();
  assert_eq!(answer.id, first_id);
  assert_eq!(answer.selected, BTreeSet::from([11]));
  assert!(updated.answer_for(q2).is_none());
  assert_eq!(updated.created_at, created.created_at);

  let by_user = s.get_response_by_user_and_survey("alice", survey.id).await.unwrap().unwrap();
  assert_eq!(by_user, updated);
  assert_eq!(
    s.update_response(999, response_input(survey.id, vec![]), None).await.unwrap(),
    UpdateOutcome::NotFound
  );
}

#[tokio::test]
async fn conditional_update_rejects_outdated_timestamp() {
  let s = store().await;
  let survey = s.insert_survey(survey_input("career"), "admin".into()).await.unwrap().unwrap();
  let q1 = s.insert_question(question_input("Q1", &["A", "B"])).await.unwrap().id;

  let created = s
    .insert_response("alice".into(), response_input(survey.id, vec![single(q1, 10)]))
    .await
    .unwrap()
    .unwrap();

  let UpdateOutcome::Updated(first) = s
    .update_response(
      created.id,
      response_input(survey.id, vec![single(q1, 11)]),
      Some(created.updated_at),
    )
    .await
    .unwrap()
  else {
    panic!("first conditional update should apply");
  };
  assert_ne!(first.updated_at, created.updated_at);

  // Second writer still holds the original timestamp.
  assert_eq!(
    s.update_response(
      created.id,
      response_input(survey.id, vec![single(q1, 12)]),
      Some(created.updated_at),
    )
    .await
    .unwrap(),
    UpdateOutcome::Stale
  );
  let stored = s.get_response(created.id).await.unwrap().unwrap();
  assert_eq!(stored, first);

  assert_eq!(
    s.update_response(999, response_input(survey.id, vec![]), Some(created.updated_at))
      .await
      .unwrap(),
    UpdateOutcome::NotFound
  );
}

// ─── Service ─────────────────────────────────────────────────────────────────

/// A survey with two linked questions: `(survey, questions, q1 answers, q2 answers)`.
async fn seeded(svc: &SurveyService<SqliteStore>) -> (i64, [i64; 2], [i64; 2], [i64; 2]) {
  let survey = svc.create_survey(survey_input("career"), "admin").await.unwrap();
  let q1 = svc.create_question(question_input("Colour?", &["Red", "Blue"])).await.unwrap();
  let q2 = svc.create_question(question_input("Tools?", &["Hammer", "Saw"])).await.unwrap();
  for (seq, q) in [(1, &q1), (2, &q2)] {
    svc
      .add_question_to_survey(survey.id, q.id, SurveyQuestionLink {
        sequence: seq,
        number:   Some(seq.to_string()),
      })
      .await
      .unwrap();
  }
  let ids = |q: &survey_core::question::Question| {
    [q.question_answers[0].answer.id, q.question_answers[1].answer.id]
  };
  (survey.id, [q1.id, q2.id], ids(&q1), ids(&q2))
}

#[tokio::test]
async fn duplicate_canonical_name_is_rejected() {
  let svc = service().await;
  svc.create_survey(survey_input("career"), "admin").await.unwrap();

  let err = svc.create_survey(survey_input("career"), "admin").await.unwrap_err();
  assert!(matches!(err, CoreError::DuplicateCanonicalName(ref n) if n == "career"));
  assert_eq!(svc.list_surveys().await.unwrap().len(), 1);
}

#[tokio::test]
async fn create_survey_rejects_preassigned_id_and_blank_name() {
  let svc = service().await;

  let mut with_id = survey_input("career");
  with_id.id = Some(5);
  assert!(matches!(
    svc.create_survey(with_id, "admin").await,
    Err(CoreError::InvalidInput(_))
  ));

  let mut zero_id = survey_input("career");
  zero_id.id = Some(0);
  assert!(svc.create_survey(zero_id, "admin").await.is_ok());

  assert!(matches!(
    svc.create_survey(survey_input("  "), "admin").await,
    Err(CoreError::InvalidInput(_))
  ));
}

#[tokio::test]
async fn survey_is_not_found_before_creation_and_found_after() {
  let svc = service().await;
  assert!(matches!(svc.get_survey_by_name("career").await, Err(CoreError::NotFound { .. })));

  let created = svc.create_survey(survey_input("career"), "admin").await.unwrap();
  assert_eq!(svc.get_survey_by_name("career").await.unwrap().id, created.id);
  assert_eq!(svc.get_survey(created.id).await.unwrap().canonical_name, "career");
}

#[tokio::test]
async fn update_survey_rejects_rename_and_id_mismatch() {
  let svc = service().await;
  let survey = svc.create_survey(survey_input("career"), "admin").await.unwrap();

  assert!(matches!(
    svc.update_survey(survey.id, survey_input("other"), "admin").await,
    Err(CoreError::InvalidInput(_))
  ));

  let mut wrong = survey_input("career");
  wrong.id = Some(survey.id + 1);
  assert!(matches!(
    svc.update_survey(survey.id, wrong, "admin").await,
    Err(CoreError::IdMismatch { .. })
  ));

  assert!(matches!(
    svc.update_survey(999, survey_input("career"), "admin").await,
    Err(CoreError::NotFound { .. })
  ));
}

#[tokio::test]
async fn question_referencing_unknown_answer_is_rejected() {
  let svc = service().await;
  let mut input = question_input("Q", &[]);
  input.question_answers.push(QuestionAnswerInput {
    answer:   AnswerInput { id: Some(77), text: "ghost".into(), alt_text: None },
    sequence: 1,
  });

  assert!(matches!(
    svc.create_question(input).await,
    Err(CoreError::NotFound { entity: "answer", .. })
  ));
  assert!(matches!(
    svc.create_question(question_input("", &[])).await,
    Err(CoreError::InvalidInput(_))
  ));
}

#[tokio::test]
async fn add_question_to_missing_survey_is_not_found() {
  let svc = service().await;
  let q = svc.create_question(question_input("Q", &["A"])).await.unwrap();

  let err = svc
    .add_question_to_survey(5, q.id, SurveyQuestionLink::default())
    .await
    .unwrap_err();
  assert!(matches!(err, CoreError::NotFound { entity: "survey", .. }));
  assert!(matches!(
    svc.get_survey_questions(5).await,
    Err(CoreError::NotFound { .. })
  ));
}

#[tokio::test]
async fn text_group_defaults_to_default_variant() {
  let svc = service().await;
  svc
    .create_text_group(TextGroup {
      key:     "intro".into(),
      variant: "default".into(),
      text:    "Welcome".into(),
    })
    .await
    .unwrap();

  assert_eq!(svc.get_text_group("intro", None).await.unwrap().text, "Welcome");
  assert!(matches!(
    svc.get_text_group("intro", Some("formal")).await,
    Err(CoreError::NotFound { .. })
  ));
}

#[tokio::test]
async fn create_response_then_second_create_is_rejected() {
  let svc = service().await;
  let (survey, [q1, _], [red, _], _) = seeded(&svc).await;

  let created = svc
    .create_response("alice", response_input(survey, vec![single(q1, red)]))
    .await
    .unwrap();
  assert_eq!(created.user, "alice");

  let err = svc
    .create_response("alice", response_input(survey, vec![single(q1, red)]))
    .await
    .unwrap_err();
  assert!(matches!(err, CoreError::DuplicateResponse { .. }));

  let stored = svc.get_response_by_user_and_survey("alice", survey).await.unwrap();
  assert_eq!(stored, created);
}

#[tokio::test]
async fn create_response_validates_questions_and_answers() {
  let svc = service().await;
  let (survey, [q1, q2], [red, _], [hammer, _]) = seeded(&svc).await;

  let foreign = svc.create_question(question_input("Unlinked", &["X"])).await.unwrap();
  assert!(matches!(
    svc
      .create_response("alice", response_input(survey, vec![single(foreign.id, red)]))
      .await,
    Err(CoreError::QuestionNotInSurvey { .. })
  ));

  assert!(matches!(
    svc.create_response("alice", response_input(survey, vec![single(q1, hammer)])).await,
    Err(CoreError::AnswerNotInQuestion { .. })
  ));

  assert!(matches!(
    svc
      .create_response("alice", response_input(survey, vec![single(q2, hammer), single(q2, hammer)]))
      .await,
    Err(CoreError::InvalidInput(_))
  ));

  assert!(matches!(
    svc.create_response("alice", response_input(999, vec![])).await,
    Err(CoreError::NotFound { entity: "survey", .. })
  ));

  assert!(matches!(
    svc.get_response_by_user_and_survey("alice", survey).await,
    Err(CoreError::NotFound { .. })
  ));
}

#[tokio::test]
async fn update_response_with_mismatched_id_has_no_side_effect() {
  let svc = service().await;
  let (survey, [q1, _], [red, blue], _) = seeded(&svc).await;

  let created = svc
    .create_response("alice", response_input(survey, vec![single(q1, red)]))
    .await
    .unwrap();

  let mut input = response_input(survey, vec![single(q1, blue)]);
  input.id = Some(created.id + 1);
  let err = svc.update_response(&created, input, false).await.unwrap_err();
  assert!(matches!(err, CoreError::IdMismatch { .. }));

  let stored = svc.get_response(created.id).await.unwrap();
  assert_eq!(stored.answer_for(q1).unwrap().selected, BTreeSet::from([red]));
}

#[tokio::test]
async fn update_response_replaces_selection() {
  let svc = service().await;
  let (survey, [q1, q2], [red, blue], [hammer, saw]) = seeded(&svc).await;

  let created = svc
    .create_response("alice", response_input(survey, vec![single(q1, red)]))
    .await
    .unwrap();

  let mut input = response_input(survey, vec![single(q1, blue), multi(q2, &[hammer, saw])]);
  input.id = Some(created.id);
  let updated = svc.update_response(&created, input, false).await.unwrap();

  assert_eq!(updated.id, created.id);
  assert_eq!(updated.answer_for(q1).unwrap().selected, BTreeSet::from([blue]));
  assert_eq!(updated.answer_for(q2).unwrap().selected, BTreeSet::from([hammer, saw]));

  let moved = response_input(survey + 1, vec![]);
  assert!(matches!(
    svc.update_response(&updated, moved, false).await,
    Err(CoreError::InvalidInput(_))
  ));
}

#[tokio::test]
async fn update_from_outdated_read_is_reported_stale() {
  let svc = service().await;
  let (survey, [q1, _], [red, blue], _) = seeded(&svc).await;

  let created = svc
    .create_response("alice", response_input(survey, vec![single(q1, red)]))
    .await
    .unwrap();

  let winner = svc
    .update_response(&created, response_input(survey, vec![single(q1, blue)]), true)
    .await
    .unwrap();

  let err = svc
    .update_response(&created, response_input(survey, vec![single(q1, red)]), true)
    .await
    .unwrap_err();
  assert!(matches!(err, CoreError::StaleResponse(id) if id == created.id));
  assert_eq!(svc.get_response(created.id).await.unwrap(), winner);
}

#[tokio::test]
async fn summary_tallies_every_response() {
  let svc = service().await;
  let (survey, [q1, q2], [red, blue], [hammer, saw]) = seeded(&svc).await;

  svc
    .create_response("alice", response_input(survey, vec![single(q1, red), multi(q2, &[hammer, saw])]))
    .await
    .unwrap();
  svc
    .create_response("bob", response_input(survey, vec![single(q1, red)]))
    .await
    .unwrap();
  svc
    .create_response("carol", response_input(survey, vec![single(q1, blue), multi(q2, &[])]))
    .await
    .unwrap();

  let summary = svc.get_survey_summary(survey).await.unwrap();
  assert_eq!(summary.total_responses, 3);

  let colour = &summary.questions[0];
  assert_eq!(colour.question, q1);
  assert_eq!(colour.answered, 3);
  assert_eq!(colour.answer_counts[&red], 2);
  assert_eq!(colour.answer_counts[&blue], 1);

  let tools = &summary.questions[1];
  assert_eq!(tools.answered, 1);
  assert_eq!(tools.answer_counts[&hammer], 1);
  assert_eq!(tools.answer_counts[&saw], 1);
}
