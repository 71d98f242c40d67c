//! [`SqliteStore`], the SQLite implementation of [`SurveyStore`].

use std::{collections::BTreeSet, path::Path};

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension as _};

use survey_core::{
  question::{Answer, Question, QuestionAnswer, QuestionAnswerInput, QuestionInput},
  response::{Response, ResponseInput},
  store::{SurveyStore, UpdateOutcome},
  survey::{Survey, SurveyInput, SurveyQuestion, SurveyQuestionLink},
  text_group::TextGroup,
};

use crate::{
  Result,
  encode::{
    RawQuestion, RawResponse, RawResponseAnswer, RawSurvey, RawSurveyQuestion,
    encode_dt, encode_ids, encode_status,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A survey store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── Row readers ─────────────────────────────────────────────────────────────
//
// Synchronous helpers run inside `Connection::call`. They return raw rows;
// decoding into domain types happens back on the async side.

fn read_question_answers(
  conn: &Connection,
  question_id: i64,
) -> rusqlite::Result<Vec<QuestionAnswer>> {
  let mut stmt = conn.prepare(
    "SELECT a.id, a.text, a.alt_text, qa.sequence
       FROM question_answers qa
       JOIN answers a ON a.id = qa.answer_id
      WHERE qa.question_id = ?1
      ORDER BY qa.sequence, a.id",
  )?;
  stmt
    .query_map(rusqlite::params![question_id], |row| {
      Ok(QuestionAnswer {
        answer:   Answer {
          id:       row.get(0)?,
          text:     row.get(1)?,
          alt_text: row.get(2)?,
        },
        sequence: row.get(3)?,
      })
    })?
    .collect()
}

fn read_question(conn: &Connection, id: i64) -> rusqlite::Result<Option<RawQuestion>> {
  let raw = conn
    .query_row(
      "SELECT id, text, alt_text, help_text, canonical_name, status
         FROM questions WHERE id = ?1",
      rusqlite::params![id],
      |row| {
        Ok(RawQuestion {
          id:               row.get(0)?,
          text:             row.get(1)?,
          alt_text:         row.get(2)?,
          help_text:        row.get(3)?,
          canonical_name:   row.get(4)?,
          status:           row.get(5)?,
          question_answers: Vec::new(),
        })
      },
    )
    .optional()?;

  let Some(mut raw) = raw else { return Ok(None) };
  raw.question_answers = read_question_answers(conn, id)?;
  Ok(Some(raw))
}

fn read_survey_questions(
  conn: &Connection,
  survey_id: i64,
) -> rusqlite::Result<Vec<RawSurveyQuestion>> {
  let links: Vec<(i64, i32, Option<String>)> = {
    let mut stmt = conn.prepare(
      "SELECT question_id, sequence, number
         FROM survey_questions
        WHERE survey_id = ?1
        ORDER BY sequence, question_id",
    )?;
    stmt
      .query_map(rusqlite::params![survey_id], |row| {
        Ok((row.get(0)?, row.get(1)?, row.get(2)?))
      })?
      .collect::<rusqlite::Result<_>>()?
  };

  let mut out = Vec::with_capacity(links.len());
  for (question_id, sequence, number) in links {
    let question = read_question(conn, question_id)?
      .ok_or(rusqlite::Error::QueryReturnedNoRows)?;
    out.push(RawSurveyQuestion { survey: survey_id, sequence, number, question });
  }
  Ok(out)
}

fn read_survey(conn: &Connection, id: i64) -> rusqlite::Result<Option<RawSurvey>> {
  let raw = conn
    .query_row(
      "SELECT id, canonical_name, title, description, status,
              last_update_user, last_update_date
         FROM surveys WHERE id = ?1",
      rusqlite::params![id],
      |row| {
        Ok(RawSurvey {
          id:               row.get(0)?,
          canonical_name:   row.get(1)?,
          title:            row.get(2)?,
          description:      row.get(3)?,
          status:           row.get(4)?,
          last_update_user: row.get(5)?,
          last_update_date: row.get(6)?,
          survey_questions: Vec::new(),
        })
      },
    )
    .optional()?;

  let Some(mut raw) = raw else { return Ok(None) };
  raw.survey_questions = read_survey_questions(conn, id)?;
  Ok(Some(raw))
}

fn read_response(conn: &Connection, id: i64) -> rusqlite::Result<Option<RawResponse>> {
  let raw = conn
    .query_row(
      "SELECT id, owner, survey_id, created_at, updated_at
         FROM responses WHERE id = ?1",
      rusqlite::params![id],
      |row| {
        Ok(RawResponse {
          id:         row.get(0)?,
          owner:      row.get(1)?,
          survey:     row.get(2)?,
          created_at: row.get(3)?,
          updated_at: row.get(4)?,
          answers:    Vec::new(),
        })
      },
    )
    .optional()?;

  let Some(mut raw) = raw else { return Ok(None) };
  let mut stmt = conn.prepare(
    "SELECT id, question_id, answer_ids
       FROM response_answers
      WHERE response_id = ?1
      ORDER BY id",
  )?;
  raw.answers = stmt
    .query_map(rusqlite::params![id], |row| {
      Ok(RawResponseAnswer {
        id:         row.get(0)?,
        question:   row.get(1)?,
        answer_ids: row.get(2)?,
      })
    })?
    .collect::<rusqlite::Result<_>>()?;
  Ok(Some(raw))
}

/// The first column of every row `sql` selects.
fn read_ids(
  conn: &Connection,
  sql: &str,
  params: impl rusqlite::Params,
) -> rusqlite::Result<Vec<i64>> {
  let mut stmt = conn.prepare(sql)?;
  stmt.query_map(params, |row| row.get(0))?.collect()
}

// ─── Row writers ─────────────────────────────────────────────────────────────

/// Create or overwrite each answer, then link it to `question_id`. Existing
/// links are expected to have been cleared by the caller.
fn write_question_answers(
  conn: &Connection,
  question_id: i64,
  links: &[QuestionAnswerInput],
) -> rusqlite::Result<()> {
  for link in links {
    let answer = &link.answer;
    let answer_id = match answer.id {
      Some(id) if id != 0 => {
        let n = conn.execute(
          "UPDATE answers SET text = ?2, alt_text = ?3 WHERE id = ?1",
          rusqlite::params![id, answer.text, answer.alt_text],
        )?;
        if n == 0 {
          return Err(rusqlite::Error::QueryReturnedNoRows);
        }
        id
      }
      _ => {
        conn.execute(
          "INSERT INTO answers (text, alt_text) VALUES (?1, ?2)",
          rusqlite::params![answer.text, answer.alt_text],
        )?;
        conn.last_insert_rowid()
      }
    };

    conn.execute(
      "INSERT INTO question_answers (question_id, answer_id, sequence)
       VALUES (?1, ?2, ?3)
       ON CONFLICT (question_id, answer_id) DO UPDATE SET sequence = excluded.sequence",
      rusqlite::params![question_id, answer_id, link.sequence],
    )?;
  }
  Ok(())
}

/// Upsert one row per `(question, encoded selection)`, keeping the row id
/// of answers that already exist.
fn write_response_answers(
  conn: &Connection,
  response_id: i64,
  answers: &[(i64, String)],
) -> rusqlite::Result<()> {
  for (question_id, ids) in answers {
    conn.execute(
      "INSERT INTO response_answers (response_id, question_id, answer_ids)
       VALUES (?1, ?2, ?3)
       ON CONFLICT (response_id, question_id) DO UPDATE SET answer_ids = excluded.answer_ids",
      rusqlite::params![response_id, question_id, ids],
    )?;
  }
  Ok(())
}

/// Encode each answer's selection ahead of the database call.
fn encode_response_answers(input: ResponseInput) -> Result<Vec<(i64, String)>> {
  input
    .answers
    .into_iter()
    .map(|a| {
      let ids: BTreeSet<i64> = a.selection.into_ids();
      Ok((a.question, encode_ids(&ids)?))
    })
    .collect()
}

// ─── SurveyStore impl ────────────────────────────────────────────────────────

impl SurveyStore for SqliteStore {
  type Error = crate::Error;

  // ── Questions and answers ─────────────────────────────────────────────────

  async fn insert_question(&self, input: QuestionInput) -> Result<Question> {
    let status = encode_status(input.status);

    let raw: RawQuestion = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "INSERT INTO questions (text, alt_text, help_text, canonical_name, status)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![
            input.text,
            input.alt_text,
            input.help_text,
            input.canonical_name,
            status,
          ],
        )?;
        let id = tx.last_insert_rowid();
        write_question_answers(&tx, id, &input.question_answers)?;
        let raw = read_question(&tx, id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)?;
        tx.commit()?;
        Ok(raw)
      })
      .await?;

    raw.into_question()
  }

  async fn get_question(&self, id: i64) -> Result<Option<Question>> {
    let raw = self
      .conn
      .call(move |conn| Ok(read_question(conn, id)?))
      .await?;
    raw.map(RawQuestion::into_question).transpose()
  }

  async fn update_question(&self, id: i64, input: QuestionInput) -> Result<Option<Question>> {
    let status = encode_status(input.status);

    let raw: Option<RawQuestion> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let n = tx.execute(
          "UPDATE questions
              SET text = ?2, alt_text = ?3, help_text = ?4, canonical_name = ?5, status = ?6
            WHERE id = ?1",
          rusqlite::params![
            id,
            input.text,
            input.alt_text,
            input.help_text,
            input.canonical_name,
            status,
          ],
        )?;
        if n == 0 {
          return Ok(None);
        }
        tx.execute(
          "DELETE FROM question_answers WHERE question_id = ?1",
          rusqlite::params![id],
        )?;
        write_question_answers(&tx, id, &input.question_answers)?;
        let raw = read_question(&tx, id)?;
        tx.commit()?;
        Ok(raw)
      })
      .await?;

    raw.map(RawQuestion::into_question).transpose()
  }

  async fn get_answer(&self, id: i64) -> Result<Option<Answer>> {
    let answer = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT id, text, alt_text FROM answers WHERE id = ?1",
            rusqlite::params![id],
            |row| {
              Ok(Answer {
                id:       row.get(0)?,
                text:     row.get(1)?,
                alt_text: row.get(2)?,
              })
            },
          )
          .optional()?)
      })
      .await?;
    Ok(answer)
  }

  // ── Surveys ───────────────────────────────────────────────────────────────

  async fn insert_survey(
    &self,
    input:            SurveyInput,
    last_update_user: String,
  ) -> Result<Option<Survey>> {
    let status = encode_status(input.status);
    let now    = encode_dt(Utc::now());

    let raw: Option<RawSurvey> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let n = tx.execute(
          "INSERT INTO surveys (
             canonical_name, title, description, status,
             last_update_user, last_update_date
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
           ON CONFLICT (canonical_name) DO NOTHING",
          rusqlite::params![
            input.canonical_name,
            input.title,
            input.description,
            status,
            last_update_user,
            now,
          ],
        )?;
        if n == 0 {
          return Ok(None);
        }
        let raw = read_survey(&tx, tx.last_insert_rowid())?;
        tx.commit()?;
        Ok(raw)
      })
      .await?;

    raw.map(RawSurvey::into_survey).transpose()
  }

  async fn get_survey(&self, id: i64) -> Result<Option<Survey>> {
    let raw = self
      .conn
      .call(move |conn| Ok(read_survey(conn, id)?))
      .await?;
    raw.map(RawSurvey::into_survey).transpose()
  }

  async fn get_survey_by_name<'a>(&'a self, canonical_name: &'a str) -> Result<Option<Survey>> {
    let name = canonical_name.to_owned();

    let raw = self
      .conn
      .call(move |conn| {
        let id: Option<i64> = conn
          .query_row(
            "SELECT id FROM surveys WHERE canonical_name = ?1",
            rusqlite::params![name],
            |row| row.get(0),
          )
          .optional()?;
        match id {
          Some(id) => Ok(read_survey(conn, id)?),
          None => Ok(None),
        }
      })
      .await?;
    raw.map(RawSurvey::into_survey).transpose()
  }

  async fn list_surveys(&self) -> Result<Vec<Survey>> {
    let raws: Vec<RawSurvey> = self
      .conn
      .call(|conn| {
        let ids = read_ids(conn, "SELECT id FROM surveys ORDER BY id", [])?;
        let mut out = Vec::with_capacity(ids.len());
        for id in ids {
          out.extend(read_survey(conn, id)?);
        }
        Ok(out)
      })
      .await?;
    raws.into_iter().map(RawSurvey::into_survey).collect()
  }

  async fn update_survey(
    &self,
    id:               i64,
    input:            SurveyInput,
    last_update_user: String,
  ) -> Result<Option<Survey>> {
    let status = encode_status(input.status);
    let now    = encode_dt(Utc::now());

    let raw: Option<RawSurvey> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let n = tx.execute(
          "UPDATE surveys
              SET title = ?2, description = ?3, status = ?4,
                  last_update_user = ?5, last_update_date = ?6
            WHERE id = ?1",
          rusqlite::params![id, input.title, input.description, status, last_update_user, now],
        )?;
        if n == 0 {
          return Ok(None);
        }
        let raw = read_survey(&tx, id)?;
        tx.commit()?;
        Ok(raw)
      })
      .await?;

    raw.map(RawSurvey::into_survey).transpose()
  }

  async fn survey_questions(&self, survey_id: i64) -> Result<Vec<SurveyQuestion>> {
    let raws = self
      .conn
      .call(move |conn| Ok(read_survey_questions(conn, survey_id)?))
      .await?;
    raws.into_iter().map(RawSurveyQuestion::into_survey_question).collect()
  }

  async fn link_question(
    &self,
    survey_id:   i64,
    question_id: i64,
    link:        SurveyQuestionLink,
  ) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO survey_questions (survey_id, question_id, sequence, number)
           VALUES (?1, ?2, ?3, ?4)
           ON CONFLICT (survey_id, question_id)
           DO UPDATE SET sequence = excluded.sequence, number = excluded.number",
          rusqlite::params![survey_id, question_id, link.sequence, link.number],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Text groups ───────────────────────────────────────────────────────────

  async fn upsert_text_group(&self, entry: TextGroup) -> Result<TextGroup> {
    let stored = entry.clone();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO text_groups (text_key, variant, text) VALUES (?1, ?2, ?3)
           ON CONFLICT (text_key, variant) DO UPDATE SET text = excluded.text",
          rusqlite::params![stored.key, stored.variant, stored.text],
        )?;
        Ok(())
      })
      .await?;
    Ok(entry)
  }

  async fn get_text_group<'a>(
    &'a self,
    key:     &'a str,
    variant: &'a str,
  ) -> Result<Option<TextGroup>> {
    let key     = key.to_owned();
    let variant = variant.to_owned();

    let entry = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT text_key, variant, text FROM text_groups
              WHERE text_key = ?1 AND variant = ?2",
            rusqlite::params![key, variant],
            |row| {
              Ok(TextGroup {
                key:     row.get(0)?,
                variant: row.get(1)?,
                text:    row.get(2)?,
              })
            },
          )
          .optional()?)
      })
      .await?;
    Ok(entry)
  }

  // ── Responses ─────────────────────────────────────────────────────────────

  async fn insert_response(&self, user: String, input: ResponseInput) -> Result<Option<Response>> {
    let survey_id = input.survey;
    let answers   = encode_response_answers(input)?;
    let now       = encode_dt(Utc::now());

    let raw: Option<RawResponse> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let n = tx.execute(
          "INSERT INTO responses (owner, survey_id, created_at, updated_at)
           VALUES (?1, ?2, ?3, ?3)
           ON CONFLICT (owner, survey_id) DO NOTHING",
          rusqlite::params![user, survey_id, now],
        )?;
        if n == 0 {
          return Ok(None);
        }
        let id = tx.last_insert_rowid();
        write_response_answers(&tx, id, &answers)?;
        let raw = read_response(&tx, id)?;
        tx.commit()?;
        Ok(raw)
      })
      .await?;

    raw.map(RawResponse::into_response).transpose()
  }

  async fn get_response(&self, id: i64) -> Result<Option<Response>> {
    let raw = self
      .conn
      .call(move |conn| Ok(read_response(conn, id)?))
      .await?;
    raw.map(RawResponse::into_response).transpose()
  }

  async fn get_response_by_user_and_survey<'a>(
    &'a self,
    user:      &'a str,
    survey_id: i64,
  ) -> Result<Option<Response>> {
    let user = user.to_owned();

    let raw = self
      .conn
      .call(move |conn| {
        let id: Option<i64> = conn
          .query_row(
            "SELECT id FROM responses WHERE owner = ?1 AND survey_id = ?2",
            rusqlite::params![user, survey_id],
            |row| row.get(0),
          )
          .optional()?;
        match id {
          Some(id) => Ok(read_response(conn, id)?),
          None => Ok(None),
        }
      })
      .await?;
    raw.map(RawResponse::into_response).transpose()
  }

  async fn list_responses_by_survey(&self, survey_id: i64) -> Result<Vec<Response>> {
    let raws: Vec<RawResponse> = self
      .conn
      .call(move |conn| {
        let ids = read_ids(
          conn,
          "SELECT id FROM responses WHERE survey_id = ?1 ORDER BY id",
          rusqlite::params![survey_id],
        )?;
        let mut out = Vec::with_capacity(ids.len());
        for id in ids {
          out.extend(read_response(conn, id)?);
        }
        Ok(out)
      })
      .await?;
    raws.into_iter().map(RawResponse::into_response).collect()
  }

  async fn update_response(
    &self,
    id:                  i64,
    input:               ResponseInput,
    expected_updated_at: Option<DateTime<Utc>>,
  ) -> Result<UpdateOutcome<Response>> {
    let answers  = encode_response_answers(input)?;
    let keep: BTreeSet<i64> = answers.iter().map(|(q, _)| *q).collect();
    let now      = encode_dt(Utc::now());
    let expected = expected_updated_at.map(encode_dt);

    let outcome: UpdateOutcome<RawResponse> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        // The timestamp guard and the write share one statement, so two
        // writers holding the same timestamp cannot both succeed.
        let n = tx.execute(
          "UPDATE responses SET updated_at = ?2
            WHERE id = ?1 AND (?3 IS NULL OR updated_at = ?3)",
          rusqlite::params![id, now, expected],
        )?;
        if n == 0 {
          let exists = tx
            .query_row("SELECT 1 FROM responses WHERE id = ?1", rusqlite::params![id], |_| Ok(()))
            .optional()?
            .is_some();
          return Ok(if exists { UpdateOutcome::Stale } else { UpdateOutcome::NotFound });
        }

        let present = read_ids(
          &tx,
          "SELECT question_id FROM response_answers WHERE response_id = ?1",
          rusqlite::params![id],
        )?;
        for question_id in present.into_iter().filter(|q| !keep.contains(q)) {
          tx.execute(
            "DELETE FROM response_answers WHERE response_id = ?1 AND question_id = ?2",
            rusqlite::params![id, question_id],
          )?;
        }
        write_response_answers(&tx, id, &answers)?;

        let raw = read_response(&tx, id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)?;
        tx.commit()?;
        Ok(UpdateOutcome::Updated(raw))
      })
      .await?;

    Ok(match outcome {
      UpdateOutcome::Updated(raw) => UpdateOutcome::Updated(raw.into_response()?),
      UpdateOutcome::NotFound => UpdateOutcome::NotFound,
      UpdateOutcome::Stale => UpdateOutcome::Stale,
    })
  }
}
