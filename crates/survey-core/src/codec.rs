//! The answer codec: decodes the two JSON shapes clients use to say which
//! answer(s) they picked.
//!
//! ```json
//! { "question": 1, "answer": 3 }                           // single choice
//! { "question": 2, "answer": { "5": true, "6": false } }   // multi-select
//! ```
//!
//! The scalar form yields exactly one id. The map form yields the keys mapped
//! to `true`; keys mapped to `false` are excluded and any other value is
//! rejected.

use std::collections::BTreeSet;

use serde_json::{Map, Value};

use crate::{
  Error, Result,
  response::{ResponseAnswerInput, ResponseInput},
};

/// The normalised shape of one answer fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerSelection {
  SingleChoice(i64),
  MultiSelect(BTreeSet<i64>),
}

impl AnswerSelection {
  /// Decode the value of an `answer` field.
  pub fn from_value(value: &Value) -> Result<Self> {
    if let Some(id) = as_id(value) {
      return Ok(Self::SingleChoice(id));
    }
    match value {
      Value::Object(map) => decode_map(map).map(Self::MultiSelect),
      _ => Err(Error::malformed(
        "answer",
        "must be an integer id or an object of id → boolean",
      )),
    }
  }

  /// The set of selected answer ids.
  pub fn into_ids(self) -> BTreeSet<i64> {
    match self {
      Self::SingleChoice(id) => BTreeSet::from([id]),
      Self::MultiSelect(ids) => ids,
    }
  }

  /// The wire shape for a stored selection: one id becomes a scalar, any
  /// other set (including the empty one) becomes a map.
  pub fn from_ids(ids: &BTreeSet<i64>) -> Self {
    match ids.iter().next() {
      Some(&id) if ids.len() == 1 => Self::SingleChoice(id),
      _ => Self::MultiSelect(ids.clone()),
    }
  }

  pub fn to_value(&self) -> Value {
    match self {
      Self::SingleChoice(id) => Value::from(*id),
      Self::MultiSelect(ids) => Value::Object(
        ids.iter().map(|id| (id.to_string(), Value::Bool(true))).collect(),
      ),
    }
  }
}

fn decode_map(map: &Map<String, Value>) -> Result<BTreeSet<i64>> {
  let mut selected = BTreeSet::new();
  for (key, flag) in map {
    let id: i64 = key.trim().parse().map_err(|_| {
      Error::malformed(format!("answer.{key}"), "key is not an integer id")
    })?;
    match flag {
      Value::Bool(true) => {
        selected.insert(id);
      }
      Value::Bool(false) => {}
      _ => {
        return Err(Error::malformed(
          format!("answer.{key}"),
          "value must be a boolean",
        ));
      }
    }
  }
  Ok(selected)
}

/// Integers and integral floats count as ids. Strings never do.
fn as_id(value: &Value) -> Option<i64> {
  match value {
    // `i64::MAX as f64` rounds up to 2^63, which is itself out of range.
    Value::Number(n) => n.as_i64().or_else(|| {
      n.as_f64()
        .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64)
        .map(|f| f as i64)
    }),
    _ => None,
  }
}

// ─── Fragments and whole payloads ────────────────────────────────────────────

/// Decode one `{ "question": …, "answer": … }` fragment.
pub fn decode_response_answer(value: &Value) -> Result<ResponseAnswerInput> {
  let question = match value.get("question") {
    None | Some(Value::Null) => {
      return Err(Error::malformed("question", "is missing"));
    }
    Some(q) => {
      as_id(q).ok_or_else(|| Error::malformed("question", "is not an integer id"))?
    }
  };

  let selection = match value.get("answer") {
    None | Some(Value::Null) => {
      return Err(Error::malformed("answer", "is missing"));
    }
    Some(a) => AnswerSelection::from_value(a)?,
  };

  Ok(ResponseAnswerInput { question, selection })
}

/// Decode a whole response payload.
///
/// `survey` is required; `id` is optional; `answers` defaults to empty. A
/// `user` field, if present, is ignored.
pub fn decode_response(value: &Value) -> Result<ResponseInput> {
  if !value.is_object() {
    return Err(Error::InvalidInput("response must be a JSON object".into()));
  }

  let id = match value.get("id") {
    None | Some(Value::Null) => None,
    Some(v) => Some(
      as_id(v).ok_or_else(|| Error::InvalidInput("`id` is not an integer".into()))?,
    ),
  };

  let survey = value
    .get("survey")
    .and_then(as_id)
    .ok_or_else(|| Error::InvalidInput("`survey` is missing or not an integer".into()))?;

  let answers = match value.get("answers") {
    None | Some(Value::Null) => Vec::new(),
    Some(Value::Array(items)) => items
      .iter()
      .map(decode_response_answer)
      .collect::<Result<_>>()?,
    Some(_) => return Err(Error::InvalidInput("`answers` must be an array".into())),
  };

  Ok(ResponseInput { id, survey, answers })
}

/// Decode a response payload from raw request bytes.
pub fn decode_response_bytes(bytes: &[u8]) -> Result<ResponseInput> {
  let value: Value = serde_json::from_slice(bytes)
    .map_err(|e| Error::InvalidInput(format!("body is not valid JSON: {e}")))?;
  decode_response(&value)
}

/// `#[serde(with = "codec::selection")]` adapter for stored selections.
pub mod selection {
  use std::collections::BTreeSet;

  use serde::{Deserialize, Deserializer, Serialize, Serializer, de::Error as _};
  use serde_json::Value;

  use super::AnswerSelection;

  pub fn serialize<S: Serializer>(
    ids: &BTreeSet<i64>,
    serializer: S,
  ) -> Result<S::Ok, S::Error> {
    AnswerSelection::from_ids(ids).to_value().serialize(serializer)
  }

  pub fn deserialize<'de, D: Deserializer<'de>>(
    deserializer: D,
  ) -> Result<BTreeSet<i64>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    AnswerSelection::from_value(&value)
      .map(AnswerSelection::into_ids)
      .map_err(D::Error::custom)
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  fn ids(v: &[i64]) -> BTreeSet<i64> { v.iter().copied().collect() }

  #[test]
  fn scalar_yields_singleton() {
    for n in [0, 1, 3, 42, i64::MAX] {
      let sel = AnswerSelection::from_value(&json!(n)).unwrap();
      assert_eq!(sel, AnswerSelection::SingleChoice(n));
      assert_eq!(sel.into_ids(), ids(&[n]));
    }
  }

  #[test]
  fn integral_float_is_a_scalar_but_numeric_string_is_not() {
    assert!(matches!(
      AnswerSelection::from_value(&json!("7")),
      Err(Error::MalformedAnswerPayload { .. })
    ));
    assert_eq!(
      AnswerSelection::from_value(&json!(8.0)).unwrap(),
      AnswerSelection::SingleChoice(8)
    );
    assert!(AnswerSelection::from_value(&json!(8.5)).is_err());
  }

  #[test]
  fn float_ids_beyond_i64_are_rejected() {
    for big in [json!(9223372036854775808.0_f64), json!(1e19), json!(-1e19)] {
      assert!(AnswerSelection::from_value(&big).is_err(), "{big}");
    }
    assert_eq!(
      AnswerSelection::from_value(&json!(-9223372036854775808.0_f64)).unwrap(),
      AnswerSelection::SingleChoice(i64::MIN)
    );
  }

  #[test]
  fn string_question_and_survey_ids_are_rejected() {
    let err = decode_response_answer(&json!({ "question": "1", "answer": 2 })).unwrap_err();
    assert!(matches!(err, Error::MalformedAnswerPayload { ref field, .. } if field == "question"));

    let err = decode_response(&json!({ "survey": "3", "answers": [] })).unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));
  }

  #[test]
  fn map_keeps_only_true_keys() {
    let sel =
      AnswerSelection::from_value(&json!({"5": true, "6": false, "9": true}))
        .unwrap();
    assert_eq!(sel.into_ids(), ids(&[5, 9]));
  }

  #[test]
  fn empty_map_is_unanswered() {
    let sel = AnswerSelection::from_value(&json!({})).unwrap();
    assert!(sel.into_ids().is_empty());
  }

  #[test]
  fn non_boolean_map_value_is_rejected() {
    let err = AnswerSelection::from_value(&json!({"5": "yes"})).unwrap_err();
    assert!(matches!(
      err,
      Error::MalformedAnswerPayload { ref field, .. } if field == "answer.5"
    ));
  }

  #[test]
  fn non_numeric_map_key_is_rejected() {
    let err = AnswerSelection::from_value(&json!({"five": true})).unwrap_err();
    assert!(matches!(err, Error::MalformedAnswerPayload { .. }));
  }

  #[test]
  fn array_and_bool_answers_are_rejected() {
    for bad in [json!([1, 2]), json!(true)] {
      let err = AnswerSelection::from_value(&bad).unwrap_err();
      assert!(matches!(
        err,
        Error::MalformedAnswerPayload { ref field, .. } if field == "answer"
      ));
    }
  }

  #[test]
  fn fragment_errors_name_the_field() {
    let cases = [
      (json!({"answer": 1}), "question"),
      (json!({"question": "abc", "answer": 1}), "question"),
      (json!({"question": 1}), "answer"),
      (json!({"question": 1, "answer": [1]}), "answer"),
    ];
    for (fragment, expected) in cases {
      match decode_response_answer(&fragment) {
        Err(Error::MalformedAnswerPayload { field, .. }) => {
          assert_eq!(field, expected, "fragment: {fragment}")
        }
        other => panic!("unexpected result for {fragment}: {other:?}"),
      }
    }
  }

  #[test]
  fn decodes_whole_payload_and_ignores_user() {
    let input = decode_response(&json!({
      "survey": 7,
      "user": "mallory",
      "answers": [
        {"question": 1, "answer": 3},
        {"question": 2, "answer": {"5": true, "6": false}}
      ]
    }))
    .unwrap();

    assert_eq!(input.id, None);
    assert_eq!(input.survey, 7);
    assert_eq!(input.answers.len(), 2);
    assert_eq!(input.answers[0].question, 1);
    assert_eq!(input.answers[0].selection, AnswerSelection::SingleChoice(3));
    assert_eq!(
      input.answers[1].selection,
      AnswerSelection::MultiSelect(ids(&[5]))
    );
  }

  #[test]
  fn missing_survey_is_invalid_input() {
    let err = decode_response(&json!({"answers": []})).unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));
  }

  #[test]
  fn garbage_bytes_are_invalid_input() {
    let err = decode_response_bytes(b"{not json").unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));
  }

  #[test]
  fn stored_selection_serialises_in_accepted_shape() {
    assert_eq!(AnswerSelection::from_ids(&ids(&[3])).to_value(), json!(3));
    assert_eq!(
      AnswerSelection::from_ids(&ids(&[5, 6])).to_value(),
      json!({"5": true, "6": true})
    );
    assert_eq!(AnswerSelection::from_ids(&ids(&[])).to_value(), json!({}));
  }
}
