//! Response records: one respondent's answer set plus submission time.
//!
//! Submissions arrive as loosely-typed [`Submission`]s and become
//! [`NewResponse`]s only through [`Submission::validate`]. The store stamps a
//! [`NewResponse`] with the current time to produce a [`Response`]. Responses
//! are never updated or deleted.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  schema::{COLUMN_COUNT, Field, MULTI_CHOICE_SEPARATOR, TIMESTAMP_FORMAT},
};

// ─── Submission ──────────────────────────────────────────────────────────────

/// Raw form or API input, before validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Submission {
  /// Single-choice answers keyed by field.
  #[serde(default)]
  pub answers:            BTreeMap<Field, String>,
  /// Selections for the multi-choice field, in any order.
  #[serde(default)]
  pub prevention_methods: Vec<String>,
  #[serde(default)]
  pub consent:            bool,
}

impl Submission {
  /// Check consent and every answer against its option set.
  ///
  /// Multi-choice selections are de-duplicated and re-ordered into option-set
  /// order before joining, so equal selections always persist identically.
  pub fn validate(self) -> Result<NewResponse> {
    if !self.consent {
      return Err(Error::ConsentRequired);
    }

    let mut selections = self.prevention_methods;
    let mut answers = self.answers;
    if let Some(joined) = answers.remove(&Field::PreventionMethods) {
      selections.extend(
        joined
          .split(',')
          .map(str::trim)
          .filter(|s| !s.is_empty())
          .map(str::to_owned),
      );
    }

    let mut values = BTreeMap::new();
    for field in Field::all() {
      if field.is_multi_choice() {
        values.insert(field, join_selections(field, &selections)?);
        continue;
      }
      let value = answers.remove(&field).ok_or(Error::MissingField(field))?;
      field.check_option(&value)?;
      values.insert(field, value);
    }

    Ok(NewResponse { values })
  }
}

fn join_selections(field: Field, selections: &[String]) -> Result<String> {
  let mut indices = Vec::with_capacity(selections.len());
  for s in selections {
    let idx = field.option_index(s).ok_or_else(|| Error::InvalidOption {
      field,
      value: s.clone(),
    })?;
    indices.push(idx);
  }
  indices.sort_unstable();
  indices.dedup();

  let options = field.options();
  Ok(
    indices
      .into_iter()
      .map(|i| options[i])
      .collect::<Vec<_>>()
      .join(MULTI_CHOICE_SEPARATOR),
  )
}

// ─── NewResponse ─────────────────────────────────────────────────────────────

/// A validated answer set awaiting its timestamp.
/// Only constructible through [`Submission::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewResponse {
  values: BTreeMap<Field, String>,
}

impl NewResponse {
  pub fn get(&self, field: Field) -> &str {
    self.values.get(&field).map(String::as_str).unwrap_or_default()
  }

  /// Attach the server-assigned submission time.
  pub fn stamp(self, timestamp: NaiveDateTime) -> Response {
    Response { values: self.values, timestamp }
  }
}

// ─── Response ────────────────────────────────────────────────────────────────

/// One persisted row. Serialises as a flat JSON object keyed by column name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
  #[serde(flatten)]
  values:        BTreeMap<Field, String>,
  pub timestamp: NaiveDateTime,
}

impl Response {
  /// The stored value of `field`; empty when the row predates the column.
  pub fn get(&self, field: Field) -> &str {
    self.values.get(&field).map(String::as_str).unwrap_or_default()
  }

  /// The individual selections of a multi-choice field.
  pub fn selections(&self, field: Field) -> impl Iterator<Item = &str> {
    self
      .get(field)
      .split(',')
      .map(str::trim)
      .filter(|s| !s.is_empty())
  }

  /// The persisted row: field values in column order, then the timestamp.
  pub fn to_record(&self) -> Vec<String> {
    Field::all()
      .map(|f| self.get(f).to_owned())
      .chain(std::iter::once(
        self.timestamp.format(TIMESTAMP_FORMAT).to_string(),
      ))
      .collect()
  }

  /// Rebuild a row from persisted columns. Values are not re-checked against
  /// their option sets; historical rows are kept verbatim.
  pub fn from_record<'a, I>(record: I) -> Result<Self>
  where
    I: IntoIterator<Item = &'a str>,
  {
    let columns: Vec<&str> = record.into_iter().collect();
    if columns.len() != COLUMN_COUNT {
      return Err(Error::RecordLength {
        expected: COLUMN_COUNT,
        found:    columns.len(),
      });
    }

    let values = Field::all()
      .zip(columns.iter())
      .map(|(f, v)| (f, (*v).to_owned()))
      .collect();
    let raw = columns[COLUMN_COUNT - 1];
    let timestamp = NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
      .map_err(|_| Error::Timestamp(raw.to_owned()))?;

    Ok(Self { values, timestamp })
  }
}

// ─── ResponseTable ───────────────────────────────────────────────────────────

/// All responses in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResponseTable {
  rows: Vec<Response>,
}

impl ResponseTable {
  pub fn new(rows: Vec<Response>) -> Self { Self { rows } }

  pub fn len(&self) -> usize { self.rows.len() }

  pub fn is_empty(&self) -> bool { self.rows.is_empty() }

  pub fn rows(&self) -> &[Response] { &self.rows }

  pub fn iter(&self) -> std::slice::Iter<'_, Response> { self.rows.iter() }

  pub fn last(&self) -> Option<&Response> { self.rows.last() }

  /// Every row's value for `field`, in arrival order.
  pub fn column(&self, field: Field) -> impl Iterator<Item = &str> {
    self.rows.iter().map(move |r| r.get(field))
  }

  pub fn push(&mut self, response: Response) { self.rows.push(response); }
}

impl<'a> IntoIterator for &'a ResponseTable {
  type IntoIter = std::slice::Iter<'a, Response>;
  type Item = &'a Response;

  fn into_iter(self) -> Self::IntoIter { self.rows.iter() }
}
