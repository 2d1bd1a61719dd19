//! Test tables.

use chrono::NaiveDate;
use prep_core::{
  Field, Response, ResponseTable, Submission,
  schema::{COLUMN_COUNT, TIMESTAMP_FORMAT},
};

/// A response choosing option `n` (wrapping) for every field.
pub fn row(n: usize) -> Response {
  row_with(n, &[])
}

/// Like [`row`], with specific option positions overriding some fields.
pub fn row_with(n: usize, overrides: &[(Field, usize)]) -> Response {
  let answers = Field::all()
    .filter(|f| !f.is_multi_choice())
    .map(|f| {
      let pos = overrides
        .iter()
        .find(|(o, _)| *o == f)
        .map(|(_, p)| *p)
        .unwrap_or(n);
      let options = f.options();
      (f, options[pos % options.len()].to_owned())
    })
    .collect();
  let methods = Field::PreventionMethods.options();
  let ts = NaiveDate::from_ymd_opt(2024, 3, 1)
    .unwrap()
    .and_hms_opt(12, 0, 0)
    .unwrap();
  Submission {
    answers,
    prevention_methods: vec![methods[n % methods.len()].to_owned()],
    consent: true,
  }
  .validate()
  .unwrap()
  .stamp(ts)
}

pub fn table_of(ns: &[usize]) -> ResponseTable {
  ResponseTable::new(ns.iter().map(|n| row(*n)).collect())
}

/// A persisted row whose every field holds `value`.
pub fn legacy_row(value: &str) -> Response {
  let mut columns = vec![value.to_owned(); COLUMN_COUNT - 1];
  columns.push(
    NaiveDate::from_ymd_opt(2023, 1, 1)
      .unwrap()
      .and_hms_opt(0, 0, 0)
      .unwrap()
      .format(TIMESTAMP_FORMAT)
      .to_string(),
  );
  Response::from_record(columns.iter().map(String::as_str)).unwrap()
}
