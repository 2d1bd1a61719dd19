//! Error types for `prep-core`.

use thiserror::Error;

use crate::schema::Field;

#[derive(Debug, Error)]
pub enum Error {
  #[error("consent is required to submit the survey")]
  ConsentRequired,

  #[error("missing answer for {0}")]
  MissingField(Field),

  #[error("{value:?} is not a valid option for {field}")]
  InvalidOption { field: Field, value: String },

  #[error("unknown field: {0:?}")]
  UnknownField(String),

  #[error("record has {found} columns, expected {expected}")]
  RecordLength { expected: usize, found: usize },

  #[error("invalid timestamp {0:?}")]
  Timestamp(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
