//! Error type for `prep-analysis`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// Grouping needs at least three responses.
  #[error("not enough data: {rows} responses, at least {required} needed")]
  NotEnoughData { rows: usize, required: usize },

  #[error("cannot cluster {rows} rows into {k} groups")]
  InvalidClusterCount { k: usize, rows: usize },

  #[error("feature matrix is empty")]
  EmptyMatrix,

  #[error("feature rows have differing lengths")]
  RaggedRows,

  #[error("feature matrix contains non-finite values")]
  NonFinite,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
