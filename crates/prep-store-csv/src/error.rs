//! Error type for `prep-store-csv`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] prep_core::Error),

  #[error("i/o error: {0}")]
  Io(#[from] std::io::Error),

  #[error("csv error: {0}")]
  Csv(#[from] csv::Error),

  /// The file exists but its header is not the survey's column list.
  #[error("unexpected header: expected {expected:?}, found {found:?}")]
  Header {
    expected: Vec<String>,
    found:    Vec<String>,
  },

  #[error("malformed row at line {line}: {source}")]
  Row {
    line:   u64,
    #[source]
    source: prep_core::Error,
  },

  #[error("blocking task failed: {0}")]
  Join(#[from] tokio::task::JoinError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
