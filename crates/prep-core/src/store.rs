//! The `ResponseStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `prep-store-csv`).
//! Higher layers (`prep-api`, `prep-web`) depend on this abstraction, not on
//! any concrete backend.

use std::future::Future;

use crate::response::{NewResponse, Response, ResponseTable};

/// Abstraction over an append-only survey response store.
///
/// There is no update or delete operation. Every method returns a `Send`
/// future so the trait can be used in multi-threaded async runtimes (e.g.
/// tokio with `axum`).
pub trait ResponseStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Stamp `response` with the current time and persist it after every
  /// previously stored row.
  ///
  /// Timestamps handed out by one store never decrease.
  fn append(
    &self,
    response: NewResponse,
  ) -> impl Future<Output = Result<Response, Self::Error>> + Send + '_;

  /// Read the whole table in arrival order. An empty table is returned when
  /// nothing has been stored yet.
  fn load(
    &self,
  ) -> impl Future<Output = Result<ResponseTable, Self::Error>> + Send + '_;

  /// The persisted representation, byte for byte, suitable for download.
  fn export(
    &self,
  ) -> impl Future<Output = Result<Vec<u8>, Self::Error>> + Send + '_;

  /// Number of stored rows. Used to detect that the table has changed.
  fn count(
    &self,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;
}
