//! CSV file backend for the survey response store.
//!
//! Rows are appended to a single comma-separated UTF-8 file with a header
//! line. Blocking file access runs on tokio's blocking pool so the async
//! runtime is never stalled.

mod codec;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::CsvStore;

#[cfg(test)]
mod tests;
