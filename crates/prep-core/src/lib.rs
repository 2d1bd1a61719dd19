//! Core types and trait definitions for the PrEP/HIV survey.
//!
//! This crate is deliberately free of HTTP, file and numeric dependencies.
//! All other crates depend on it; it holds the fixed questionnaire, the
//! response record shape and the storage abstraction.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod response;
pub mod schema;
pub mod store;

pub use error::{Error, Result};
pub use response::{NewResponse, Response, ResponseTable, Submission};
pub use schema::Field;
