//! JSON REST API for the survey.
//!
//! Exposes an axum [`Router`] backed by any [`prep_core::store::ResponseStore`].
//! Transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", prep_api::api_router(state.clone()))
//! ```

pub mod analysis;
pub mod error;
pub mod responses;
pub mod schema;

use std::sync::Arc;

use axum::{Router, routing::get};
use prep_analysis::GroupingCache;
use prep_core::store::ResponseStore;

pub use error::ApiError;

/// Shared state for API handlers.
pub struct ApiState<S> {
  pub store:    Arc<S>,
  pub grouping: Arc<GroupingCache>,
}

impl<S> Clone for ApiState<S> {
  fn clone(&self) -> Self {
    Self {
      store:    Arc::clone(&self.store),
      grouping: Arc::clone(&self.grouping),
    }
  }
}

/// Box a backend error for [`ApiError::Store`].
pub(crate) fn store_err<E>(e: E) -> ApiError
where
  E: std::error::Error + Send + Sync + 'static,
{
  ApiError::Store(Box::new(e))
}

/// Build a fully-materialised API router.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: ApiState<S>) -> Router<()>
where
  S: ResponseStore + 'static,
{
  Router::new()
    .route("/schema", get(schema::handler))
    // Responses
    .route(
      "/responses",
      get(responses::list::<S>).post(responses::create::<S>),
    )
    // Statistics
    .route("/frequencies/{field}", get(analysis::frequencies::<S>))
    .route("/crosstab", get(analysis::crosstab::<S>))
    .route("/analysis", get(analysis::grouping::<S>))
    .route("/codebook", get(analysis::codebook::<S>))
    .with_state(state)
}
