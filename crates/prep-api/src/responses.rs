//! Handlers for `/responses` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/responses` | Whole table in arrival order |
//! | `POST` | `/responses` | Body: [`Submission`]; returns 201 + stored response, 422 if rejected |

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use prep_core::{Response, Submission, store::ResponseStore};

use crate::{ApiState, error::ApiError, store_err};

/// `GET /responses`
pub async fn list<S>(
  State(state): State<ApiState<S>>,
) -> Result<Json<Vec<Response>>, ApiError>
where
  S: ResponseStore,
{
  let table = state.store.load().await.map_err(store_err)?;
  Ok(Json(table.rows().to_vec()))
}

/// `POST /responses`: returns 201 + the stored [`Response`].
pub async fn create<S>(
  State(state): State<ApiState<S>>,
  Json(body): Json<Submission>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ResponseStore,
{
  let new = body.validate().inspect_err(|e| {
    tracing::info!(reason = %e, "rejected api submission");
  })?;
  let stored = state.store.append(new).await.map_err(store_err)?;
  tracing::info!(timestamp = %stored.timestamp, "recorded api submission");
  Ok((StatusCode::CREATED, Json(stored)))
}
