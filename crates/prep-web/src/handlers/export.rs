//! `GET /export`: download the stored responses.

use axum::{
  body::Body,
  extract::State,
  http::{StatusCode, header},
  response::Response,
};
use prep_core::store::ResponseStore;

use crate::{AppState, error::Error};

/// Download name when the store path has no usable file name.
pub const EXPORT_FILENAME: &str = "respostas_prep.csv";

pub async fn handler<S>(State(state): State<AppState<S>>) -> Result<Response, Error>
where
  S: ResponseStore,
{
  let bytes = state.store.export().await.map_err(Error::store)?;
  let filename = state
    .config
    .store_path
    .file_name()
    .and_then(|n| n.to_str())
    .filter(|n| n.chars().all(|c| c.is_ascii_graphic() && c != '"'))
    .unwrap_or(EXPORT_FILENAME);
  tracing::info!(bytes = bytes.len(), filename, "exported responses");

  Response::builder()
    .status(StatusCode::OK)
    .header(header::CONTENT_TYPE, "text/csv; charset=utf-8")
    .header(
      header::CONTENT_DISPOSITION,
      format!("attachment; filename=\"{filename}\""),
    )
    .header(header::CONTENT_LENGTH, bytes.len())
    .body(Body::from(bytes))
    .map_err(Error::from)
}
