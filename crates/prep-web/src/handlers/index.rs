//! `GET /`: the survey page.

use std::collections::BTreeMap;

use axum::{
  extract::{Query, State},
  response::Html,
};
use prep_core::{Field, store::ResponseStore};
use serde::Deserialize;

use super::{DEFAULT_FIELD, render_page};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct IndexParams {
  /// Column name of the field to chart.
  pub field: Option<String>,
}

pub async fn handler<S>(
  State(state): State<AppState<S>>,
  Query(params): Query<IndexParams>,
) -> Html<String>
where
  S: ResponseStore,
{
  let selected = params
    .field
    .as_deref()
    .and_then(Field::from_column)
    .unwrap_or(DEFAULT_FIELD);
  render_page(&state, selected, None, BTreeMap::new(), false).await
}
