//! Handlers for statistics and grouping endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/frequencies/{field}` | Value counts; `field` is a column name |
//! | `GET`  | `/crosstab?rows=..&cols=..` | Contingency table of two columns |
//! | `GET`  | `/analysis` | Grouping result; 409 with fewer than three responses; reused while the row count is unchanged |
//! | `GET`  | `/codebook` | Current categorical codes |

use axum::{
  Json,
  extract::{Path, Query, State},
};
use prep_analysis::{
  Codebook, Grouping,
  stats::{self, Count, Crosstab},
};
use prep_core::{Field, store::ResponseStore};
use serde::Deserialize;

use crate::{ApiState, error::ApiError, store_err};

fn parse_field(name: &str) -> Option<Field> { Field::from_column(name) }

/// `GET /frequencies/{field}`
pub async fn frequencies<S>(
  State(state): State<ApiState<S>>,
  Path(field): Path<String>,
) -> Result<Json<Vec<Count>>, ApiError>
where
  S: ResponseStore,
{
  let field = parse_field(&field)
    .ok_or_else(|| ApiError::NotFound(format!("field {field:?} not found")))?;
  let table = state.store.load().await.map_err(store_err)?;
  Ok(Json(stats::frequencies(&table, field)))
}

#[derive(Debug, Deserialize)]
pub struct CrosstabParams {
  pub rows: String,
  pub cols: String,
}

/// `GET /crosstab?rows=<column>&cols=<column>`
pub async fn crosstab<S>(
  State(state): State<ApiState<S>>,
  Query(params): Query<CrosstabParams>,
) -> Result<Json<Crosstab>, ApiError>
where
  S: ResponseStore,
{
  let lookup = |name: &str| {
    parse_field(name)
      .ok_or_else(|| ApiError::BadRequest(format!("unknown field {name:?}")))
  };
  let rows = lookup(&params.rows)?;
  let cols = lookup(&params.cols)?;
  let table = state.store.load().await.map_err(store_err)?;
  Ok(Json(stats::crosstab(&table, rows, cols)))
}

/// `GET /analysis`
pub async fn grouping<S>(
  State(state): State<ApiState<S>>,
) -> Result<Json<Grouping>, ApiError>
where
  S: ResponseStore,
{
  let rows = state.store.count().await.map_err(store_err)?;
  let grouping = match state.grouping.cached(rows) {
    Some(g) => g,
    None => {
      let table = state.store.load().await.map_err(store_err)?;
      state.grouping.get_or_run(&table)?
    }
  };
  Ok(Json(Grouping::clone(&grouping)))
}

/// `GET /codebook`
pub async fn codebook<S>(State(state): State<ApiState<S>>) -> Json<Codebook>
where
  S: ResponseStore,
{
  Json(state.grouping.codebook())
}
