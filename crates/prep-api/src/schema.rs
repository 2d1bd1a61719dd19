//! Handler for `GET /schema`: the questionnaire as JSON.

use axum::Json;
use prep_core::{
  Field,
  schema::{InputKind, Section},
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct FieldSchema {
  pub column:  &'static str,
  pub prompt:  &'static str,
  pub section: Section,
  pub input:   InputKind,
  pub options: &'static [&'static str],
}

#[derive(Debug, Serialize)]
pub struct SchemaBody {
  pub fields: Vec<FieldSchema>,
}

/// `GET /schema`
pub async fn handler() -> Json<SchemaBody> {
  let fields = Field::all()
    .map(|f| FieldSchema {
      column:  f.column(),
      prompt:  f.prompt(),
      section: f.section(),
      input:   f.input_kind(),
      options: f.options(),
    })
    .collect();
  Json(SchemaBody { fields })
}
