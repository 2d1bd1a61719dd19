//! Survey web front-end.
//!
//! Serves the single survey page (form, charts and grouping), the CSV
//! download, and nests the JSON API from `prep-api` under `/api`. Backed by
//! any [`ResponseStore`].

pub mod charts;
pub mod codebook_file;
pub mod error;
pub mod handlers;
pub mod page;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{get, post},
};
use prep_analysis::GroupingCache;
use prep_api::ApiState;
use prep_core::store::ResponseStore;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and `PREP_*`
/// environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:          String,
  pub port:          u16,
  pub store_path:    PathBuf,
  /// Where the categorical codebook is kept between restarts. Without it
  /// the codebook starts from the option sets on every launch.
  #[serde(default)]
  pub codebook_path: Option<PathBuf>,
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S> {
  pub store:    Arc<S>,
  pub grouping: Arc<GroupingCache>,
  pub config:   Arc<ServerConfig>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:    Arc::clone(&self.store),
      grouping: Arc::clone(&self.grouping),
      config:   Arc::clone(&self.config),
    }
  }
}

impl<S> AppState<S> {
  /// The same store and cache, viewed as API state.
  pub fn api_state(&self) -> ApiState<S> {
    ApiState {
      store:    Arc::clone(&self.store),
      grouping: Arc::clone(&self.grouping),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full application router: page, form submission, export and
/// the JSON API under `/api`.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: ResponseStore + 'static,
{
  let api = prep_api::api_router(state.api_state());

  Router::new()
    .route("/",       get(handlers::index::handler::<S>))
    .route("/submit", post(handlers::submit::handler::<S>))
    .route("/export", get(handlers::export::handler::<S>))
    .with_state(state)
    .nest("/api", api)
    .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
  use super::*;

  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use prep_core::{Field, store::ResponseStore as _};
  use prep_store_csv::CsvStore;
  use tempfile::TempDir;
  use tower::ServiceExt as _;

  async fn make_state() -> (TempDir, AppState<CsvStore>) {
    let dir = tempfile::tempdir().unwrap();
    let state = state_in(&dir, "respostas_prep.csv", None).await;
    (dir, state)
  }

  async fn state_in(
    dir: &TempDir,
    file: &str,
    codebook_path: Option<PathBuf>,
  ) -> AppState<CsvStore> {
    let path = dir.path().join(file);
    let store = CsvStore::open(&path).await.unwrap();
    AppState {
      store:    Arc::new(store),
      grouping: Arc::new(GroupingCache::default()),
      config:   Arc::new(ServerConfig {
        host: "127.0.0.1".into(),
        port: 0,
        store_path: path,
        codebook_path,
      }),
    }
  }

  /// Put a non-empty directory where the CSV file should be, so every read
  /// and append fails.
  fn block_store_file(state: &AppState<CsvStore>) {
    let path = &state.config.store_path;
    std::fs::create_dir(path).unwrap();
    std::fs::write(path.join("occupied"), b"x").unwrap();
  }

  /// Minimal `application/x-www-form-urlencoded` encoder.
  fn urlencode(s: &str) -> String {
    let mut out = String::new();
    for b in s.bytes() {
      match b {
        b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
          out.push(b as char)
        }
        b' ' => out.push('+'),
        _ => out.push_str(&format!("%{b:02X}")),
      }
    }
    out
  }

  /// A complete form body picking option `n` (mod option count) everywhere.
  fn form(n: usize, consent: bool) -> String {
    let mut pairs: Vec<(String, String)> = Field::all()
      .filter(|f| !f.is_multi_choice())
      .map(|f| {
        let options = f.options();
        (f.column().to_owned(), options[n % options.len()].to_owned())
      })
      .collect();
    pairs.push((Field::PreventionMethods.column().into(), "PrEP".into()));
    pairs.push((Field::PreventionMethods.column().into(), "Camisinha masculina".into()));
    if consent {
      pairs.push(("consent".into(), "on".into()));
    }
    pairs
      .iter()
      .map(|(k, v)| format!("{}={}", urlencode(k), urlencode(v)))
      .collect::<Vec<_>>()
      .join("&")
  }

  async fn get_page(state: AppState<CsvStore>, uri: &str) -> (StatusCode, String) {
    let resp = router(state)
      .oneshot(Request::get(uri).body(Body::empty()).unwrap())
      .await
      .unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
      .await
      .unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
  }

  async fn submit(state: AppState<CsvStore>, body: String) -> (StatusCode, String) {
    let req = Request::post("/submit")
      .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
      .body(Body::from(body))
      .unwrap();
    let resp = router(state).oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
      .await
      .unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
  }

  #[tokio::test]
  async fn empty_store_shows_no_data_notice() {
    let (_dir, state) = make_state().await;
    let (status, html) = get_page(state, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("Não há dados coletados ainda"));
    assert!(html.contains(r#"name="consent""#));
    assert!(!html.contains("Total de Respostas"));
  }

  #[tokio::test]
  async fn form_lists_every_field() {
    let (_dir, state) = make_state().await;
    let (_, html) = get_page(state, "/").await;
    for field in Field::all() {
      assert!(
        html.contains(&format!(r#"name="{}""#, field.column())),
        "missing input for {field}"
      );
    }
  }

  #[tokio::test]
  async fn submit_without_consent_writes_nothing() {
    let (_dir, state) = make_state().await;
    let (status, html) = submit(state.clone(), form(0, false)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("Você precisa concordar com os termos de consentimento"));
    assert_eq!(state.store.count().await.unwrap(), 0);
  }

  #[tokio::test]
  async fn submit_with_consent_records_response() {
    let (_dir, state) = make_state().await;
    let (status, html) = submit(state.clone(), form(1, true)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("Obrigado por participar da pesquisa!"));

    let table = state.store.load().await.unwrap();
    assert_eq!(table.len(), 1);
    assert_eq!(table.rows()[0].get(Field::AgeBand), "18-24");
    assert_eq!(table.rows()[0].get(Field::PreventionMethods), "PrEP, Camisinha masculina");
    assert!(html.contains("Total de Respostas: 1"));
  }

  #[tokio::test]
  async fn missing_answer_is_an_inline_error() {
    let (_dir, state) = make_state().await;
    let (status, html) = submit(state.clone(), "consent=on".into()).await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("Resposta inválida"));
    assert_eq!(state.store.count().await.unwrap(), 0);
  }

  #[tokio::test]
  async fn two_rows_are_not_enough_for_grouping() {
    let (_dir, state) = make_state().await;
    for n in 0..2 {
      submit(state.clone(), form(n, true)).await;
    }
    let (_, html) = get_page(state, "/").await;
    assert!(html.contains("Total de Respostas: 2"));
    assert!(html.contains("Dados insuficientes"));
    assert!(!html.contains(r#"id="grouping-scatter""#));
  }

  #[tokio::test]
  async fn three_rows_render_the_grouping() {
    let (_dir, state) = make_state().await;
    for n in 0..3 {
      submit(state.clone(), form(n, true)).await;
    }
    let (_, html) = get_page(state, "/").await;
    assert!(html.contains(r#"id="grouping-scatter""#));
    assert!(!html.contains("Dados insuficientes"));
    assert!(html.contains("Maior conhecimento"));
  }

  #[tokio::test]
  async fn field_selector_changes_the_frequency_chart() {
    let (_dir, state) = make_state().await;
    submit(state.clone(), form(0, true)).await;
    let (_, html) = get_page(state.clone(), "/?field=Genero").await;
    assert!(html.contains("Distribuição de Genero"));
    assert!(html.contains(r#"<option value="Genero" selected>"#));

    // Unknown names fall back to the first column.
    let (status, html) = get_page(state, "/?field=nada").await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("Distribuição de Conhecimento_PrEP"));
  }

  #[tokio::test]
  async fn export_is_byte_identical() {
    let (dir, state) = make_state().await;
    for n in 0..2 {
      submit(state.clone(), form(n, true)).await;
    }
    let resp = router(state)
      .oneshot(Request::get("/export").body(Body::empty()).unwrap())
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(
      resp.headers()[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/csv")
    );
    assert!(
      resp.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .contains("respostas_prep.csv")
    );
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
      .await
      .unwrap();
    let on_disk = std::fs::read(dir.path().join("respostas_prep.csv")).unwrap();
    assert_eq!(bytes.as_ref(), on_disk.as_slice());
  }

  #[tokio::test]
  async fn api_is_nested() {
    let (_dir, state) = make_state().await;
    let (status, body) = get_page(state, "/api/schema").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Conhecimento_PrEP"));
  }

  #[tokio::test]
  async fn failed_append_keeps_answers_and_keeps_serving() {
    let (_dir, state) = make_state().await;
    block_store_file(&state);

    let (status, html) = submit(state.clone(), form(1, true)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("Não foi possível salvar sua resposta"));
    assert!(!html.contains("Obrigado por participar"));
    // The visitor's answers are still selected.
    assert!(html.contains(r#"<option value="Homem cisgênero" selected>"#));
    assert!(html.contains(r#"value="Camisinha masculina" checked>"#));
    assert!(html.contains(r#"name="consent" value="on" checked>"#));

    // Once the file can be written again, the next submission goes through.
    std::fs::remove_dir_all(&state.config.store_path).unwrap();
    let (_, html) = submit(state.clone(), form(1, true)).await;
    assert!(html.contains("Obrigado por participar da pesquisa!"));
    assert_eq!(state.store.load().await.unwrap().len(), 1);
  }

  #[tokio::test]
  async fn failed_load_only_replaces_the_analysis() {
    let (_dir, state) = make_state().await;
    block_store_file(&state);

    let (status, html) = get_page(state, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("Não foi possível carregar as respostas"));
    assert!(html.contains(r#"name="consent""#));
    assert!(html.contains("Enviar Respostas"));
    assert!(!html.contains("Não há dados coletados ainda"));
  }

  #[tokio::test]
  async fn grown_codebook_is_saved_right_away() {
    let dir = tempfile::tempdir().unwrap();
    let book_path = dir.path().join("codebook.json");
    let state = state_in(&dir, "respostas_prep.csv", Some(book_path.clone())).await;

    for n in 0..2 {
      submit(state.clone(), form(n, true)).await;
    }
    // A value from an older questionnaire, already on disk.
    let csv = std::fs::read_to_string(&state.config.store_path).unwrap();
    std::fs::write(&state.config.store_path, csv.replacen("Branca", "Valor antigo", 1))
      .unwrap();
    assert!(!book_path.exists());

    submit(state.clone(), form(2, true)).await;
    let saved = codebook_file::load(&book_path).unwrap();
    assert_eq!(saved.lookup(Field::Race, "Valor antigo"), Some(Field::Race.options().len()));
  }

  #[tokio::test]
  async fn export_is_named_after_the_store_file() {
    let dir = tempfile::tempdir().unwrap();
    let state = state_in(&dir, "coleta_2024.csv", None).await;
    let resp = router(state)
      .oneshot(Request::get("/export").body(Body::empty()).unwrap())
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
      resp.headers()[header::CONTENT_DISPOSITION],
      "attachment; filename=\"coleta_2024.csv\""
    );
  }
}
