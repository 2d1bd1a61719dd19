pub mod export;
pub mod index;
pub mod submit;

use std::collections::BTreeMap;

use axum::response::Html;
use prep_analysis::{
  Error as AnalysisError,
  stats::{crosstab, frequencies},
};
use prep_core::{Field, ResponseTable, store::ResponseStore};

use crate::{
  AppState, charts, codebook_file,
  page::{self, AnalysisView, DataView, GroupingView, Notice, PageView},
};

/// Field charted when none (or an unknown one) is requested.
pub(super) const DEFAULT_FIELD: Field = Field::PrepKnowledge;

/// Load the table and build every analysis section. Each section fails on
/// its own; a store failure only replaces the analysis area.
async fn data_view<S>(state: &AppState<S>, selected: Field) -> DataView
where
  S: ResponseStore,
{
  let table = match state.store.load().await {
    Ok(t) => t,
    Err(e) => {
      tracing::error!(error = %e, "failed to load responses");
      return DataView::Unavailable(e.to_string());
    }
  };
  if table.is_empty() {
    return DataView::Empty;
  }
  let view = analysis_view(state, &table, selected);
  persist_codebook(state).await;
  DataView::Ready(Box::new(view))
}

/// Write the codebook out as soon as a run has extended it. Failures are
/// logged; the in-memory codebook stays authoritative.
async fn persist_codebook<S>(state: &AppState<S>) {
  let Some(path) = state.config.codebook_path.clone() else {
    return;
  };
  let Some(book) = state.grouping.take_changed() else {
    return;
  };
  let saved =
    tokio::task::spawn_blocking(move || codebook_file::save(&path, &book)).await;
  match saved {
    Ok(Ok(())) => {}
    Ok(Err(e)) => tracing::error!(error = %e, "failed to save codebook"),
    Err(e) => tracing::error!(error = %e, "codebook save task failed"),
  }
}

fn analysis_view<S>(
  state: &AppState<S>,
  table: &ResponseTable,
  selected: Field,
) -> AnalysisView {
  let chart = |r: Result<String, crate::Error>| r.map_err(|e| e.to_string());

  let grouping = match state.grouping.get_or_run(table) {
    Ok(g) => GroupingView::Ready {
      scatter:  chart(charts::group_scatter(&g)),
      profiles: g.profiles.clone(),
    },
    Err(AnalysisError::NotEnoughData { rows, required }) => {
      GroupingView::NotEnoughData { rows, required }
    }
    Err(e) => {
      tracing::error!(error = %e, rows = table.len(), "grouping failed");
      GroupingView::Failed(e.to_string())
    }
  };

  AnalysisView {
    total: table.len(),
    frequency: chart(charts::frequency_bars(&frequencies(table, selected))),
    by_gender: chart(charts::grouped_bars(
      &crosstab(table, Field::Gender, Field::PrepKnowledge),
      "Conhecimento de PrEP por Identidade de Gênero",
      "Conhecimento",
    )),
    by_age: chart(charts::grouped_bars(
      &crosstab(table, Field::AgeBand, Field::PrepKnowledge),
      "Conhecimento de PrEP por Faixa Etária",
      "Conhecimento",
    )),
    grouping,
  }
}

/// Render the page for the current store contents.
pub(super) async fn render_page<S>(
  state: &AppState<S>,
  selected: Field,
  notice: Option<Notice>,
  draft: BTreeMap<Field, Vec<String>>,
  consent: bool,
) -> Html<String>
where
  S: ResponseStore,
{
  let data = data_view(state, selected).await;
  Html(page::render(&PageView { notice, selected, draft, consent, data }))
}
