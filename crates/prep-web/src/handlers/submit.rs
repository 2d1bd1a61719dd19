//! `POST /submit`: record one survey response from the form.
//!
//! The form posts `application/x-www-form-urlencoded` pairs keyed by column
//! name. The multi-choice field arrives as repeated keys and the consent
//! checkbox as `consent=on`. Whatever happens, the page is rendered again
//! with a notice; a rejected or failed submission keeps the visitor's
//! answers selected.

use std::collections::BTreeMap;

use axum::{Form, extract::State, response::Html};
use prep_core::{Error as CoreError, Field, Submission, store::ResponseStore};

use super::{DEFAULT_FIELD, render_page};
use crate::{AppState, page::Notice};

pub const CONSENT_KEY: &str = "consent";

/// Group posted pairs by field. Unknown keys are ignored.
fn collect(pairs: Vec<(String, String)>) -> (BTreeMap<Field, Vec<String>>, bool) {
  let mut draft: BTreeMap<Field, Vec<String>> = BTreeMap::new();
  let mut consent = false;
  for (key, value) in pairs {
    if key == CONSENT_KEY {
      consent = matches!(value.as_str(), "on" | "true" | "1");
    } else if let Some(field) = Field::from_column(&key) {
      draft.entry(field).or_default().push(value);
    }
  }
  (draft, consent)
}

fn submission(draft: &BTreeMap<Field, Vec<String>>, consent: bool) -> Submission {
  let mut out = Submission { consent, ..Submission::default() };
  for (&field, values) in draft {
    if field.is_multi_choice() {
      out.prevention_methods.extend(values.iter().cloned());
    } else if let Some(first) = values.first() {
      out.answers.insert(field, first.clone());
    }
  }
  out
}

pub async fn handler<S>(
  State(state): State<AppState<S>>,
  Form(pairs): Form<Vec<(String, String)>>,
) -> Html<String>
where
  S: ResponseStore,
{
  let (draft, consent) = collect(pairs);

  let notice = match submission(&draft, consent).validate() {
    Err(CoreError::ConsentRequired) => {
      tracing::info!("submission rejected: consent not given");
      Notice::ConsentRequired
    }
    Err(e) => {
      tracing::info!(reason = %e, "submission rejected");
      Notice::Rejected(e.to_string())
    }
    Ok(new) => match state.store.append(new).await {
      Ok(stored) => {
        tracing::info!(timestamp = %stored.timestamp, "recorded submission");
        // A fresh form after a successful submission.
        return render_page(
          &state,
          DEFAULT_FIELD,
          Some(Notice::Thanks),
          BTreeMap::new(),
          false,
        )
        .await;
      }
      Err(e) => {
        tracing::error!(error = %e, "failed to store submission");
        Notice::StoreFailed
      }
    },
  };

  render_page(&state, DEFAULT_FIELD, Some(notice), draft, consent).await
}
