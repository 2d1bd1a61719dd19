//! Frequency counts and cross-tabulations over the response table.

use prep_core::{Field, Response, ResponseTable};
use serde::Serialize;

/// Label counted for a multi-choice answer with nothing selected.
pub const NO_SELECTION: &str = "Nenhum";

/// One bar of a frequency chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Count {
  pub value: String,
  pub count: usize,
}

/// The values one response contributes to `field`'s statistics. Multi-choice
/// answers contribute each selection separately.
fn values_of(response: &Response, field: Field) -> Vec<&str> {
  if field.is_multi_choice() {
    let picked: Vec<&str> = response.selections(field).collect();
    if picked.is_empty() { vec![NO_SELECTION] } else { picked }
  } else {
    vec![response.get(field)]
  }
}

/// Value counts for `field`, most frequent first; ties keep first-appearance
/// order.
pub fn frequencies(table: &ResponseTable, field: Field) -> Vec<Count> {
  count_values(table, field)
}

/// The most frequent value of `field` among `rows`, if any.
pub fn mode<'a, I>(rows: I, field: Field) -> Option<String>
where
  I: IntoIterator<Item = &'a Response>,
{
  count_values(rows, field).into_iter().next().map(|c| c.value)
}

fn count_values<'a, I>(rows: I, field: Field) -> Vec<Count>
where
  I: IntoIterator<Item = &'a Response>,
{
  let mut counts: Vec<Count> = Vec::new();
  for response in rows {
    for value in values_of(response, field) {
      match counts.iter_mut().find(|c| c.value == value) {
        Some(c) => c.count += 1,
        None => counts.push(Count { value: value.to_owned(), count: 1 }),
      }
    }
  }
  // Stable sort keeps first-appearance order among equal counts.
  counts.sort_by(|a, b| b.count.cmp(&a.count));
  counts
}

/// A contingency table of `rows` × `cols` counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Crosstab {
  pub row_field: Field,
  pub col_field: Field,
  /// Row labels; values in option-set order, then unseen values.
  pub rows:      Vec<String>,
  pub cols:      Vec<String>,
  /// `counts[r][c]` responses with row label `r` and column label `c`.
  pub counts:    Vec<Vec<usize>>,
}

impl Crosstab {
  pub fn total(&self) -> usize { self.counts.iter().flatten().sum() }
}

/// Labels present in the data for `field`, in option order then first
/// appearance.
fn present_labels(table: &ResponseTable, field: Field) -> Vec<String> {
  let mut seen: Vec<String> = Vec::new();
  for response in table {
    for v in values_of(response, field) {
      if !seen.iter().any(|s| s == v) {
        seen.push(v.to_owned());
      }
    }
  }
  let rank = |v: &str| field.option_index(v).unwrap_or(usize::MAX);
  // Stable: unseen values keep first-appearance order after known options.
  seen.sort_by_key(|v| rank(v.as_str()));
  seen
}

/// Cross-tabulate two fields. Only labels that occur are included.
pub fn crosstab(table: &ResponseTable, row_field: Field, col_field: Field) -> Crosstab {
  let rows = present_labels(table, row_field);
  let cols = present_labels(table, col_field);
  let mut counts = vec![vec![0; cols.len()]; rows.len()];

  for response in table {
    for r in values_of(response, row_field) {
      for c in values_of(response, col_field) {
        let ri = rows.iter().position(|x| x == r);
        let ci = cols.iter().position(|x| x == c);
        if let (Some(ri), Some(ci)) = (ri, ci) {
          counts[ri][ci] += 1;
        }
      }
    }
  }

  Crosstab { row_field, col_field, rows, cols, counts }
}
