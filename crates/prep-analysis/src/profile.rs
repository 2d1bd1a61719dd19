//! Per-group summaries and the interpretive labels derived from them.
//!
//! A group's label comes from how its mean knowledge score ranks against the
//! other groups, never from the group's numeric index, so a label always
//! describes the respondents it is attached to.

use std::collections::BTreeMap;

use prep_core::{Field, Response, ResponseTable};
use serde::Serialize;

use crate::stats::mode;

/// Fields whose answers feed the knowledge score.
pub const KNOWLEDGE_FIELDS: [Field; 2] = [Field::PrepKnowledge, Field::PepKnowledge];

#[derive(Debug, Clone, Serialize)]
pub struct GroupProfile {
  pub group:           usize,
  pub size:            usize,
  /// Mean knowledge score in `0.0..=3.0`; `None` when no member gave a
  /// recognised knowledge answer.
  pub knowledge_score: Option<f64>,
  /// Derived from the rank of `knowledge_score` among all groups.
  pub label:           String,
  /// Most common answer per field among the group's members.
  pub modes:           BTreeMap<Field, String>,
}

/// Score of one knowledge answer: 3 for "knows well" down to 0 for "does not
/// know". Values outside the option set are not scored.
pub fn knowledge_points(field: Field, value: &str) -> Option<f64> {
  let options = field.options().len();
  field
    .option_index(value)
    .map(|i| (options - 1 - i) as f64)
}

fn mean_knowledge(members: &[&Response]) -> Option<f64> {
  let points: Vec<f64> = members
    .iter()
    .flat_map(|r| {
      KNOWLEDGE_FIELDS
        .iter()
        .filter_map(|f| knowledge_points(*f, r.get(*f)))
    })
    .collect();
  if points.is_empty() {
    None
  } else {
    Some(points.iter().sum::<f64>() / points.len() as f64)
  }
}

/// Interpretive labels from highest to lowest knowledge for `k` groups.
fn rank_labels(k: usize) -> Vec<&'static str> {
  match k {
    0 => vec![],
    1 => vec!["Grupo único"],
    2 => vec!["Maior conhecimento", "Menor conhecimento"],
    _ => {
      let mut labels = vec!["Maior conhecimento"];
      labels.extend(std::iter::repeat_n("Conhecimento intermediário", k - 2));
      labels.push("Menor conhecimento");
      labels
    }
  }
}

/// Summarise each of the `k` groups given one label per table row.
pub fn profiles(table: &ResponseTable, labels: &[usize], k: usize) -> Vec<GroupProfile> {
  let mut members: Vec<Vec<&Response>> = vec![Vec::new(); k];
  for (response, &group) in table.iter().zip(labels) {
    if let Some(m) = members.get_mut(group) {
      m.push(response);
    }
  }

  let mut out: Vec<GroupProfile> = members
    .iter()
    .enumerate()
    .map(|(group, rows)| GroupProfile {
      group,
      size: rows.len(),
      knowledge_score: mean_knowledge(rows),
      label: String::new(),
      modes: Field::all()
        .filter_map(|f| mode(rows.iter().copied(), f).map(|m| (f, m)))
        .collect(),
    })
    .collect();

  // Highest score first; unscored groups last; ties by group index.
  let mut order: Vec<usize> = (0..k).collect();
  order.sort_by(|&a, &b| {
    let sa = out[a].knowledge_score.unwrap_or(f64::NEG_INFINITY);
    let sb = out[b].knowledge_score.unwrap_or(f64::NEG_INFINITY);
    sb.total_cmp(&sa).then(a.cmp(&b))
  });
  for (rank, label) in order.into_iter().zip(rank_labels(k)) {
    out[rank].label = label.to_owned();
  }
  out
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::fixtures::row_with;

  fn knower(level: usize) -> Response {
    row_with(0, &[(Field::PrepKnowledge, level), (Field::PepKnowledge, level)])
  }

  #[test]
  fn knowledge_points_descend_with_option_order() {
    let opts = Field::PrepKnowledge.options();
    assert_eq!(knowledge_points(Field::PrepKnowledge, opts[0]), Some(3.0));
    assert_eq!(knowledge_points(Field::PrepKnowledge, opts[3]), Some(0.0));
    assert_eq!(knowledge_points(Field::PrepKnowledge, "talvez"), None);
  }

  #[test]
  fn labels_follow_scores_not_indices() {
    // Group 0 knows little, group 1 knows a lot.
    let table = ResponseTable::new(vec![knower(3), knower(3), knower(0), knower(0)]);
    let p = profiles(&table, &[0, 0, 1, 1], 2);
    assert_eq!(p[0].knowledge_score, Some(0.0));
    assert_eq!(p[1].knowledge_score, Some(3.0));
    assert_eq!(p[0].label, "Menor conhecimento");
    assert_eq!(p[1].label, "Maior conhecimento");
  }

  #[test]
  fn three_groups_get_an_intermediate_label() {
    let table = ResponseTable::new(vec![knower(1), knower(0), knower(3)]);
    let p = profiles(&table, &[0, 1, 2], 3);
    assert_eq!(p[0].label, "Conhecimento intermediário");
    assert_eq!(p[1].label, "Maior conhecimento");
    assert_eq!(p[2].label, "Menor conhecimento");
  }

  #[test]
  fn profile_sizes_and_modes() {
    let table = ResponseTable::new(vec![
      row_with(0, &[(Field::AgeBand, 1)]),
      row_with(0, &[(Field::AgeBand, 1)]),
      row_with(0, &[(Field::AgeBand, 4)]),
    ]);
    let p = profiles(&table, &[0, 0, 1], 2);
    assert_eq!(p[0].size, 2);
    assert_eq!(p[1].size, 1);
    assert_eq!(p[0].modes[&Field::AgeBand], "18-24");
    assert_eq!(p[1].modes[&Field::AgeBand], "40-49");
  }
}
