//! The grouping pipeline: encode → standardise → cluster → project.

use prep_core::ResponseTable;
use serde::Serialize;

use crate::{
  Error, Result,
  encode::Codebook,
  kmeans::{DEFAULT_SEED, KMeans},
  matrix::standardize,
  pca::project,
  profile::{GroupProfile, profiles},
};

/// Fewest responses the pipeline will run on.
pub const MIN_ROWS: usize = 3;

/// Upper bound on the number of groups.
pub const MAX_GROUPS: usize = 3;

/// Number of groups for a table of `rows` responses.
pub fn group_count(rows: usize) -> usize { MAX_GROUPS.min(rows.saturating_sub(1)) }

/// Everything the grouping section of the page needs. Recomputed from the
/// whole table on every run; nothing here is persisted.
#[derive(Debug, Clone, Serialize)]
pub struct Grouping {
  pub rows:               usize,
  pub k:                  usize,
  /// Group of each response, in table order.
  pub labels:             Vec<usize>,
  /// Projected `[pc1, pc2]` of each response, in table order.
  pub coordinates:        Vec<[f64; 2]>,
  pub explained_variance: [f64; 2],
  pub inertia:            f64,
  pub iterations:         usize,
  pub profiles:           Vec<GroupProfile>,
  pub codebook_version:   u32,
}

#[derive(Debug, Clone, Copy)]
pub struct GroupingPipeline {
  pub seed: u64,
}

impl Default for GroupingPipeline {
  fn default() -> Self { Self { seed: DEFAULT_SEED } }
}

impl GroupingPipeline {
  /// Run on `table`, extending `codebook` with any unseen answers.
  pub fn run(&self, table: &ResponseTable, codebook: &mut Codebook) -> Result<Grouping> {
    let rows = table.len();
    if rows < MIN_ROWS {
      return Err(Error::NotEnoughData { rows, required: MIN_ROWS });
    }

    let encoded = codebook.encode(table);
    let features = standardize(&encoded);

    let k = group_count(rows);
    let fit = KMeans::new(k).with_seed(self.seed).fit(&features)?;
    let projection = project(&features)?;

    tracing::info!(
      rows,
      k,
      inertia = fit.inertia,
      iterations = fit.iterations,
      "grouping pipeline finished"
    );

    Ok(Grouping {
      rows,
      k,
      profiles: profiles(table, &fit.labels, k),
      labels: fit.labels,
      coordinates: projection.coordinates,
      explained_variance: projection.explained_variance,
      inertia: fit.inertia,
      iterations: fit.iterations,
      codebook_version: codebook.version(),
    })
  }
}
