//! Stable categorical codes for the feature matrix.
//!
//! Codes are seeded from each field's fixed option set (code = option
//! position) and extended with unseen values in first-appearance order.
//! Existing codes are never renumbered, so a given answer keeps its code
//! across runs regardless of which values happen to be present or in what
//! order rows arrived.

use std::collections::BTreeMap;

use prep_core::{Field, ResponseTable};
use serde::{Deserialize, Serialize};

use crate::matrix::Matrix;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Codebook {
  version: u32,
  /// Per field, the value at position `i` has code `i`.
  codes:   BTreeMap<Field, Vec<String>>,
}

impl Default for Codebook {
  fn default() -> Self { Self::seeded() }
}

impl Codebook {
  /// Identifies the seeding scheme. Bump when option sets are reordered.
  pub const VERSION: u32 = 1;

  /// Fields that contribute a feature column: everything except the
  /// multi-choice field. The timestamp is never a feature.
  pub fn feature_fields() -> impl Iterator<Item = Field> {
    Field::all().filter(|f| !f.is_multi_choice())
  }

  /// A codebook holding exactly the fixed option sets.
  pub fn seeded() -> Self {
    let codes = Self::feature_fields()
      .map(|f| (f, f.options().iter().map(|o| (*o).to_owned()).collect()))
      .collect();
    Self { version: Self::VERSION, codes }
  }

  pub fn version(&self) -> u32 { self.version }

  /// Whether this codebook was built by the current seeding scheme. A stale
  /// one should be discarded in favour of [`Codebook::seeded`].
  pub fn is_current(&self) -> bool {
    self.version == Self::VERSION
      && Self::feature_fields().all(|f| {
        self.codes.get(&f).is_some_and(|known| {
          known.len() >= f.options().len()
            && known.iter().zip(f.options()).all(|(a, b)| a == b)
        })
      })
  }

  pub fn lookup(&self, field: Field, value: &str) -> Option<usize> {
    self.codes.get(&field)?.iter().position(|v| v == value)
  }

  pub fn decode(&self, field: Field, code: usize) -> Option<&str> {
    self.codes.get(&field)?.get(code).map(String::as_str)
  }

  /// The code for `value`, assigning the next free code when unseen.
  pub fn code(&mut self, field: Field, value: &str) -> usize {
    let known = self.codes.entry(field).or_default();
    match known.iter().position(|v| v == value) {
      Some(i) => i,
      None => {
        tracing::debug!(%field, value, code = known.len(), "extending codebook");
        known.push(value.to_owned());
        known.len() - 1
      }
    }
  }

  /// Number of codes handed out beyond the seeded option sets.
  pub fn extensions(&self) -> usize {
    Self::feature_fields()
      .map(|f| {
        let known = self.codes.get(&f).map(Vec::len).unwrap_or_default();
        known.saturating_sub(f.options().len())
      })
      .sum()
  }

  /// Encode every row into one numeric feature row, extending the codebook
  /// with any unseen values.
  pub fn encode(&mut self, table: &ResponseTable) -> Matrix {
    let fields: Vec<Field> = Self::feature_fields().collect();
    let mut m = Matrix::zeros(table.len(), fields.len());
    for (i, response) in table.iter().enumerate() {
      for (j, field) in fields.iter().enumerate() {
        let code = self.code(*field, response.get(*field));
        m.set(i, j, code as f64);
      }
    }
    m
  }
}
