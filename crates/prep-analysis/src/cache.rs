//! Memoised pipeline runs.
//!
//! The table only ever grows, so its row count identifies its contents. The
//! pipeline is re-run only when the count differs from the last successful
//! run; the codebook carries over between runs so codes stay stable.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use prep_core::ResponseTable;

use crate::{
  Result,
  encode::Codebook,
  pipeline::{Grouping, GroupingPipeline},
};

struct Inner {
  codebook: Codebook,
  last:     Option<Arc<Grouping>>,
  /// Set when a run added codes not yet handed out by `take_changed`.
  changed:  bool,
}

pub struct GroupingCache {
  pipeline: GroupingPipeline,
  inner:    Mutex<Inner>,
}

impl Default for GroupingCache {
  fn default() -> Self { Self::new(GroupingPipeline::default(), Codebook::seeded()) }
}

impl GroupingCache {
  /// Start from `codebook`, e.g. one restored from disk. A codebook built by
  /// an older seeding scheme is replaced with a fresh one.
  pub fn new(pipeline: GroupingPipeline, codebook: Codebook) -> Self {
    let codebook = if codebook.is_current() {
      codebook
    } else {
      tracing::warn!(
        version = codebook.version(),
        "discarding stale codebook"
      );
      Codebook::seeded()
    };
    Self {
      pipeline,
      inner: Mutex::new(Inner { codebook, last: None, changed: false }),
    }
  }

  fn lock(&self) -> MutexGuard<'_, Inner> {
    self.inner.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// The grouping for `table`, reusing the previous result when the table
  /// has not changed since.
  pub fn get_or_run(&self, table: &ResponseTable) -> Result<Arc<Grouping>> {
    let mut inner = self.lock();
    if let Some(last) = &inner.last
      && last.rows == table.len()
    {
      return Ok(Arc::clone(last));
    }

    let before = inner.codebook.extensions();
    let grouping = Arc::new(self.pipeline.run(table, &mut inner.codebook)?);
    if inner.codebook.extensions() > before {
      inner.changed = true;
    }
    inner.last = Some(Arc::clone(&grouping));
    Ok(grouping)
  }

  /// The last grouping if it was computed over exactly `rows` responses.
  /// Lets callers skip loading the table when its row count is unchanged.
  pub fn cached(&self, rows: usize) -> Option<Arc<Grouping>> {
    self.lock().last.as_ref().filter(|g| g.rows == rows).cloned()
  }

  /// A copy of the codebook if runs have extended it since the last call.
  pub fn take_changed(&self) -> Option<Codebook> {
    let mut inner = self.lock();
    if !inner.changed {
      return None;
    }
    inner.changed = false;
    Some(inner.codebook.clone())
  }

  /// A copy of the current codebook, including any extensions.
  pub fn codebook(&self) -> Codebook { self.lock().codebook.clone() }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    Error,
    fixtures::{legacy_row, table_of},
  };

  #[test]
  fn unchanged_table_reuses_result() {
    let cache = GroupingCache::default();
    let table = table_of(&[0, 1, 2, 3]);
    let a = cache.get_or_run(&table).unwrap();
    let b = cache.get_or_run(&table).unwrap();
    assert!(Arc::ptr_eq(&a, &b));
  }

  #[test]
  fn grown_table_reruns() {
    let cache = GroupingCache::default();
    let a = cache.get_or_run(&table_of(&[0, 1, 2])).unwrap();
    let b = cache.get_or_run(&table_of(&[0, 1, 2, 3])).unwrap();
    assert!(!Arc::ptr_eq(&a, &b));
    assert_eq!(b.rows, 4);
    assert_eq!(b.k, 3);
  }

  #[test]
  fn errors_are_not_cached() {
    let cache = GroupingCache::default();
    let err = cache.get_or_run(&table_of(&[0])).unwrap_err();
    assert!(matches!(err, Error::NotEnoughData { .. }));
    assert!(cache.get_or_run(&table_of(&[0, 1, 2])).is_ok());
  }

  #[test]
  fn cached_matches_row_count_only() {
    let cache = GroupingCache::default();
    assert!(cache.cached(3).is_none());
    let g = cache.get_or_run(&table_of(&[0, 1, 2])).unwrap();
    assert!(Arc::ptr_eq(&cache.cached(3).unwrap(), &g));
    assert!(cache.cached(4).is_none());
  }

  #[test]
  fn codebook_growth_is_reported_once() {
    let cache = GroupingCache::default();
    cache.get_or_run(&table_of(&[0, 1, 2])).unwrap();
    assert!(cache.take_changed().is_none());

    let mut table = table_of(&[0, 1, 2]);
    table.push(legacy_row("Valor antigo"));
    cache.get_or_run(&table).unwrap();
    let book = cache.take_changed().unwrap();
    assert!(book.extensions() > 0);
    assert!(cache.take_changed().is_none());
  }
}
