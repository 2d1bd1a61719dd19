//! [`CsvStore`]: the CSV file implementation of [`ResponseStore`].

use std::{
  io,
  path::{Path, PathBuf},
  sync::Arc,
};

use chrono::{Local, NaiveDateTime};
use prep_core::{NewResponse, Response, ResponseTable, store::ResponseStore};
use tokio::sync::Mutex;

use crate::{
  Result,
  codec::{append_record, empty_document, next_timestamp, read_table},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// What the single writer knows about the file's tail.
#[derive(Debug, Default)]
struct Tail {
  rows: usize,
  last: Option<NaiveDateTime>,
}

struct Inner {
  path: PathBuf,
  tail: Mutex<Tail>,
}

/// A survey response store backed by one append-only CSV file.
///
/// All appends from clones of the same store are serialised through one
/// writer lock, so concurrent submissions are never lost. Loads and exports
/// take the same lock. Appends touch only the end of the file. Cloning is
/// cheap.
#[derive(Clone)]
pub struct CsvStore {
  inner: Arc<Inner>,
}

impl CsvStore {
  /// Open a store at `path`, creating missing parent directories.
  ///
  /// An existing file is parsed once to validate its header and recover the
  /// row count and last timestamp. The file itself is only created by the
  /// first append.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref().to_path_buf();

    let scan = path.clone();
    let table = tokio::task::spawn_blocking(move || -> Result<ResponseTable> {
      if let Some(parent) = scan.parent()
        && !parent.as_os_str().is_empty()
      {
        std::fs::create_dir_all(parent)?;
      }
      read_table(&scan)
    })
    .await??;

    let tail = Tail {
      rows: table.len(),
      last: table.last().map(|r| r.timestamp),
    };
    tracing::info!(path = %path.display(), rows = tail.rows, "opened response store");

    Ok(Self {
      inner: Arc::new(Inner { path, tail: Mutex::new(tail) }),
    })
  }

  pub fn path(&self) -> &Path { &self.inner.path }
}

// ─── ResponseStore impl ──────────────────────────────────────────────────────

impl ResponseStore for CsvStore {
  type Error = crate::Error;

  async fn append(&self, response: NewResponse) -> Result<Response> {
    let mut tail = self.inner.tail.lock().await;

    let timestamp = next_timestamp(tail.last, Local::now().naive_local());
    let response = response.stamp(timestamp);
    let record = response.to_record();

    let path = self.inner.path.clone();
    tokio::task::spawn_blocking(move || append_record(&path, &record)).await??;

    tail.rows += 1;
    tail.last = Some(timestamp);
    tracing::debug!(rows = tail.rows, %timestamp, "appended response");

    Ok(response)
  }

  async fn load(&self) -> Result<ResponseTable> {
    // Reads share the writer lock so they never observe a half-written row.
    let _tail = self.inner.tail.lock().await;
    let path = self.inner.path.clone();
    tokio::task::spawn_blocking(move || read_table(&path)).await?
  }

  async fn export(&self) -> Result<Vec<u8>> {
    let _tail = self.inner.tail.lock().await;
    let path = self.inner.path.clone();
    tokio::task::spawn_blocking(move || match std::fs::read(&path) {
      Ok(bytes) if !bytes.is_empty() => Ok(bytes),
      Ok(_) => empty_document(),
      Err(e) if e.kind() == io::ErrorKind::NotFound => empty_document(),
      Err(e) => Err(e.into()),
    })
    .await?
  }

  async fn count(&self) -> Result<usize> { Ok(self.inner.tail.lock().await.rows) }
}
