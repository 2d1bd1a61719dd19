//! Integration tests for `CsvStore` against files in a temporary directory.

use prep_core::{
  Field, NewResponse, Submission, schema, store::ResponseStore,
};
use tempfile::TempDir;

use crate::{CsvStore, Error};

async fn store() -> (TempDir, CsvStore) {
  let dir = tempfile::tempdir().expect("tempdir");
  let s = CsvStore::open(dir.path().join("respostas_prep.csv"))
    .await
    .expect("open store");
  (dir, s)
}

/// A valid response choosing option `n` (wrapping) for every field.
fn response(n: usize) -> NewResponse {
  let answers = Field::all()
    .filter(|f| !f.is_multi_choice())
    .map(|f| {
      let options = f.options();
      (f, options[n % options.len()].to_owned())
    })
    .collect();
  let methods = Field::PreventionMethods.options();
  Submission {
    answers,
    prevention_methods: vec![methods[n % methods.len()].to_owned()],
    consent: true,
  }
  .validate()
  .expect("valid submission")
}

// ─── Load ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn missing_file_loads_as_empty_table() {
  let (_dir, s) = store().await;
  let table = s.load().await.unwrap();
  assert!(table.is_empty());
  assert_eq!(s.count().await.unwrap(), 0);
  assert!(!s.path().exists(), "open must not create the file");
}

#[tokio::test]
async fn open_creates_parent_directories() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("nested/deeper/respostas.csv");
  let s = CsvStore::open(&path).await.unwrap();
  s.append(response(0)).await.unwrap();
  assert!(path.exists());
}

#[tokio::test]
async fn loading_twice_yields_identical_tables() {
  let (_dir, s) = store().await;
  for n in 0..4 {
    s.append(response(n)).await.unwrap();
  }
  let first = s.load().await.unwrap();
  let second = s.load().await.unwrap();
  assert_eq!(first, second);
  assert_eq!(first.len(), 4);
}

// ─── Append ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn append_adds_exactly_one_row_with_verbatim_values() {
  let (_dir, s) = store().await;
  s.append(response(0)).await.unwrap();
  let before = s.load().await.unwrap();

  let input = response(2);
  let stored = s.append(input.clone()).await.unwrap();

  let after = s.load().await.unwrap();
  assert_eq!(after.len(), before.len() + 1);

  let last = after.last().unwrap();
  assert_eq!(last, &stored);
  for field in Field::all() {
    assert_eq!(last.get(field), input.get(field), "{field}");
  }
  assert!(last.timestamp >= before.last().unwrap().timestamp);
}

#[tokio::test]
async fn timestamps_are_non_decreasing() {
  let (_dir, s) = store().await;
  for n in 0..10 {
    s.append(response(n)).await.unwrap();
  }
  let table = s.load().await.unwrap();
  let stamps: Vec<_> = table.iter().map(|r| r.timestamp).collect();
  assert!(stamps.windows(2).all(|w| w[0] <= w[1]), "{stamps:?}");
}

#[tokio::test]
async fn concurrent_appends_are_all_persisted() {
  let (_dir, s) = store().await;
  let mut handles = Vec::new();
  for n in 0..25 {
    let s = s.clone();
    handles.push(tokio::spawn(async move { s.append(response(n)).await }));
  }
  for h in handles {
    h.await.unwrap().unwrap();
  }
  assert_eq!(s.load().await.unwrap().len(), 25);
  assert_eq!(s.count().await.unwrap(), 25);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn loads_during_appends_see_whole_rows() {
  let (_dir, s) = store().await;
  let mut writers = Vec::new();
  for n in 0..40 {
    let s = s.clone();
    writers.push(tokio::spawn(async move { s.append(response(n)).await }));
  }
  let mut readers = Vec::new();
  for _ in 0..20 {
    let s = s.clone();
    readers.push(tokio::spawn(async move { s.load().await }));
  }

  for h in readers {
    let table = h.await.unwrap().unwrap();
    assert!(table.len() <= 40);
    assert!(table.iter().all(|r| !r.get(Field::Region).is_empty()));
  }
  for h in writers {
    h.await.unwrap().unwrap();
  }
  assert_eq!(s.load().await.unwrap().len(), 40);
}

#[tokio::test]
async fn reopening_recovers_rows() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("r.csv");
  {
    let s = CsvStore::open(&path).await.unwrap();
    s.append(response(1)).await.unwrap();
    s.append(response(2)).await.unwrap();
  }
  let s = CsvStore::open(&path).await.unwrap();
  assert_eq!(s.count().await.unwrap(), 2);
  s.append(response(3)).await.unwrap();
  assert_eq!(s.load().await.unwrap().len(), 3);
}

// ─── Export ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn export_is_byte_identical_to_the_file() {
  let (_dir, s) = store().await;
  for n in 0..3 {
    s.append(response(n)).await.unwrap();
  }
  let exported = s.export().await.unwrap();
  let on_disk = std::fs::read(s.path()).unwrap();
  assert_eq!(exported, on_disk);
}

#[tokio::test]
async fn export_round_trips_through_a_csv_reader() {
  let (_dir, s) = store().await;
  let inputs: Vec<_> = (0..5).map(response).collect();
  for r in &inputs {
    s.append(r.clone()).await.unwrap();
  }

  let bytes = s.export().await.unwrap();
  let mut reader = csv::Reader::from_reader(bytes.as_slice());
  let headers = reader.headers().unwrap().clone();
  assert_eq!(headers.iter().collect::<Vec<_>>(), schema::header());

  let rows: Vec<csv::StringRecord> =
    reader.records().map(|r| r.unwrap()).collect();
  assert_eq!(rows.len(), inputs.len());
  for (row, input) in rows.iter().zip(&inputs) {
    for field in Field::all() {
      assert_eq!(&row[field.index()], input.get(field));
    }
  }
}

#[tokio::test]
async fn export_before_first_append_is_header_only() {
  let (_dir, s) = store().await;
  let bytes = s.export().await.unwrap();
  let text = String::from_utf8(bytes).unwrap();
  assert_eq!(text, format!("{}\n", schema::header().join(",")));
}

#[tokio::test]
async fn values_with_commas_are_quoted() {
  let (_dir, s) = store().await;
  // Option 3 of the information source contains a comma.
  s.append(response(3)).await.unwrap();
  let text = String::from_utf8(s.export().await.unwrap()).unwrap();
  assert!(text.contains("\"Material informativo (folhetos, cartazes)\""));
  let table = s.load().await.unwrap();
  assert_eq!(
    table.rows()[0].get(Field::InformationSource),
    "Material informativo (folhetos, cartazes)"
  );
}

// ─── Corrupt files ───────────────────────────────────────────────────────────

#[tokio::test]
async fn foreign_header_is_rejected() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("other.csv");
  std::fs::write(&path, "name,email\nalice,a@example.com\n").unwrap();
  let err = CsvStore::open(&path).await.err().unwrap();
  assert!(matches!(err, Error::Header { .. }), "{err}");
}

#[tokio::test]
async fn bad_timestamp_reports_line() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("r.csv");
  let mut row = vec!["x"; schema::COLUMN_COUNT - 1];
  row.push("not a time");
  std::fs::write(
    &path,
    format!("{}\n{}\n", schema::header().join(","), row.join(",")),
  )
  .unwrap();
  let err = CsvStore::open(&path).await.err().unwrap();
  assert!(matches!(err, Error::Row { line: 2, .. }), "{err}");
}

#[tokio::test]
async fn legacy_values_outside_option_sets_are_kept() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("r.csv");
  let mut row = vec!["Valor antigo"; schema::COLUMN_COUNT - 1];
  row.push("2023-12-31 23:59:59");
  std::fs::write(
    &path,
    format!("{}\n{}\n", schema::header().join(","), row.join(",")),
  )
  .unwrap();
  let s = CsvStore::open(&path).await.unwrap();
  let table = s.load().await.unwrap();
  assert_eq!(table.rows()[0].get(Field::Region), "Valor antigo");
}
