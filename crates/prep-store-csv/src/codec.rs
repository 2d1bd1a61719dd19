//! Reading and writing the persisted CSV document.
//!
//! The document is a header line naming every field column plus
//! `timestamp`, followed by one record per response in arrival order. Lines
//! end in `\n`; fields are quoted only when they contain a delimiter, quote
//! or newline.

use std::{
  fs::{File, OpenOptions},
  io::{self, Write as _},
  path::Path,
};

use chrono::{NaiveDateTime, Timelike as _};
use prep_core::{Response, ResponseTable, schema};

use crate::{Error, Result};

fn writer_builder() -> csv::WriterBuilder {
  let mut builder = csv::WriterBuilder::new();
  builder
    .has_headers(false)
    .terminator(csv::Terminator::Any(b'\n'));
  builder
}

/// The bytes of a document with a header and no rows.
pub fn empty_document() -> Result<Vec<u8>> {
  let mut writer = writer_builder().from_writer(Vec::new());
  writer.write_record(schema::header())?;
  writer
    .into_inner()
    .map_err(|e| Error::Io(e.into_error()))
}

/// Parse the document at `path`. A missing file is an empty table.
pub fn read_table(path: &Path) -> Result<ResponseTable> {
  let file = match File::open(path) {
    Ok(f) => f,
    Err(e) if e.kind() == io::ErrorKind::NotFound => {
      return Ok(ResponseTable::default());
    }
    Err(e) => return Err(e.into()),
  };
  if file.metadata()?.len() == 0 {
    return Ok(ResponseTable::default());
  }

  let mut reader = csv::ReaderBuilder::new()
    .has_headers(true)
    .flexible(false)
    .from_reader(file);

  let found: Vec<String> = reader.headers()?.iter().map(str::to_owned).collect();
  let expected: Vec<String> =
    schema::header().into_iter().map(str::to_owned).collect();
  if found != expected {
    return Err(Error::Header { expected, found });
  }

  let mut rows = Vec::new();
  for record in reader.records() {
    let record = record?;
    let line = record.position().map(|p| p.line()).unwrap_or_default();
    let response =
      Response::from_record(&record).map_err(|source| Error::Row { line, source })?;
    rows.push(response);
  }
  Ok(ResponseTable::new(rows))
}

/// Append one record, writing the header first when the file is new or
/// empty. The data is synced to disk before returning.
pub fn append_record(path: &Path, record: &[String]) -> Result<()> {
  let file = OpenOptions::new().create(true).append(true).open(path)?;
  let needs_header = file.metadata()?.len() == 0;

  let mut writer = writer_builder().from_writer(file);
  if needs_header {
    writer.write_record(schema::header())?;
  }
  writer.write_record(record)?;
  let mut file = writer
    .into_inner()
    .map_err(|e| Error::Io(e.into_error()))?;
  file.flush()?;
  file.sync_data()?;
  Ok(())
}

/// The timestamp for the next row: `now` at second precision, never earlier
/// than the last persisted row.
pub fn next_timestamp(
  last: Option<NaiveDateTime>,
  now: NaiveDateTime,
) -> NaiveDateTime {
  let now = now.with_nanosecond(0).unwrap_or(now);
  match last {
    Some(last) if last > now => last,
    _ => now,
  }
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;

  use super::*;

  fn at(h: u32, m: u32, s: u32, milli: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 2)
      .unwrap()
      .and_hms_milli_opt(h, m, s, milli)
      .unwrap()
  }

  #[test]
  fn next_timestamp_truncates_to_seconds() {
    assert_eq!(next_timestamp(None, at(10, 0, 5, 750)), at(10, 0, 5, 0));
  }

  #[test]
  fn next_timestamp_never_goes_backwards() {
    let last = at(10, 0, 5, 0);
    assert_eq!(next_timestamp(Some(last), at(9, 59, 0, 0)), last);
    assert_eq!(next_timestamp(Some(last), at(10, 0, 6, 0)), at(10, 0, 6, 0));
  }

  #[test]
  fn identical_second_is_allowed() {
    let last = at(10, 0, 5, 0);
    assert_eq!(next_timestamp(Some(last), at(10, 0, 5, 900)), last);
  }

  #[test]
  fn empty_document_is_header_line() {
    let doc = String::from_utf8(empty_document().unwrap()).unwrap();
    assert!(doc.starts_with("Conhecimento_PrEP,Conhecimento_PEP,"));
    assert!(doc.ends_with(",Regiao,timestamp\n"));
    assert_eq!(doc.lines().count(), 1);
  }
}
