//! JSON persistence for the categorical codebook.
//!
//! The codebook is written to a sibling temp file and renamed into place so
//! a crash mid-write leaves the previous version intact.

use std::{io, path::Path};

use prep_analysis::Codebook;

use crate::Error;

/// Read the codebook at `path`, or the seeded one if the file is missing.
pub fn load(path: &Path) -> Result<Codebook, Error> {
  match std::fs::read(path) {
    Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
    Err(e) if e.kind() == io::ErrorKind::NotFound => {
      tracing::info!(path = %path.display(), "no saved codebook, starting fresh");
      Ok(Codebook::seeded())
    }
    Err(e) => Err(e.into()),
  }
}

pub fn save(path: &Path, codebook: &Codebook) -> Result<(), Error> {
  if let Some(parent) = path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)?;
  }
  let mut tmp = path.as_os_str().to_owned();
  tmp.push(".tmp");
  std::fs::write(&tmp, serde_json::to_vec_pretty(codebook)?)?;
  std::fs::rename(&tmp, path)?;
  tracing::debug!(
    path = %path.display(),
    extensions = codebook.extensions(),
    "saved codebook"
  );
  Ok(())
}
