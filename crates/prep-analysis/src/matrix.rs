//! A dense row-major `f64` matrix and column standardisation.

use serde::Serialize;

use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Matrix {
  rows: usize,
  cols: usize,
  data: Vec<f64>,
}

impl Matrix {
  pub fn zeros(rows: usize, cols: usize) -> Self {
    Self { rows, cols, data: vec![0.0; rows * cols] }
  }

  /// Build from equally long rows.
  pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
    let cols = rows.first().map(Vec::len).unwrap_or_default();
    if rows.iter().any(|r| r.len() != cols) {
      return Err(Error::RaggedRows);
    }
    Ok(Self {
      rows: rows.len(),
      cols,
      data: rows.iter().flatten().copied().collect(),
    })
  }

  pub fn rows(&self) -> usize { self.rows }

  pub fn cols(&self) -> usize { self.cols }

  pub fn row(&self, i: usize) -> &[f64] {
    &self.data[i * self.cols..(i + 1) * self.cols]
  }

  pub fn row_mut(&mut self, i: usize) -> &mut [f64] {
    &mut self.data[i * self.cols..(i + 1) * self.cols]
  }

  pub fn get(&self, i: usize, j: usize) -> f64 { self.data[i * self.cols + j] }

  pub fn set(&mut self, i: usize, j: usize, v: f64) {
    self.data[i * self.cols + j] = v;
  }

  pub fn iter_rows(&self) -> impl Iterator<Item = &[f64]> {
    // `chunks_exact(0)` panics, and a zero-width matrix has no row data.
    self.data.chunks_exact(self.cols.max(1)).take(self.rows)
  }

  pub fn is_finite(&self) -> bool { self.data.iter().all(|v| v.is_finite()) }

  /// Per-column arithmetic mean.
  pub fn column_means(&self) -> Vec<f64> {
    let mut means = vec![0.0; self.cols];
    if self.rows == 0 {
      return means;
    }
    for row in self.iter_rows() {
      for (m, v) in means.iter_mut().zip(row) {
        *m += v;
      }
    }
    let n = self.rows as f64;
    means.iter_mut().for_each(|m| *m /= n);
    means
  }

  /// Per-column population variance (divisor `n`).
  pub fn column_variances(&self) -> Vec<f64> {
    let means = self.column_means();
    let mut vars = vec![0.0; self.cols];
    if self.rows == 0 {
      return vars;
    }
    for row in self.iter_rows() {
      for ((acc, v), m) in vars.iter_mut().zip(row).zip(&means) {
        *acc += (v - m).powi(2);
      }
    }
    let n = self.rows as f64;
    vars.iter_mut().for_each(|v| *v /= n);
    vars
  }
}

/// Squared Euclidean distance.
pub fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
  a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum()
}

/// Centring and scaling parameters fitted on one matrix.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Standardizer {
  pub means:  Vec<f64>,
  /// Population standard deviations; zero-variance columns keep scale 1.
  pub scales: Vec<f64>,
}

impl Standardizer {
  pub fn fit(m: &Matrix) -> Self {
    let means = m.column_means();
    let scales = m
      .column_variances()
      .into_iter()
      .map(|v| {
        let sd = v.sqrt();
        if sd > f64::EPSILON { sd } else { 1.0 }
      })
      .collect();
    Self { means, scales }
  }

  pub fn transform(&self, m: &Matrix) -> Matrix {
    let mut out = m.clone();
    for i in 0..out.rows() {
      for ((v, mean), scale) in
        out.row_mut(i).iter_mut().zip(&self.means).zip(&self.scales)
      {
        *v = (*v - mean) / scale;
      }
    }
    out
  }
}

/// Fit on `m` and return the standardised copy: zero mean and unit variance
/// per column, except zero-variance columns which end up all zero.
pub fn standardize(m: &Matrix) -> Matrix { Standardizer::fit(m).transform(m) }
