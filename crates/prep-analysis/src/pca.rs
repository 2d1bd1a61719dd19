//! Principal component projection to two dimensions, for plotting only.
//!
//! The covariance matrix is diagonalised with the cyclic Jacobi method, which
//! is exact enough for the handful of survey features and needs no external
//! linear-algebra library.

use serde::Serialize;

use crate::{Error, Result, matrix::Matrix};

const MAX_SWEEPS: usize = 100;

/// A fitted two-component projection.
#[derive(Debug, Clone, Serialize)]
pub struct Projection {
  /// One `[pc1, pc2]` pair per input row.
  pub coordinates:        Vec<[f64; 2]>,
  /// Share of total variance captured by each component.
  pub explained_variance: [f64; 2],
  /// Unit-length component directions in feature space.
  pub components:         [Vec<f64>; 2],
}

/// Project `data` onto its two directions of maximal variance.
///
/// Component signs are fixed so the largest-magnitude loading is positive,
/// making the output deterministic. With a single feature the second axis is
/// all zeros.
pub fn project(data: &Matrix) -> Result<Projection> {
  let (n, d) = (data.rows(), data.cols());
  if n == 0 || d == 0 {
    return Err(Error::EmptyMatrix);
  }
  if !data.is_finite() {
    return Err(Error::NonFinite);
  }

  let means = data.column_means();
  let cov = covariance(data, &means);
  let (values, vectors) = jacobi_eigen(cov, d);

  let mut order: Vec<usize> = (0..d).collect();
  order.sort_by(|&a, &b| values[b].total_cmp(&values[a]).then(a.cmp(&b)));

  let total: f64 = values.iter().map(|v| v.max(0.0)).sum();
  let mut components = [vec![0.0; d], vec![0.0; d]];
  let mut explained_variance = [0.0; 2];
  for (slot, &idx) in order.iter().take(2).enumerate() {
    let mut v: Vec<f64> = (0..d).map(|r| vectors[r][idx]).collect();
    let pivot = v
      .iter()
      .copied()
      .fold(0.0_f64, |acc, x| if x.abs() > acc.abs() { x } else { acc });
    if pivot < 0.0 {
      v.iter_mut().for_each(|x| *x = -*x);
    }
    components[slot] = v;
    if total > 0.0 {
      explained_variance[slot] = values[idx].max(0.0) / total;
    }
  }

  let coordinates = data
    .iter_rows()
    .map(|row| {
      let mut out = [0.0; 2];
      for (slot, component) in components.iter().enumerate() {
        out[slot] = row
          .iter()
          .zip(&means)
          .zip(component)
          .map(|((x, m), w)| (x - m) * w)
          .sum();
      }
      out
    })
    .collect();

  Ok(Projection { coordinates, explained_variance, components })
}

/// Sample covariance (divisor `n - 1`, or `1` for a single row).
fn covariance(data: &Matrix, means: &[f64]) -> Vec<Vec<f64>> {
  let d = data.cols();
  let mut cov = vec![vec![0.0; d]; d];
  for row in data.iter_rows() {
    for i in 0..d {
      let di = row[i] - means[i];
      for j in i..d {
        cov[i][j] += di * (row[j] - means[j]);
      }
    }
  }
  let denom = data.rows().saturating_sub(1).max(1) as f64;
  for i in 0..d {
    for j in i..d {
      cov[i][j] /= denom;
      cov[j][i] = cov[i][j];
    }
  }
  cov
}

/// Eigen-decompose a symmetric matrix. Returns the eigenvalues and a matrix
/// whose column `i` is the eigenvector of eigenvalue `i`.
fn jacobi_eigen(mut a: Vec<Vec<f64>>, n: usize) -> (Vec<f64>, Vec<Vec<f64>>) {
  let mut v = vec![vec![0.0; n]; n];
  for (i, row) in v.iter_mut().enumerate() {
    row[i] = 1.0;
  }

  for _ in 0..MAX_SWEEPS {
    let off: f64 = (0..n)
      .flat_map(|p| (p + 1..n).map(move |q| (p, q)))
      .map(|(p, q)| a[p][q] * a[p][q])
      .sum();
    if off < 1e-22 {
      break;
    }

    for p in 0..n {
      for q in p + 1..n {
        if a[p][q].abs() < 1e-300 {
          continue;
        }
        let theta = (a[q][q] - a[p][p]) / (2.0 * a[p][q]);
        let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
        let c = 1.0 / (t * t + 1.0).sqrt();
        let s = t * c;

        for row in a.iter_mut() {
          let (kp, kq) = (row[p], row[q]);
          row[p] = c * kp - s * kq;
          row[q] = s * kp + c * kq;
        }
        for k in 0..n {
          let (pk, qk) = (a[p][k], a[q][k]);
          a[p][k] = c * pk - s * qk;
          a[q][k] = s * pk + c * qk;
        }
        for row in v.iter_mut() {
          let (kp, kq) = (row[p], row[q]);
          row[p] = c * kp - s * kq;
          row[q] = s * kp + c * kq;
        }
      }
    }
  }

  let values = (0..n).map(|i| a[i][i]).collect();
  (values, v)
}
