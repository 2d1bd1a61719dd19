//! Seeded k-means (Lloyd's algorithm with k-means++ initialisation).
//!
//! All randomness comes from one [`StdRng`] seeded with [`KMeans::seed`], so
//! the same matrix always yields the same partition. Several initialisations
//! are tried and the one with the lowest inertia wins.

use rand::{Rng as _, SeedableRng as _, rngs::StdRng};
use serde::Serialize;

use crate::{
  Error, Result,
  matrix::{Matrix, squared_distance},
};

pub const DEFAULT_SEED: u64 = 42;

#[derive(Debug, Clone, Copy)]
pub struct KMeans {
  pub k:        usize,
  pub seed:     u64,
  /// Independent initialisations; the best is kept.
  pub n_init:   usize,
  pub max_iter: usize,
  /// Convergence threshold, relative to the mean feature variance.
  pub tol:      f64,
}

impl KMeans {
  pub fn new(k: usize) -> Self {
    Self { k, seed: DEFAULT_SEED, n_init: 10, max_iter: 300, tol: 1e-4 }
  }

  pub fn with_seed(mut self, seed: u64) -> Self {
    self.seed = seed;
    self
  }
}

/// Result of [`KMeans::fit`].
#[derive(Debug, Clone, Serialize)]
pub struct KMeansFit {
  /// Group of each input row, in `0..k`.
  pub labels:     Vec<usize>,
  pub centroids:  Matrix,
  /// Sum of squared distances from each row to its centroid.
  pub inertia:    f64,
  pub iterations: usize,
}

impl KMeans {
  pub fn fit(&self, data: &Matrix) -> Result<KMeansFit> {
    let n = data.rows();
    if n == 0 || data.cols() == 0 {
      return Err(Error::EmptyMatrix);
    }
    if self.k == 0 || self.k > n {
      return Err(Error::InvalidClusterCount { k: self.k, rows: n });
    }
    if !data.is_finite() {
      return Err(Error::NonFinite);
    }

    let variances = data.column_variances();
    let tol = self.tol * variances.iter().sum::<f64>() / variances.len() as f64;

    let mut rng = StdRng::seed_from_u64(self.seed);
    let mut best: Option<KMeansFit> = None;
    for _ in 0..self.n_init.max(1) {
      let init = plus_plus(data, self.k, &mut rng);
      let fit = self.lloyd(data, init, tol);
      if best.as_ref().is_none_or(|b| fit.inertia < b.inertia) {
        best = Some(fit);
      }
    }
    best.ok_or(Error::EmptyMatrix)
  }

  fn lloyd(&self, data: &Matrix, mut centroids: Matrix, tol: f64) -> KMeansFit {
    let mut labels = vec![0; data.rows()];
    let mut iterations = 0;

    while iterations < self.max_iter {
      iterations += 1;
      assign(data, &centroids, &mut labels);
      let next = update(data, &centroids, &labels, self.k);
      let shift: f64 = (0..self.k)
        .map(|c| squared_distance(centroids.row(c), next.row(c)))
        .sum();
      centroids = next;
      if shift <= tol {
        break;
      }
    }

    let inertia = assign(data, &centroids, &mut labels);
    KMeansFit { labels, centroids, inertia, iterations }
  }
}

/// Index of the nearest centroid and the squared distance to it.
/// Ties go to the lower index.
fn nearest(point: &[f64], centroids: &Matrix) -> (usize, f64) {
  centroids
    .iter_rows()
    .enumerate()
    .map(|(c, centroid)| (c, squared_distance(point, centroid)))
    .fold((0, f64::INFINITY), |best, cur| if cur.1 < best.1 { cur } else { best })
}

/// Label every row with its nearest centroid; returns the inertia.
fn assign(data: &Matrix, centroids: &Matrix, labels: &mut [usize]) -> f64 {
  let mut inertia = 0.0;
  for (i, point) in data.iter_rows().enumerate() {
    let (c, d) = nearest(point, centroids);
    labels[i] = c;
    inertia += d;
  }
  inertia
}

/// New centroids as the mean of their members. An empty group is moved onto
/// the row farthest from its current centroid.
fn update(data: &Matrix, old: &Matrix, labels: &[usize], k: usize) -> Matrix {
  let mut sums = Matrix::zeros(k, data.cols());
  let mut counts = vec![0usize; k];
  for (point, &c) in data.iter_rows().zip(labels) {
    counts[c] += 1;
    for (s, v) in sums.row_mut(c).iter_mut().zip(point) {
      *s += v;
    }
  }

  let mut taken = Vec::new();
  for c in 0..k {
    if counts[c] > 0 {
      let n = counts[c] as f64;
      sums.row_mut(c).iter_mut().for_each(|s| *s /= n);
      continue;
    }
    let far = data
      .iter_rows()
      .enumerate()
      .filter(|(i, _)| !taken.contains(i))
      .map(|(i, p)| (i, squared_distance(p, old.row(labels[i]))))
      .fold(None, |best: Option<(usize, f64)>, cur| match best {
        Some(b) if b.1 >= cur.1 => Some(b),
        _ => Some(cur),
      });
    if let Some((i, _)) = far {
      taken.push(i);
      sums.row_mut(c).copy_from_slice(data.row(i));
    }
  }
  sums
}

/// k-means++: the first centre is a uniformly random row, each further one
/// is drawn with probability proportional to its squared distance from the
/// nearest centre chosen so far.
fn plus_plus(data: &Matrix, k: usize, rng: &mut StdRng) -> Matrix {
  let n = data.rows();
  let mut centroids = Matrix::zeros(k, data.cols());
  let first = rng.gen_range(0..n);
  centroids.row_mut(0).copy_from_slice(data.row(first));

  let mut dist: Vec<f64> = data
    .iter_rows()
    .map(|p| squared_distance(p, centroids.row(0)))
    .collect();

  for c in 1..k {
    let total: f64 = dist.iter().sum();
    let pick = if total > 0.0 {
      let target = rng.gen_range(0.0..total);
      let mut acc = 0.0;
      dist
        .iter()
        .position(|d| {
          acc += d;
          acc > target
        })
        .unwrap_or(n - 1)
    } else {
      rng.gen_range(0..n)
    };
    centroids.row_mut(c).copy_from_slice(data.row(pick));
    for (d, p) in dist.iter_mut().zip(data.iter_rows()) {
      *d = d.min(squared_distance(p, centroids.row(c)));
    }
  }
  centroids
}
