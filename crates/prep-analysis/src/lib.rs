//! Descriptive statistics and respondent grouping for the survey.
//!
//! Everything here is pure computation over a [`prep_core::ResponseTable`];
//! no I/O and no async. The grouping pipeline encodes answers through a
//! stable [`Codebook`], standardises the feature matrix, partitions rows with
//! seeded k-means and projects them onto two principal components for
//! plotting.

pub mod cache;
pub mod encode;
pub mod error;
pub mod kmeans;
pub mod matrix;
pub mod pca;
pub mod pipeline;
pub mod profile;
pub mod stats;

pub use cache::GroupingCache;
pub use encode::Codebook;
pub use error::{Error, Result};
pub use pipeline::{Grouping, GroupingPipeline};

#[cfg(test)]
pub(crate) mod fixtures;
