//! # ideospace
//!
//! Latent ideology (polarization) scores for the two sides of a bipartite
//! interaction log, e.g. accounts (targets) sharing links from media outlets
//! (sources), via correspondence analysis.
//!
//! Pipeline:
//!
//! - [`records`]: validate loosely-typed rows into [`records::Interaction`]s.
//! - [`builder`]: drop list, `k`/`n`/`m` thresholds and weight aggregation into a
//!   dense [`adjacency::AdjacencyMatrix`].
//! - [`scores`]: standardized residuals, truncated SVD ([`svd`]) and min-max
//!   rescaling into `[-1, 1]` per dimension.
//! - [`aggregate`]: source scores as the (weighted) mean of their targets.
//! - [`pipeline`]: the end-to-end entry points.
//!
//! ```
//! use ideospace::pipeline::{run_full_pipeline, PipelineParams};
//! use ideospace::records::Interaction;
//! use ideospace::svd::SvdMethod;
//!
//! let log = [
//!     ("a", "left1"), ("a", "left2"), ("b", "left1"), ("b", "left2"), ("b", "right1"),
//!     ("c", "right1"), ("c", "right2"), ("d", "right1"), ("d", "right2"), ("d", "left2"),
//! ];
//! let records: Vec<Interaction> = log.iter().map(|(t, s)| Interaction::new(*t, *s)).collect();
//!
//! let params = PipelineParams { svd: SvdMethod::Exact, ..Default::default() };
//! let out = run_full_pipeline(&records, &params).unwrap();
//!
//! assert_eq!(out.targets.len(), 4);
//! assert!(out.targets.scores().all(|s| (-1.0..=1.0).contains(&s)));
//! ```
//!
//! The core only logs through the `log` facade; install a logger
//! (`env_logger`, `tracing-log`, ...) to see stage boundaries and sizes.

pub mod adjacency;
pub mod aggregate;
pub mod builder;
pub mod errors;
pub mod pipeline;
pub mod records;
pub mod scores;
pub mod svd;

pub use adjacency::{Adjacency, AdjacencyMatrix, FilteredInteraction};
pub use builder::{build_adjacency, AdjacencyBuilder};
pub use errors::{IdeologyError, Result};
pub use pipeline::{run_full_pipeline, run_simplified, PipelineOutput, PipelineParams};
pub use records::{ColumnSelector, Interaction};
pub use scores::{score, CorrespondenceAnalysis, ScoreTable};
pub use svd::SvdMethod;

#[cfg(test)]
mod tests;
