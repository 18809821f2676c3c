//! Dense bipartite adjacency matrix and the side products of filtering.
//!
//! Rows are targets, columns are sources. Identifier order is fixed at build
//! time (first appearance in the filtered interaction set) and travels with
//! the matrix, so row `i` of any score vector belongs to `targets[i]`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use smartcore::linalg::basic::arrays::{Array, Array2};
use smartcore::linalg::basic::matrix::DenseMatrix;

use crate::errors::{IdeologyError, Result};

/// Weighted targets x sources matrix with its row/column identifiers.
#[derive(Debug, Clone)]
pub struct AdjacencyMatrix {
    pub matrix: DenseMatrix<f64>,
    pub targets: Vec<String>,
    pub sources: Vec<String>,
}

impl AdjacencyMatrix {
    /// Assemble from (row, col, weight) triplets. Duplicate cells are summed.
    pub fn from_triplets(
        targets: Vec<String>,
        sources: Vec<String>,
        triplets: &[(usize, usize, f64)],
    ) -> Self {
        let (n_rows, n_cols) = (targets.len(), sources.len());
        let mut flat = vec![0.0; n_rows * n_cols];
        for &(r, c, w) in triplets {
            flat[r * n_cols + c] += w;
        }

        Self {
            matrix: DenseMatrix::from_iterator(flat.into_iter(), n_rows, n_cols, 0),
            targets,
            sources,
        }
    }

    /// Wrap an existing dense matrix, checking that identifiers match its shape.
    pub fn from_dense(
        matrix: DenseMatrix<f64>,
        targets: Vec<String>,
        sources: Vec<String>,
    ) -> Result<Self> {
        let (n_rows, n_cols) = matrix.shape();
        if n_rows != targets.len() || n_cols != sources.len() {
            return Err(IdeologyError::invalid(
                "matrix",
                format!(
                    "shape {}x{} does not match {} target ids and {} source ids",
                    n_rows,
                    n_cols,
                    targets.len(),
                    sources.len()
                ),
            ));
        }
        Ok(Self {
            matrix,
            targets,
            sources,
        })
    }

    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        self.matrix.shape()
    }

    /// Weight between a target and a source, `None` for unknown ids.
    pub fn get(&self, target: &str, source: &str) -> Option<f64> {
        let r = self.targets.iter().position(|t| t == target)?;
        let c = self.sources.iter().position(|s| s == source)?;
        Some(*self.matrix.get((r, c)))
    }

    /// Copy of a target's row, keyed by the target id.
    pub fn row(&self, target: &str) -> Option<Vec<f64>> {
        let r = self.targets.iter().position(|t| t == target)?;
        let n_cols = self.shape().1;
        Some((0..n_cols).map(|c| *self.matrix.get((r, c))).collect())
    }

    pub fn row_sums(&self) -> Vec<f64> {
        let (n_rows, n_cols) = self.shape();
        (0..n_rows)
            .map(|r| (0..n_cols).map(|c| *self.matrix.get((r, c))).sum())
            .collect()
    }

    pub fn col_sums(&self) -> Vec<f64> {
        let (n_rows, n_cols) = self.shape();
        (0..n_cols)
            .map(|c| (0..n_rows).map(|r| *self.matrix.get((r, c))).sum())
            .collect()
    }

    pub fn total(&self) -> f64 {
        self.row_sums().iter().sum()
    }

    /// Sources become rows. Used to score columns with the row routine.
    pub fn transpose(&self) -> Self {
        Self {
            matrix: self.matrix.transpose(),
            targets: self.sources.clone(),
            sources: self.targets.clone(),
        }
    }
}

/// One retained (target, source) pair with its aggregated weight.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FilteredInteraction {
    pub target: String,
    pub source: String,
    pub weight: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TargetSummary {
    /// Distinct sources, in first-seen order.
    pub sources: Vec<String>,
    pub distinct_sources: usize,
    pub total_interactions: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SourceSummary {
    /// Distinct targets, in first-seen order.
    pub targets: Vec<String>,
    pub distinct_targets: usize,
}

/// Everything the matrix builder can hand back.
#[derive(Debug, Clone)]
pub struct Adjacency {
    pub matrix: AdjacencyMatrix,
    pub filtered: Option<Vec<FilteredInteraction>>,
    pub target_summary: Option<Vec<(String, TargetSummary)>>,
    pub source_summary: Option<Vec<(String, SourceSummary)>>,
}

impl Adjacency {
    pub fn target_summary_map(&self) -> Option<HashMap<&str, &TargetSummary>> {
        self.target_summary
            .as_ref()
            .map(|v| v.iter().map(|(k, s)| (k.as_str(), s)).collect())
    }

    pub fn source_summary_map(&self) -> Option<HashMap<&str, &SourceSummary>> {
        self.source_summary
            .as_ref()
            .map(|v| v.iter().map(|(k, s)| (k.as_str(), s)).collect())
    }
}
