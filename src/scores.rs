//! Correspondence-analysis scores.
//!
//! Given a non-negative matrix `A` (rows = entities to score):
//!
//! 1. `P = A / ΣA`
//! 2. row marginals `r = P·1`, column marginals `c = 1ᵗ·P`
//! 3. `Dr = diag(r^-½)`, `Dc = diag(c^-½)`
//! 4. standardized residuals `S = Dr·(P − r·cᵗ)·Dc`
//! 5. truncated SVD `S ≈ U·Σ·Vᵗ`
//! 6. per dimension `x = Dr·U[:, i]`, min-max rescaled to `[-1, 1]`
//!
//! Column scores are row scores of the transposed matrix; see
//! [`CorrespondenceAnalysis::column_scores`].

use log::{debug, info, trace, warn};
use serde::{Deserialize, Serialize};
use smartcore::linalg::basic::{
    arrays::{Array, Array2},
    matrix::DenseMatrix,
};

use crate::adjacency::AdjacencyMatrix;
use crate::errors::{IdeologyError, Result};
use crate::svd::{truncated_svd, SvdMethod};

/// Relative tolerance under which a singular value or a score range counts
/// as zero.
pub const DEGENERACY_TOL: f64 = 1e-12;

/// Entity id and score pairs, in a meaningful order (matrix order for row
/// scores, score-descending for aggregated sources).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreTable {
    pub entries: Vec<(String, f64)>,
}

impl ScoreTable {
    pub fn new(ids: &[String], scores: &[f64]) -> Self {
        Self {
            entries: ids.iter().cloned().zip(scores.iter().copied()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(k, _)| k == id)
            .map(|&(_, s)| s)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn scores(&self) -> impl Iterator<Item = f64> + '_ {
        self.entries.iter().map(|&(_, s)| s)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(k, s)| (k.as_str(), *s))
    }

    /// Stable sort, highest score first.
    pub fn sort_descending(&mut self) {
        self.entries.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
    }
}

/// Score engine configuration.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CorrespondenceAnalysis {
    pub dimensions: usize,
    pub svd: SvdMethod,
}

impl Default for CorrespondenceAnalysis {
    fn default() -> Self {
        Self {
            dimensions: 1,
            svd: SvdMethod::default(),
        }
    }
}

impl CorrespondenceAnalysis {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = dimensions;
        self
    }

    pub fn with_svd(mut self, svd: SvdMethod) -> Self {
        self.svd = svd;
        self
    }

    /// One score vector per dimension, one score per row of `matrix`.
    pub fn score(&self, matrix: &DenseMatrix<f64>) -> Result<Vec<Vec<f64>>> {
        if self.dimensions < 1 {
            return Err(IdeologyError::invalid("dimensions", "must be at least 1"));
        }
        let (n_rows, n_cols) = matrix.shape();
        info!(
            "Scoring {}x{} matrix over {} dimension(s)",
            n_rows, n_cols, self.dimensions
        );

        let residuals = standardized_residuals(matrix)?;
        let peak = residuals.max_abs();
        if peak <= DEGENERACY_TOL {
            return Err(IdeologyError::DegenerateMatrix(format!(
                "rows and columns are independent (max |residual| = {:e}), every score ties",
                peak
            )));
        }
        let svd = truncated_svd(&residuals.s, self.dimensions, self.svd)?;
        debug!("Singular values: {:?}", svd.singular_values);

        let top = svd.singular_values.first().copied().unwrap_or(0.0);
        (0..self.dimensions)
            .map(|dim| {
                let sigma = svd.singular_values[dim];
                if sigma <= DEGENERACY_TOL * top.max(1.0) {
                    return Err(IdeologyError::DegenerateMatrix(format!(
                        "no residual structure left in dimension {} (singular value {:e})",
                        dim, sigma
                    )));
                }
                let x: Vec<f64> = svd
                    .component(dim)
                    .iter()
                    .zip(residuals.row_scale.iter())
                    .map(|(u, dr)| u * dr)
                    .collect();
                trace!("dimension {} raw coordinates: {:?}", dim, x);
                rescale_unit_range(&x).map_err(|e| match e {
                    IdeologyError::DegenerateMatrix(msg) => IdeologyError::DegenerateMatrix(
                        format!("dimension {}: {}", dim, msg),
                    ),
                    other => other,
                })
            })
            .collect()
    }

    /// Row (target) scores as tables, one per dimension.
    pub fn row_scores(&self, adjacency: &AdjacencyMatrix) -> Result<Vec<ScoreTable>> {
        let scores = self.score(&adjacency.matrix)?;
        Ok(scores
            .iter()
            .map(|s| ScoreTable::new(&adjacency.targets, s))
            .collect())
    }

    /// Column (source) scores: the same computation on the transpose.
    pub fn column_scores(&self, adjacency: &AdjacencyMatrix) -> Result<Vec<ScoreTable>> {
        self.row_scores(&adjacency.transpose())
    }
}

/// Free-function form with the default SVD method.
pub fn score(matrix: &DenseMatrix<f64>, dimensions: usize) -> Result<Vec<Vec<f64>>> {
    CorrespondenceAnalysis::new()
        .with_dimensions(dimensions)
        .score(matrix)
}

/// Standardized residual matrix with the row scaling `r^-½` needed to map
/// singular vectors back to row coordinates.
#[derive(Clone, Debug)]
pub struct Residuals {
    pub s: DenseMatrix<f64>,
    pub row_scale: Vec<f64>,
}

impl Residuals {
    pub fn max_abs(&self) -> f64 {
        let (n_rows, n_cols) = self.s.shape();
        let mut peak = 0.0f64;
        for i in 0..n_rows {
            for j in 0..n_cols {
                peak = peak.max(self.s.get((i, j)).abs());
            }
        }
        peak
    }
}

pub fn standardized_residuals(matrix: &DenseMatrix<f64>) -> Result<Residuals> {
    let (n_rows, n_cols) = matrix.shape();
    if n_rows == 0 || n_cols == 0 {
        return Err(IdeologyError::DegenerateMatrix(
            "matrix has no rows or no columns".to_string(),
        ));
    }

    let mut total = 0.0;
    let mut r = vec![0.0; n_rows];
    let mut c = vec![0.0; n_cols];
    for i in 0..n_rows {
        for j in 0..n_cols {
            let v = *matrix.get((i, j));
            if !v.is_finite() || v < 0.0 {
                return Err(IdeologyError::DegenerateMatrix(format!(
                    "cell ({}, {}) is {}, expected a finite non-negative weight",
                    i, j, v
                )));
            }
            r[i] += v;
            c[j] += v;
            total += v;
        }
    }

    if let Some(i) = r.iter().position(|&x| x <= 0.0) {
        return Err(IdeologyError::DegenerateMatrix(format!("row {} sums to zero", i)));
    }
    if let Some(j) = c.iter().position(|&x| x <= 0.0) {
        return Err(IdeologyError::DegenerateMatrix(format!(
            "column {} sums to zero",
            j
        )));
    }

    r.iter_mut().for_each(|x| *x /= total);
    c.iter_mut().for_each(|x| *x /= total);
    let row_scale: Vec<f64> = r.iter().map(|x| x.powf(-0.5)).collect();
    let col_scale: Vec<f64> = c.iter().map(|x| x.powf(-0.5)).collect();

    let mut flat = Vec::with_capacity(n_rows * n_cols);
    for i in 0..n_rows {
        for j in 0..n_cols {
            let p = *matrix.get((i, j)) / total;
            flat.push(row_scale[i] * (p - r[i] * c[j]) * col_scale[j]);
        }
    }

    Ok(Residuals {
        s: DenseMatrix::from_iterator(flat.into_iter(), n_rows, n_cols, 0),
        row_scale,
    })
}

/// `-1 + 2 (x - min) / (max - min)`; fails when every value ties.
pub fn rescale_unit_range(x: &[f64]) -> Result<Vec<f64>> {
    let min = x.iter().copied().fold(f64::INFINITY, f64::min);
    let max = x.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;
    let magnitude = min.abs().max(max.abs()).max(1.0);
    if x.is_empty() || !range.is_finite() || range <= DEGENERACY_TOL * magnitude {
        warn!("Zero score range over {} values", x.len());
        return Err(IdeologyError::DegenerateMatrix(
            "all scores tie, rescaling to [-1, 1] is undefined".to_string(),
        ));
    }
    Ok(x.iter().map(|v| -1.0 + 2.0 * (v - min) / range).collect())
}
