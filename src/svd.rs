//! # Truncated SVD
//!
//! Two interchangeable routes to the leading left singular vectors of a dense
//! matrix:
//!
//! - [`SvdMethod::Exact`]: full Golub-Kahan SVD from smartcore,
//!   then keep the top `k` components. Deterministic; cost grows with
//!   `min(m, n)^2 * max(m, n)`.
//! - [`SvdMethod::Randomized`]: Halko-Martinsson-Tropp range finder. A seeded
//!   Gaussian sketch `A·Ω` is refined with `n_iter` power iterations
//!   (re-orthonormalised after every product), the matrix is projected onto the
//!   captured range `B = Qᵗ·A`, and the small `B` is decomposed exactly. With a
//!   fixed seed the output is reproducible; with `seed: None` a fresh seed is
//!   drawn per call.
//!
//! Singular vector signs are arbitrary in both routes. Callers that need a
//! stable orientation must normalise downstream (the score engine min-max
//! rescales, which is what makes the sign irrelevant there).

use log::{debug, trace};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, StandardNormal};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use smartcore::linalg::basic::{
    arrays::{Array, Array2},
    matrix::DenseMatrix,
};
use smartcore::linalg::traits::qr::QRDecomposable;
use smartcore::linalg::traits::svd::SVDDecomposable;

use crate::errors::{IdeologyError, Result};

pub const DEFAULT_POWER_ITERATIONS: usize = 5;
pub const DEFAULT_OVERSAMPLES: usize = 10;
pub const DEFAULT_SEED: u64 = 42;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub enum SvdMethod {
    Exact,
    Randomized {
        n_iter: usize,
        oversamples: usize,
        seed: Option<u64>,
    },
}

impl Default for SvdMethod {
    fn default() -> Self {
        SvdMethod::Randomized {
            n_iter: DEFAULT_POWER_ITERATIONS,
            oversamples: DEFAULT_OVERSAMPLES,
            seed: Some(DEFAULT_SEED),
        }
    }
}

/// Leading `k` left singular vectors (as the columns of `u`) and the matching
/// singular values, sorted descending.
#[derive(Clone, Debug)]
pub struct TruncatedSvd {
    pub u: DenseMatrix<f64>,
    pub singular_values: Vec<f64>,
}

impl TruncatedSvd {
    /// Column `i` of `u` as an owned vector.
    pub fn component(&self, i: usize) -> Vec<f64> {
        let m = self.u.shape().0;
        (0..m).map(|r| *self.u.get((r, i))).collect()
    }
}

pub fn truncated_svd(a: &DenseMatrix<f64>, k: usize, method: SvdMethod) -> Result<TruncatedSvd> {
    let (m, n) = a.shape();
    if k == 0 || k > m.min(n) {
        return Err(IdeologyError::invalid(
            "dimensions",
            format!("must be between 1 and {} for a {}x{} matrix", m.min(n), m, n),
        ));
    }
    debug!("Truncated SVD: {}x{} matrix, k={}, method={:?}", m, n, k, method);

    match method {
        SvdMethod::Exact => exact_svd(a, k),
        SvdMethod::Randomized {
            n_iter,
            oversamples,
            seed,
        } => randomized_svd(a, k, n_iter, oversamples, seed.unwrap_or_else(rand::random)),
    }
}

fn exact_svd(a: &DenseMatrix<f64>, k: usize) -> Result<TruncatedSvd> {
    let (m, n) = a.shape();
    // decompose the tall orientation; for wide inputs the left vectors of A
    // are the right vectors of Aᵗ
    let (u, s) = if m >= n {
        let svd = a.svd().map_err(linalg)?;
        (svd.U, svd.s)
    } else {
        let svd = a.transpose().svd().map_err(linalg)?;
        (svd.V, svd.s)
    };
    Ok(select_top(&u, &s, k))
}

fn randomized_svd(
    a: &DenseMatrix<f64>,
    k: usize,
    n_iter: usize,
    oversamples: usize,
    seed: u64,
) -> Result<TruncatedSvd> {
    let (m, n) = a.shape();
    let l = (k + oversamples).min(m.min(n));
    trace!("Randomized SVD sketch width l={}, seed={}", l, seed);

    let omega = gaussian_matrix(n, l, seed);
    let at = a.transpose();

    let mut q = orthonormal_basis(&matmul(a, &omega))?;
    for it in 0..n_iter {
        let z = orthonormal_basis(&matmul(&at, &q))?;
        q = orthonormal_basis(&matmul(a, &z))?;
        trace!("power iteration {} done", it + 1);
    }

    // B = Qᵗ A is l x n with l <= n; decompose Bᵗ (tall) and read B's left
    // vectors from its right factor.
    let b = matmul(&q.transpose(), a);
    let svd = b.transpose().svd().map_err(linalg)?;
    let u = matmul(&q, &svd.V);
    Ok(select_top(&u, &svd.s, k))
}

/// Keep the `k` columns of `u` with the largest singular values.
fn select_top(u: &DenseMatrix<f64>, s: &[f64], k: usize) -> TruncatedSvd {
    let m = u.shape().0;
    let mut order: Vec<usize> = (0..s.len()).collect();
    order.sort_by(|&i, &j| {
        s[j].partial_cmp(&s[i])
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| i.cmp(&j))
    });
    order.truncate(k);

    let mut flat = Vec::with_capacity(m * k);
    for r in 0..m {
        flat.extend(order.iter().map(|&c| *u.get((r, c))));
    }
    TruncatedSvd {
        u: DenseMatrix::from_iterator(flat.into_iter(), m, k, 0),
        singular_values: order.iter().map(|&c| s[c]).collect(),
    }
}

/// Dense product, one output row per rayon task.
pub fn matmul(a: &DenseMatrix<f64>, b: &DenseMatrix<f64>) -> DenseMatrix<f64> {
    let (m, inner) = a.shape();
    let (inner_b, n) = b.shape();
    assert_eq!(inner, inner_b, "matmul dimension mismatch");

    let rows: Vec<Vec<f64>> = (0..m)
        .into_par_iter()
        .map(|i| {
            let mut out = vec![0.0; n];
            for p in 0..inner {
                let aip = *a.get((i, p));
                if aip == 0.0 {
                    continue;
                }
                for (j, o) in out.iter_mut().enumerate() {
                    *o += aip * *b.get((p, j));
                }
            }
            out
        })
        .collect();

    let mut flat = Vec::with_capacity(m * n);
    for row in rows {
        flat.extend(row);
    }
    DenseMatrix::from_iterator(flat.into_iter(), m, n, 0)
}

/// Orthonormal basis for the column space of a tall `y` (thin Householder Q).
fn orthonormal_basis(y: &DenseMatrix<f64>) -> Result<DenseMatrix<f64>> {
    Ok(y.qr().map_err(linalg)?.Q())
}

fn gaussian_matrix(rows: usize, cols: usize, seed: u64) -> DenseMatrix<f64> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let flat: Vec<f64> = (0..rows * cols)
        .map(|_| StandardNormal.sample(&mut rng))
        .collect();
    DenseMatrix::from_iterator(flat.into_iter(), rows, cols, 0)
}

fn linalg(e: smartcore::error::Failed) -> IdeologyError {
    IdeologyError::Linalg(e.to_string())
}
