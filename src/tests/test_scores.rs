use approx::assert_abs_diff_eq;
use smartcore::linalg::basic::arrays::Array;
use smartcore::linalg::basic::matrix::DenseMatrix;

use crate::adjacency::AdjacencyMatrix;
use crate::builder::AdjacencyBuilder;
use crate::errors::IdeologyError;
use crate::scores::{
    rescale_unit_range, score, standardized_residuals, CorrespondenceAnalysis, ScoreTable,
};
use crate::svd::SvdMethod;
use crate::tests::test_data::{polarized, two_camp_log, uniform, LEFT, RIGHT};
use crate::tests::{assert_same_up_to_sign, init, SEEDED_SVD};

fn camps() -> AdjacencyMatrix {
    AdjacencyBuilder::new()
        .with_max_interactions(10)
        .build(&polarized())
        .unwrap()
        .matrix
}

/// Flip a table so that `anchor` scores positive.
fn oriented(table: &ScoreTable, anchor: &str) -> ScoreTable {
    let sign = table.get(anchor).unwrap().signum();
    ScoreTable {
        entries: table.iter().map(|(k, s)| (k.to_string(), s * sign)).collect(),
    }
}

#[test]
fn test_camps_score_on_opposite_sides() {
    init();
    let scores = CorrespondenceAnalysis::new()
        .with_svd(SvdMethod::Exact)
        .row_scores(&camps())
        .unwrap();
    assert_eq!(scores.len(), 1);
    let t = oriented(&scores[0], "R3");

    let m = t.get("M").unwrap();
    for id in LEFT {
        assert!(t.get(id).unwrap() < m, "{} should sit left of M", id);
    }
    for id in RIGHT {
        assert!(t.get(id).unwrap() > m, "{} should sit right of M", id);
    }

    assert_abs_diff_eq!(t.get("L1").unwrap(), -0.6940, epsilon = 1e-3);
    assert_abs_diff_eq!(t.get("L2").unwrap(), -0.6335, epsilon = 1e-3);
    assert_abs_diff_eq!(t.get("L3").unwrap(), -1.0, epsilon = 1e-12);
    assert_abs_diff_eq!(t.get("R1").unwrap(), 0.9505, epsilon = 1e-3);
    assert_abs_diff_eq!(t.get("R3").unwrap(), 1.0, epsilon = 1e-12);
    assert_abs_diff_eq!(t.get("M").unwrap(), 0.1631, epsilon = 1e-3);
}

#[test]
fn test_identical_rows_get_identical_scores() {
    let t = &CorrespondenceAnalysis::new()
        .with_svd(SvdMethod::Exact)
        .row_scores(&camps())
        .unwrap()[0];
    // R1 and R2 share exactly the same outlets
    assert_abs_diff_eq!(t.get("R1").unwrap(), t.get("R2").unwrap(), epsilon = 1e-9);
}

#[test]
fn test_scores_span_unit_range() {
    let adj = camps();
    let scores = score(&adj.matrix, 1).unwrap();
    let x = &scores[0];

    assert_eq!(x.len(), adj.targets.len());
    let min = x.iter().copied().fold(f64::INFINITY, f64::min);
    let max = x.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    assert_eq!(min, -1.0);
    assert_eq!(max, 1.0);
    assert!(x.iter().all(|v| (-1.0..=1.0).contains(v)));
}

#[test]
fn test_independent_table_is_degenerate() {
    init();
    let adj = AdjacencyBuilder::new().build(&uniform()).unwrap().matrix;
    let err = score(&adj.matrix, 1).unwrap_err();
    assert!(matches!(err, IdeologyError::DegenerateMatrix(_)), "{:?}", err);
}

#[test]
fn test_randomized_matches_exact_up_to_sign() {
    let adj = camps();
    let exact = CorrespondenceAnalysis::new()
        .with_svd(SvdMethod::Exact)
        .score(&adj.matrix)
        .unwrap();
    let seeded = CorrespondenceAnalysis::new()
        .with_svd(SEEDED_SVD)
        .score(&adj.matrix)
        .unwrap();
    assert_same_up_to_sign(&exact[0], &seeded[0], 1e-8);
}

#[test]
fn test_seeded_scores_are_reproducible() {
    let adj = camps();
    let engine = CorrespondenceAnalysis::new().with_svd(SEEDED_SVD);
    let a = engine.score(&adj.matrix).unwrap();
    let b = engine.score(&adj.matrix).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_call_order_does_not_matter() {
    let adj = camps();
    let engine = CorrespondenceAnalysis::new().with_svd(SEEDED_SVD);
    let flipped = adj.transpose();

    let rows_first = engine.score(&adj.matrix).unwrap();
    let cols_second = engine.score(&flipped.matrix).unwrap();
    let cols_first = engine.score(&flipped.matrix).unwrap();
    let rows_second = engine.score(&adj.matrix).unwrap();

    assert_eq!(rows_first, rows_second);
    assert_eq!(cols_first, cols_second);
}

#[test]
fn test_two_dimensions() {
    let adj = camps();
    let scores = CorrespondenceAnalysis::new()
        .with_dimensions(2)
        .with_svd(SvdMethod::Exact)
        .score(&adj.matrix)
        .unwrap();

    assert_eq!(scores.len(), 2);
    for x in &scores {
        assert_eq!(x.len(), 7);
        assert!(x.iter().all(|v| (-1.0..=1.0).contains(v)));
    }
    // first dimension is unchanged by asking for more
    let single = score(&adj.matrix, 1).unwrap();
    assert_same_up_to_sign(&scores[0], &single[0], 1e-8);
}

#[test]
fn test_too_many_dimensions() {
    let adj = camps();
    let err = score(&adj.matrix, 7).unwrap_err();
    assert!(matches!(
        err,
        IdeologyError::InvalidParameter { name: "dimensions", .. }
    ));

    let err = score(&adj.matrix, 0).unwrap_err();
    assert!(matches!(
        err,
        IdeologyError::InvalidParameter { name: "dimensions", .. }
    ));
}

#[test]
fn test_column_scores_split_outlets() {
    let adj = camps();
    let cols = &CorrespondenceAnalysis::new()
        .with_svd(SvdMethod::Exact)
        .column_scores(&adj)
        .unwrap()[0];
    let cols = oriented(cols, "rC");

    assert_eq!(cols.len(), 6);
    for left in ["lA", "lB", "lC"] {
        for right in ["rA", "rB", "rC"] {
            assert!(cols.get(left).unwrap() < cols.get(right).unwrap());
        }
    }
    assert_abs_diff_eq!(cols.get("lC").unwrap(), -1.0, epsilon = 1e-12);
    assert_abs_diff_eq!(cols.get("rB").unwrap(), 0.967, epsilon = 1e-3);
}

#[test]
fn test_rescale_unit_range() {
    let x = rescale_unit_range(&[2.0, 4.0, 3.0]).unwrap();
    assert_eq!(x, vec![-1.0, 1.0, 0.0]);

    let err = rescale_unit_range(&[0.5, 0.5, 0.5]).unwrap_err();
    assert!(matches!(err, IdeologyError::DegenerateMatrix(_)));
    assert!(rescale_unit_range(&[]).is_err());
}

#[test]
fn test_residuals_reject_empty_marginals() {
    let zero_row = DenseMatrix::from_2d_vec(&vec![
        vec![1.0, 2.0],
        vec![0.0, 0.0],
        vec![3.0, 1.0],
    ])
    .unwrap();
    let err = standardized_residuals(&zero_row).unwrap_err();
    assert!(matches!(err, IdeologyError::DegenerateMatrix(ref msg) if msg.contains("row 1")));

    let zero_col = DenseMatrix::from_2d_vec(&vec![vec![1.0, 0.0], vec![2.0, 0.0]]).unwrap();
    let err = standardized_residuals(&zero_col).unwrap_err();
    assert!(matches!(err, IdeologyError::DegenerateMatrix(ref msg) if msg.contains("column 1")));

    let negative = DenseMatrix::from_2d_vec(&vec![vec![1.0, -1.0], vec![2.0, 3.0]]).unwrap();
    assert!(standardized_residuals(&negative).is_err());
}

#[test]
fn test_residuals_are_centred() {
    let adj = camps();
    let res = standardized_residuals(&adj.matrix).unwrap();
    let (n_rows, n_cols) = (adj.targets.len(), adj.sources.len());
    let total = adj.total();
    let r: Vec<f64> = adj.row_sums().iter().map(|x| x / total).collect();

    // Σ_i sqrt(r_i) S_ij = 0 for every column
    for j in 0..n_cols {
        let s: f64 = (0..n_rows)
            .map(|i| r[i].sqrt() * *res.s.get((i, j)))
            .sum();
        assert_abs_diff_eq!(s, 0.0, epsilon = 1e-12);
    }
}

#[test]
fn test_default_randomized_tracks_exact_on_larger_log() {
    init();
    let adj = AdjacencyBuilder::new()
        .build(&two_camp_log(300))
        .unwrap()
        .matrix;
    assert_eq!(adj.shape(), (275, 24));

    let exact = CorrespondenceAnalysis::new()
        .with_dimensions(2)
        .with_svd(SvdMethod::Exact)
        .score(&adj.matrix)
        .unwrap();
    let randomized = CorrespondenceAnalysis::new()
        .with_dimensions(2)
        .score(&adj.matrix)
        .unwrap();
    assert_same_up_to_sign(&exact[0], &randomized[0], 1e-4);
    assert_same_up_to_sign(&exact[1], &randomized[1], 1e-3);

    // even and odd accounts land on opposite halves of the first axis
    let t = oriented(&ScoreTable::new(&adj.targets, &exact[0]), "t0");
    for (id, s) in t.iter() {
        let even = id[1..].parse::<usize>().unwrap() % 2 == 0;
        assert_eq!(s > 0.0, even, "{} scored {}", id, s);
    }

    let flipped = adj.transpose();
    let exact_cols = score_with(&flipped, SvdMethod::Exact);
    let randomized_cols = score_with(&flipped, SvdMethod::default());
    assert_same_up_to_sign(&exact_cols, &randomized_cols, 1e-4);
}

fn score_with(adj: &AdjacencyMatrix, svd: SvdMethod) -> Vec<f64> {
    CorrespondenceAnalysis::new()
        .with_svd(svd)
        .score(&adj.matrix)
        .unwrap()
        .remove(0)
}
