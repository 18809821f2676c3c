mod test_records;
mod test_scores;

use crate::svd::SvdMethod;

pub const SEEDED_SVD: SvdMethod = SvdMethod::Randomized {
    n_iter: 5,
    oversamples: 10,
    seed: Some(7),
};

pub fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Assert two score vectors agree up to a global sign flip.
pub fn assert_same_up_to_sign(a: &[f64], b: &[f64], tol: f64) {
    assert_eq!(a.len(), b.len(), "length mismatch");
    let same = a.iter().zip(b).all(|(x, y)| (x - y).abs() < tol);
    let flipped = a.iter().zip(b).all(|(x, y)| (x + y).abs() < tol);
    assert!(
        same || flipped,
        "score vectors differ beyond sign: {:?} vs {:?}",
        a,
        b
    );
}
