use crate::model::structures::belief::Belief;

/// Precision-weighted fusion of two independent Gaussian estimates of the
/// same latent skill: precisions add, means are averaged by precision.
/// Independence between the contextual and meta beliefs is a simplifying
/// assumption of the model, kept as-is because downstream evaluation is
/// calibrated against it.
pub fn fuse(a: Belief, b: Belief) -> Belief {
    // An infinite deviation carries no information; the other belief
    // passes through exactly.
    if !a.sigma.is_finite() {
        return b;
    }
    if !b.sigma.is_finite() {
        return a;
    }

    let precision_a = a.precision();
    let precision_b = b.precision();
    let precision = precision_a + precision_b;

    Belief::new(
        (a.mu * precision_a + b.mu * precision_b) / precision,
        (1.0 / precision).sqrt()
    )
    .floored()
}

/// Conservative scalar used for ranking and display.
pub fn lower_bound(belief: Belief, k: f64) -> f64 {
    belief.lower_bound(k)
}
