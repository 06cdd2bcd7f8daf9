//! Bessel functions of the first kind, orders 0 and 1.
//!
//! The Hankel-transform kernels need J0 and J1 at arguments `m·r` spanning
//! several orders of magnitude. Three regimes keep the error near 1e-14 of
//! the function scale everywhere:
//!
//! - `|x| <= 8`: power series (terms peak near 1e2, so cancellation costs at
//!   most two digits)
//! - `8 < |x| < 30`: Miller's backward recurrence normalised with
//!   J0 + 2·ΣJ2k = 1
//! - `|x| >= 30`: Hankel asymptotic expansion, truncated at its smallest term
//!
//! Zeros of J0 and J1 are obtained from McMahon's expansion refined by
//! Newton iteration on the same evaluator.

use std::f64::consts::{FRAC_PI_4, PI};

const SERIES_LIMIT: f64 = 8.0;
const ASYMPTOTIC_LIMIT: f64 = 30.0;
const RESCALE: f64 = 1e200;

/// Bessel function J0(x).
pub fn bessel_j0(x: f64) -> f64 {
    bessel_j0_j1(x).0
}

/// Bessel function J1(x).
pub fn bessel_j1(x: f64) -> f64 {
    bessel_j0_j1(x).1
}

/// J0(x) and J1(x) evaluated together.
///
/// J0 is even and J1 is odd, so negative arguments reuse the positive branch.
pub fn bessel_j0_j1(x: f64) -> (f64, f64) {
    let ax = x.abs();
    let (j0, j1) = if ax <= SERIES_LIMIT {
        series(ax)
    } else if ax < ASYMPTOTIC_LIMIT {
        miller(ax)
    } else {
        (asymptotic(0, ax), asymptotic(1, ax))
    };
    if x < 0.0 {
        (j0, -j1)
    } else {
        (j0, j1)
    }
}

/// J0(x) = Σ (-1)^k (x/2)^{2k} / (k!)²,  J1(x) = (x/2) Σ (-1)^k (x/2)^{2k} / (k!(k+1)!)
fn series(x: f64) -> (f64, f64) {
    let t = 0.25 * x * x;
    let mut sum0 = 1.0;
    let mut sum1 = 1.0;
    let mut term0 = 1.0;
    let mut term1 = 1.0;
    for k in 1..60 {
        let k = k as f64;
        term0 *= -t / (k * k);
        term1 *= -t / (k * (k + 1.0));
        sum0 += term0;
        sum1 += term1;
        if term0.abs() < 1e-18 && term1.abs() < 1e-18 {
            break;
        }
    }
    (sum0, 0.5 * x * sum1)
}

/// Miller's algorithm: recur J_{k-1} = (2k/x) J_k − J_{k+1} downward from an
/// arbitrary seed, then normalise.
fn miller(x: f64) -> (f64, f64) {
    let start = 2 * ((x as usize + 15 + (40.0 * x).sqrt() as usize) / 2);

    let mut j_above = 0.0;
    let mut j = 1e-30;
    let mut norm = 0.0;
    let mut j1 = 0.0;

    for k in (1..=start).rev() {
        let j_below = 2.0 * k as f64 / x * j - j_above;
        j_above = j;
        j = j_below;

        if j.abs() > RESCALE {
            j /= RESCALE;
            j_above /= RESCALE;
            norm /= RESCALE;
            j1 /= RESCALE;
        }

        let order = k - 1;
        if order == 1 {
            j1 = j;
        } else if order > 0 && order % 2 == 0 {
            norm += 2.0 * j;
        }
    }
    norm += j;

    (j / norm, j1 / norm)
}

/// Hankel expansion J_ν(x) ≈ √(2/πx) [P cos χ − Q sin χ], χ = x − (ν/2 + 1/4)π.
fn asymptotic(order: u32, x: f64) -> f64 {
    let mu = 4.0 * (order * order) as f64;
    let eight_x = 8.0 * x;

    let mut p = 0.0;
    let mut q = 0.0;
    let mut term = 1.0_f64;
    let mut k = 0usize;
    loop {
        match k % 4 {
            0 => p += term,
            1 => q += term,
            2 => p -= term,
            _ => q -= term,
        }
        k += 1;
        let odd = (2 * k - 1) as f64;
        let next = term * (mu - odd * odd) / (k as f64 * eight_x);
        if next.abs() >= term.abs() || next.abs() < 1e-17 {
            break;
        }
        term = next;
    }

    let chi = x - (0.5 * order as f64) * PI - FRAC_PI_4;
    (2.0 / (PI * x)).sqrt() * (p * chi.cos() - q * chi.sin())
}

/// First `count` positive zeros of J0.
pub fn bessel_j0_zeros(count: usize) -> Vec<f64> {
    (1..=count).map(|k| refine_zero(0, k)).collect()
}

/// First `count` positive zeros of J1 (excluding the trivial zero at x = 0).
pub fn bessel_j1_zeros(count: usize) -> Vec<f64> {
    (1..=count).map(|k| refine_zero(1, k)).collect()
}

/// k-th zero of J_order from McMahon's expansion plus Newton steps.
///
/// Derivatives: J0' = −J1, J1' = J0 − J1/x.
fn refine_zero(order: u32, k: usize) -> f64 {
    let mu = 4.0 * (order * order) as f64;
    let beta = (k as f64 + 0.5 * order as f64 - 0.25) * PI;
    let eight_beta = 8.0 * beta;
    let mut x = beta
        - (mu - 1.0) / eight_beta
        - 4.0 * (mu - 1.0) * (7.0 * mu - 31.0) / (3.0 * eight_beta.powi(3));

    for _ in 0..20 {
        let (j0, j1) = bessel_j0_j1(x);
        let step = if order == 0 { -j0 / j1 } else { j1 / (j0 - j1 / x) };
        x -= step;
        if step.abs() <= 1e-15 * x {
            break;
        }
    }
    x
}
