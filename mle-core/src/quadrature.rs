//! Transform-space integration grid.
//!
//! The inverse Hankel transform of the layered solution is an oscillating,
//! decaying integral over m ∈ (0, ∞). It is split into *oscillation panels*
//! delimited by the zeros of J0(m·α) and, off axis, of J1(m·ρ). Each panel is
//! subdivided and integrated with Gauss-Legendre nodes.
//!
//! # Grid policy
//!
//! 1. Breakpoints: J0 zeros / α, plus J1 zeros / ρ when ρ > 0. Merged,
//!    sorted, truncated to `iterations`.
//! 2. The first panel starts at `zro` instead of 0.
//! 3. Sub-panels per panel: at least 6 for the first, 2 for the second, 1
//!    afterwards, and never wider than 1 / max(1, λ).
//! 4. Each sub-panel uses an n-point Gauss-Legendre rule.
//! 5. For λ > 0 integration stops once m exceeds `decay_cutoff / λ`.

use crate::bessel::{bessel_j0_zeros, bessel_j1_zeros};
use crate::error::{Error, Result};

/// Gauss-Legendre (abscissa, weight) pairs on [-1, 1] for the orders a
/// [`GridPolicy`] accepts.
///
/// # Panics
///
/// Panics if `n` is not in 1..=4; [`GridPolicy::validate`] rejects any other
/// order before a grid is built.
pub fn gauss_legendre(n: usize) -> Vec<(f64, f64)> {
    // Mirror the non-negative half of a rule into ascending order
    fn symmetric(half: &[(f64, f64)]) -> Vec<(f64, f64)> {
        let mut rule: Vec<_> = half.iter().rev().map(|&(x, w)| (-x, w)).collect();
        rule.extend(half.iter().filter(|&&(x, _)| x > 0.0));
        rule
    }

    match n {
        1 => vec![(0.0, 2.0)],
        2 => symmetric(&[(3.0_f64.sqrt().recip(), 1.0)]),
        3 => symmetric(&[(0.0, 8.0 / 9.0), (0.6_f64.sqrt(), 5.0 / 9.0)]),
        4 => {
            let r = (6.0 / 5.0_f64).sqrt();
            let s = 30.0_f64.sqrt();
            symmetric(&[
                (((3.0 - 2.0 * r) / 7.0).sqrt(), (18.0 + s) / 36.0),
                (((3.0 + 2.0 * r) / 7.0).sqrt(), (18.0 - s) / 36.0),
            ])
        }
        _ => panic!("gauss_legendre: order must be 1 to 4, got {}", n),
    }
}

/// Parameters controlling grid construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridPolicy {
    /// Number of oscillation panels.
    pub iterations: usize,
    /// Lower integration limit standing in for m = 0.
    pub zro: f64,
    /// Gauss-Legendre points per sub-panel.
    pub gauss_points: usize,
    /// Stop once m·λ exceeds this value.
    pub decay_cutoff: f64,
}

impl Default for GridPolicy {
    fn default() -> Self {
        Self {
            iterations: 40,
            zro: 1e-7,
            gauss_points: 4,
            decay_cutoff: 40.0,
        }
    }
}

impl GridPolicy {
    /// Check every parameter is usable.
    pub fn validate(&self) -> Result<()> {
        if self.iterations == 0 {
            return Err(Error::InvalidConfiguration(
                "iterations must be at least 1".into(),
            ));
        }
        if !(self.zro.is_finite() && self.zro > 0.0 && self.zro < 1e-2) {
            return Err(Error::InvalidConfiguration(format!(
                "zro must lie in (0, 1e-2), got {}",
                self.zro
            )));
        }
        if !(1..=4).contains(&self.gauss_points) {
            return Err(Error::InvalidConfiguration(format!(
                "gauss_points must be 1, 2, 3, or 4, got {}",
                self.gauss_points
            )));
        }
        if !(self.decay_cutoff.is_finite() && self.decay_cutoff > 0.0) {
            return Err(Error::InvalidConfiguration(format!(
                "decay_cutoff must be positive, got {}",
                self.decay_cutoff
            )));
        }
        Ok(())
    }
}

/// Bessel zeros computed once per analysis and shared by every point.
#[derive(Debug, Clone, PartialEq)]
pub struct ZeroTable {
    j0: Vec<f64>,
    j1: Vec<f64>,
}

impl ZeroTable {
    /// First `count` positive zeros of J0 and J1.
    pub fn new(count: usize) -> Self {
        Self {
            j0: bessel_j0_zeros(count),
            j1: bessel_j1_zeros(count),
        }
    }

    pub fn j0(&self) -> &[f64] {
        &self.j0
    }

    pub fn j1(&self) -> &[f64] {
        &self.j1
    }
}

/// A quadrature node in normalised transform space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridNode {
    /// Transform parameter.
    pub m: f64,
    /// Gauss weight already scaled by the sub-panel half-width.
    pub weight: f64,
}

/// Integration nodes for one evaluation point.
#[derive(Debug, Clone)]
pub struct HankelGrid {
    nodes: Vec<GridNode>,
    /// Exclusive node index at which each oscillation panel ends.
    panel_ends: Vec<usize>,
    reached_cutoff: bool,
}

impl HankelGrid {
    /// Build the grid for normalised load radius `alpha`, offset `rho` and
    /// depth `lambda`.
    pub fn build(zeros: &ZeroTable, alpha: f64, rho: f64, lambda: f64, policy: &GridPolicy) -> Self {
        let breakpoints = breakpoints(zeros, alpha, rho, policy);
        let cutoff = if lambda > 0.0 {
            policy.decay_cutoff / lambda
        } else {
            f64::INFINITY
        };
        let max_width = 1.0 / lambda.max(1.0);
        let rule = gauss_legendre(policy.gauss_points);

        let mut nodes = Vec::new();
        let mut panel_ends = Vec::with_capacity(breakpoints.len());
        let mut lo = policy.zro;
        for (k, &breakpoint) in breakpoints.iter().enumerate() {
            if lo >= cutoff {
                break;
            }
            // Past the cutoff the integrand is below double precision
            let hi = breakpoint.min(cutoff);
            let min_subpanels = match k {
                0 => 6,
                1 => 2,
                _ => 1,
            };
            let n_sub = min_subpanels.max(((hi - lo) / max_width).ceil() as usize);
            let width = (hi - lo) / n_sub as f64;
            let half = 0.5 * width;
            for s in 0..n_sub {
                let mid = lo + (s as f64 + 0.5) * width;
                nodes.extend(rule.iter().map(|&(xi, w)| GridNode {
                    m: mid + half * xi,
                    weight: w * half,
                }));
            }
            panel_ends.push(nodes.len());
            lo = hi;
        }

        Self {
            nodes,
            panel_ends,
            reached_cutoff: lo >= cutoff,
        }
    }

    /// All nodes in increasing order of m.
    pub fn nodes(&self) -> &[GridNode] {
        &self.nodes
    }

    /// Exclusive end index (into [`nodes`](Self::nodes)) of every panel.
    pub fn panel_ends(&self) -> &[usize] {
        &self.panel_ends
    }

    /// Number of oscillation panels integrated.
    pub fn n_panels(&self) -> usize {
        self.panel_ends.len()
    }

    /// Whether integration ran up to the exponential decay cutoff.
    pub fn reached_cutoff(&self) -> bool {
        self.reached_cutoff
    }
}

/// Merged, sorted breakpoints above `zro`, truncated to `iterations`.
fn breakpoints(zeros: &ZeroTable, alpha: f64, rho: f64, policy: &GridPolicy) -> Vec<f64> {
    let mut points: Vec<f64> = zeros.j0().iter().map(|z| z / alpha).collect();
    if rho > 0.0 {
        points.extend(zeros.j1().iter().map(|z| z / rho));
    }
    points.retain(|&p| p > policy.zro);
    points.sort_by(|a, b| a.total_cmp(b));
    points.dedup_by(|a, b| (*a - *b).abs() <= 1e-12 * b.abs());
    points.truncate(policy.iterations);
    points
}
