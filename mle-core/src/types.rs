//! Core value types for layered elastic analysis.
//!
//! This module defines:
//! - Evaluation points in the (r, z) half-plane
//! - Axisymmetric stress and strain states
//!
//! # Sign convention
//!
//! All outputs follow one fixed convention: compressive stress and strain are
//! positive, downward vertical displacement is positive, and radial
//! displacement is positive toward the load axis.

use crate::error::{Error, Result};
use nalgebra::{Vector3, Vector4};

/// Which layer to evaluate in when a point lies exactly on an interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InterfaceSide {
    /// The layer above the interface (bottom face of the upper layer).
    #[default]
    Upper,
    /// The layer below the interface (top face of the lower layer).
    Lower,
}

/// A point in the axisymmetric (r, z) half-plane.
///
/// Depth is measured downward from the loaded surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvaluationPoint {
    /// Radial offset from the load axis.
    pub radius: f64,
    /// Depth below the surface.
    pub depth: f64,
    /// Side used when `depth` coincides with an interface.
    pub side: InterfaceSide,
}

impl EvaluationPoint {
    /// Point at (r, z), evaluated in the upper layer at interfaces.
    pub fn new(radius: f64, depth: f64) -> Self {
        Self {
            radius,
            depth,
            side: InterfaceSide::Upper,
        }
    }

    /// Same point with an explicit interface side.
    pub fn on_side(mut self, side: InterfaceSide) -> Self {
        self.side = side;
        self
    }

    /// Reject points above the surface or with non-finite coordinates.
    pub fn validate(&self) -> Result<()> {
        if !self.depth.is_finite() || self.depth < 0.0 {
            return Err(Error::InvalidEvaluationPoint(format!(
                "depth must be finite and non-negative, got {}",
                self.depth
            )));
        }
        if !self.radius.is_finite() || self.radius < 0.0 {
            return Err(Error::InvalidEvaluationPoint(format!(
                "radial offset must be finite and non-negative, got {}",
                self.radius
            )));
        }
        Ok(())
    }
}

/// Axisymmetric stress state.
///
/// Components are ordered as: [σ_z, σ_r, σ_θ, τ_rz]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StressState(pub Vector4<f64>);

impl StressState {
    /// Create a stress state from its components.
    pub fn new(vertical: f64, radial: f64, tangential: f64, shear: f64) -> Self {
        Self(Vector4::new(vertical, radial, tangential, shear))
    }

    /// Vertical normal stress σ_z.
    #[inline]
    pub fn vertical(&self) -> f64 {
        self.0[0]
    }

    /// Radial normal stress σ_r.
    #[inline]
    pub fn radial(&self) -> f64 {
        self.0[1]
    }

    /// Tangential (hoop) normal stress σ_θ.
    #[inline]
    pub fn tangential(&self) -> f64 {
        self.0[2]
    }

    /// Shear stress τ_rz.
    #[inline]
    pub fn shear(&self) -> f64 {
        self.0[3]
    }

    /// Scale every component.
    pub fn scaled(&self, factor: f64) -> Self {
        Self(self.0 * factor)
    }
}

/// Axisymmetric normal strain state.
///
/// Components are ordered as: [ε_z, ε_r, ε_θ]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrainState(pub Vector3<f64>);

impl StrainState {
    /// Create a strain state from its components.
    pub fn new(vertical: f64, radial: f64, tangential: f64) -> Self {
        Self(Vector3::new(vertical, radial, tangential))
    }

    /// Zero strain state.
    pub fn zero() -> Self {
        Self(Vector3::zeros())
    }

    /// Vertical strain ε_z.
    #[inline]
    pub fn vertical(&self) -> f64 {
        self.0[0]
    }

    /// Radial strain ε_r.
    #[inline]
    pub fn radial(&self) -> f64 {
        self.0[1]
    }

    /// Tangential (hoop) strain ε_θ.
    #[inline]
    pub fn tangential(&self) -> f64 {
        self.0[2]
    }
}
