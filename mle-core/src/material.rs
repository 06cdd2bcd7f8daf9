//! Material property definitions.
//!
//! Every layer is an isotropic linear elastic solid. The engine is unit
//! agnostic: the modulus may be given in any stress unit as long as the load
//! pressure uses the same one.

use crate::error::{Error, Result};
use crate::types::{StrainState, StressState};
use nalgebra::{Matrix3, Vector3};

/// Isotropic linear elastic material.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    /// Young's modulus E (stress units).
    pub youngs_modulus: f64,
    /// Poisson's ratio ν (dimensionless).
    pub poissons_ratio: f64,
}

impl Material {
    /// Create a new isotropic linear elastic material.
    ///
    /// # Arguments
    ///
    /// * `youngs_modulus` - Young's modulus E, positive and finite
    /// * `poissons_ratio` - Poisson's ratio ν, in [0, 0.5)
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidLayerConfiguration`] if the properties are
    /// physically invalid for a pavement layer.
    pub fn new(youngs_modulus: f64, poissons_ratio: f64) -> Result<Self> {
        if !youngs_modulus.is_finite() || youngs_modulus <= 0.0 {
            return Err(Error::InvalidLayerConfiguration(format!(
                "Young's modulus must be positive and finite, got {}",
                youngs_modulus
            )));
        }
        if !(0.0..0.5).contains(&poissons_ratio) {
            return Err(Error::InvalidLayerConfiguration(format!(
                "Poisson's ratio must be in range [0, 0.5), got {}",
                poissons_ratio
            )));
        }
        Ok(Self {
            youngs_modulus,
            poissons_ratio,
        })
    }

    /// Factor (1 + ν) / E that scales the displacement kernels of a layer.
    pub fn displacement_factor(&self) -> f64 {
        (1.0 + self.poissons_ratio) / self.youngs_modulus
    }

    /// Axisymmetric compliance for the normal components.
    ///
    /// Returns the 3x3 matrix C such that
    /// [ε_z, ε_r, ε_θ]^T = C * [σ_z, σ_r, σ_θ]^T.
    ///
    /// The same relation holds whichever sign convention is used, as long as
    /// stresses and strains share it.
    pub fn compliance_axisymmetric(&self) -> Matrix3<f64> {
        let inv_e = 1.0 / self.youngs_modulus;
        let c = -self.poissons_ratio * inv_e;

        Matrix3::new(
            inv_e, c, c,
            c, inv_e, c,
            c, c, inv_e,
        )
    }

    /// Strains produced by a stress state in this material.
    pub fn strain(&self, stress: &StressState) -> StrainState {
        let normal = Vector3::new(stress.vertical(), stress.radial(), stress.tangential());
        StrainState(self.compliance_axisymmetric() * normal)
    }
}
