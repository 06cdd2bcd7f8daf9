//! Uniform circular surface load.

use crate::bessel::bessel_j1;
use crate::error::{Error, Result};
use std::f64::consts::PI;

/// Uniform vertical pressure over a circular contact area centred on the axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadSpec {
    /// Contact pressure q (stress units, positive pushes down).
    pressure: f64,
    /// Contact radius a (length units).
    radius: f64,
}

impl LoadSpec {
    /// Create a load from pressure and contact radius.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidLoad`] if either value is non-positive or non-finite.
    pub fn new(pressure: f64, radius: f64) -> Result<Self> {
        if !pressure.is_finite() || pressure <= 0.0 {
            return Err(Error::InvalidLoad(format!(
                "pressure must be positive and finite, got {}",
                pressure
            )));
        }
        if !radius.is_finite() || radius <= 0.0 {
            return Err(Error::InvalidLoad(format!(
                "contact radius must be positive and finite, got {}",
                radius
            )));
        }
        Ok(Self { pressure, radius })
    }

    /// Load defined by its resultant force and contact pressure.
    ///
    /// The radius follows from `force = pressure * π a²`.
    pub fn from_force(force: f64, pressure: f64) -> Result<Self> {
        if !force.is_finite() || force <= 0.0 {
            return Err(Error::InvalidLoad(format!(
                "force must be positive and finite, got {}",
                force
            )));
        }
        if !pressure.is_finite() || pressure <= 0.0 {
            return Err(Error::InvalidLoad(format!(
                "pressure must be positive and finite, got {}",
                pressure
            )));
        }
        Self::new(pressure, (force / (PI * pressure)).sqrt())
    }

    /// Contact pressure.
    pub fn pressure(&self) -> f64 {
        self.pressure
    }

    /// Contact radius.
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Resultant vertical force q·π·a².
    pub fn total_force(&self) -> f64 {
        self.pressure * PI * self.radius * self.radius
    }

    /// Same contact area with the pressure multiplied by `factor`.
    pub fn scaled(&self, factor: f64) -> Result<Self> {
        Self::new(self.pressure * factor, self.radius)
    }

    /// Hankel transform (order 0) of the unit-pressure disc, in coordinates
    /// normalised by `length_scale`.
    ///
    /// With α = a / length_scale this is ∫₀^α J0(m s) s ds = α·J1(m α)/m,
    /// which tends to α²/2 as m → 0.
    pub fn kernel(&self, m: f64, length_scale: f64) -> f64 {
        let alpha = self.radius / length_scale;
        if m == 0.0 {
            return 0.5 * alpha * alpha;
        }
        alpha * bessel_j1(m * alpha) / m
    }
}
