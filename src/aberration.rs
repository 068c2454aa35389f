//! Third order wavefront aberrations
//!
//! The aberrations displace the rays crossing the exit pupil at the
//! normalized coordinates (x,y). The displacements are the partial derivatives
//! of the wavefront error polynomial scaled by the magnification of the ruling
//! and by the radius of the optical system.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Aberration coefficients
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aberrations {
    pub spherical: f64,
    pub coma: f64,
    pub astigmatism: f64,
    pub defocus: f64,
}
impl Aberrations {
    pub fn new(spherical: f64, coma: f64, astigmatism: f64, defocus: f64) -> Self {
        Self {
            spherical,
            coma,
            astigmatism,
            defocus,
        }
    }
    pub fn spherical(self, spherical: f64) -> Self {
        Self { spherical, ..self }
    }
    pub fn coma(self, coma: f64) -> Self {
        Self { coma, ..self }
    }
    pub fn astigmatism(self, astigmatism: f64) -> Self {
        Self {
            astigmatism,
            ..self
        }
    }
    pub fn defocus(self, defocus: f64) -> Self {
        Self { defocus, ..self }
    }
    /// Returns true if all the coefficients are zero
    pub fn is_zero(&self) -> bool {
        self.as_array().iter().all(|&c| c == 0f64)
    }
    /// Returns the coefficients as [spherical, coma, astigmatism, defocus]
    pub fn as_array(&self) -> [f64; 4] {
        [self.spherical, self.coma, self.astigmatism, self.defocus]
    }
    /// Returns the ray displacement gradient (dx,dy) at the pupil coordinates (x,y)
    pub fn gradient(&self, x: f64, y: f64) -> (f64, f64) {
        let Self {
            spherical: sph,
            coma,
            astigmatism: astig,
            defocus,
        } = *self;
        let r2 = x * x + y * y;
        (
            4. * sph * x * r2 + 2. * coma * x * y + 2. * astig * x + 2. * defocus * x,
            4. * sph * x * r2 + coma * x * x + 3. * coma * y * y + 6. * astig * y + 2. * defocus * y,
        )
    }
    /// Returns the aberrated coordinates of the ray crossing the pupil at (x,y)
    ///
    /// `mag` is the magnification of the ruling and `rn` the normalized radius of
    /// the optical system.
    pub fn displace(&self, x: f64, y: f64, mag: f64, rn: f64) -> (f64, f64) {
        let (dx, dy) = self.gradient(x, y);
        let s = mag * rn;
        (x - s * dx, y - s * dy)
    }
}
impl From<[f64; 4]> for Aberrations {
    fn from([spherical, coma, astigmatism, defocus]: [f64; 4]) -> Self {
        Self::new(spherical, coma, astigmatism, defocus)
    }
}
impl fmt::Display for Aberrations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "spherical: {:e}, coma: {:e}, astigmatism: {:e}, defocus: {:e}",
            self.spherical, self.coma, self.astigmatism, self.defocus
        )
    }
}
