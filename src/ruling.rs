//! Ronchi ruling
//!
//! A ronchi ruling is a grating of alternating opaque and transparent parallel
//! bands. [`Ruling`] samples such a grating on a pixel grid.

use nalgebra::DMatrix;

#[derive(Debug, thiserror::Error)]
pub enum RulingError {
    #[error("ruling size must be at least 1x1 pixel, found {0}x{1}")]
    Size(usize, usize),
    #[error("ruling band width must be a positive finite number of pixels, found {0}")]
    Period(f64),
}
type Result<T> = std::result::Result<T, RulingError>;

/// Ronchi ruling generator
#[derive(Debug, Clone, PartialEq)]
pub struct Ruling {
    n: usize,
    m: usize,
    period: f64,
    angle: f64,
    offset: f64,
    negative: bool,
}
impl Ruling {
    /// Creates a `n`x`m` pixels ruling with bands `period` pixels wide
    pub fn new(n: usize, m: usize, period: f64) -> Self {
        Self {
            n,
            m,
            period,
            angle: 0f64,
            offset: 0f64,
            negative: false,
        }
    }
    /// Sets the orientation angle of the bands in degree
    pub fn angle(self, angle: f64) -> Self {
        Self { angle, ..self }
    }
    /// Sets the offset of the bands along the rotated x axis, in pixels
    pub fn offset(self, offset: f64) -> Self {
        Self { offset, ..self }
    }
    /// Inverts the ruling
    pub fn negative(self, negative: bool) -> Self {
        Self { negative, ..self }
    }
    /// Returns the ruling size as (# of columns, # of rows)
    pub fn size(&self) -> (usize, usize) {
        (self.n, self.m)
    }
    /// Returns the band width in pixels
    pub fn period(&self) -> f64 {
        self.period
    }
    /// Returns true if the pixel at column `x` and row `y` is transparent
    ///
    /// Bands with an even index are transparent, odd ones are opaque, the
    /// polarity is swapped for a negative ruling.
    pub fn is_transparent(&self, x: f64, y: f64) -> bool {
        let (s, c) = self.angle.rem_euclid(360f64).to_radians().sin_cos();
        let xp = x * c + y * s + self.offset;
        let band = (xp / self.period).floor();
        let odd = band.rem_euclid(2f64) != 0f64;
        !odd ^ self.negative
    }
    /// Samples the ruling on a matrix with `m` rows and `n` columns
    pub fn generate(&self) -> Result<DMatrix<bool>> {
        if self.n == 0 || self.m == 0 {
            return Err(RulingError::Size(self.n, self.m));
        }
        if !(self.period.is_finite() && self.period > 0f64) {
            return Err(RulingError::Period(self.period));
        }
        Ok(DMatrix::from_fn(self.m, self.n, |i, j| {
            self.is_transparent(j as f64, i as f64)
        }))
    }
}
