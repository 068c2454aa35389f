/*!
# Ronchigram

Synthetic ronchigrams of optical systems with third order aberrations.

A ronchi ruling is placed near the focus of the system under test; seen from
the exit pupil, the ruling bands are magnified and distorted by the
aberrations of the wavefront. The ronchigram is computed by sampling a
magnified ruling on a grid and by interpolating it at the coordinates of the
rays displaced by the aberrations.

## Key Components

- [`Ruling`] - Ronchi ruling sampled on a pixel grid
- [`Aberrations`] - Spherical, coma, astigmatism and defocus coefficients
- [`LinearInterpolator`] - Delaunay based scattered data linear interpolation
- [`RonchigramBuilder`] - Optical parameters and ronchigram computation
- [`Heatmap`] - Ronchigram display (`plot` feature)
*/

pub mod aberration;
mod error;
pub mod grid;
pub mod interpolation;
#[cfg(feature = "plot")]
pub mod plot;
pub mod ronchigram;
pub mod ruling;

pub use aberration::Aberrations;
pub use error::{Error, Result};
pub use interpolation::LinearInterpolator;
#[cfg(feature = "plot")]
pub use plot::{Colormap, Heatmap};
pub use ronchigram::{Ronchigram, RonchigramBuilder};
pub use ruling::Ruling;
