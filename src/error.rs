use crate::{interpolation::InterpolationError, ruling::RulingError};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Error in the `ruling` module")]
    Ruling(#[from] RulingError),
    #[error("Error in the `interpolation` module")]
    Interpolation(#[from] InterpolationError),
    #[cfg(feature = "plot")]
    #[error("Error in the `plot` module")]
    Plot(#[from] crate::plot::PlotError),
    #[error("pupil radius must be a non-zero finite number, found {0}")]
    PupilRadius(f64),
    #[error("ronchigram size must be at least 1x1 pixel, found {0}x{1}")]
    Size(usize, usize),
    #[error("Failed to write the ronchigram file")]
    Io(#[from] std::io::Error),
    #[error("Failed to pickle the ronchigram")]
    Pickle(#[from] serde_pickle::Error),
}
pub type Result<T> = std::result::Result<T, Error>;
