//! Ronchigram display
//!
//! Renders a map as a heatmap image, one rectangle per sample with the origin in
//! the lower left corner. `NaN` samples are left to the background color.

use nalgebra::DMatrix;
use plotters::prelude::*;
use std::path::Path;
use strum_macros::{Display, EnumIter, EnumString};

#[derive(Debug, thiserror::Error)]
pub enum PlotError {
    #[error("failed to draw the heatmap: {0}")]
    Drawing(String),
    #[error("cannot plot an empty map")]
    Empty,
}
type Result<T> = std::result::Result<T, PlotError>;

fn drawing_error<E: std::fmt::Display>(e: E) -> PlotError {
    PlotError::Drawing(e.to_string())
}

/// Color maps
#[derive(Debug, Default, Clone, Copy, PartialEq, Display, EnumIter, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Colormap {
    #[default]
    Viridis,
    Plasma,
    Greys,
    Cubehelix,
}
impl Colormap {
    /// Returns the color at `t` in [0,1]
    pub fn eval(&self, t: f64) -> RGBColor {
        let gradient = match self {
            Colormap::Viridis => colorous::VIRIDIS,
            Colormap::Plasma => colorous::PLASMA,
            Colormap::Greys => colorous::GREYS,
            Colormap::Cubehelix => colorous::CUBEHELIX,
        };
        let c = gradient.eval_continuous(t.clamp(0., 1.));
        RGBColor(c.r, c.g, c.b)
    }
}

/// Heatmap renderer
#[derive(Debug, Clone)]
pub struct Heatmap {
    colormap: Colormap,
    background: RGBColor,
    size: (u32, u32),
}
impl Default for Heatmap {
    fn default() -> Self {
        Self {
            colormap: Colormap::default(),
            background: BLACK,
            size: (1000, 1000),
        }
    }
}
impl Heatmap {
    pub fn colormap(self, colormap: Colormap) -> Self {
        Self { colormap, ..self }
    }
    /// Sets the color of the `NaN` samples and of the margins
    pub fn background(self, background: RGBColor) -> Self {
        Self { background, ..self }
    }
    /// Sets the image size in pixels
    pub fn size(self, width: u32, height: u32) -> Self {
        Self {
            size: (width, height),
            ..self
        }
    }
    /// Returns the color of each sample, `None` for the non-finite ones
    ///
    /// The colors are normalized to the range of the finite samples.
    pub fn colors(&self, map: &DMatrix<f64>) -> DMatrix<Option<RGBColor>> {
        let range = map
            .iter()
            .filter(|x| x.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, up), &x| {
                (lo.min(x), up.max(x))
            });
        let (lo, up) = range;
        map.map(|x| {
            x.is_finite().then(|| {
                let t = if up > lo { (x - lo) / (up - lo) } else { 0.5 };
                self.colormap.eval(t)
            })
        })
    }
    /// Draws `map` into the PNG file at `path`, row 0 at the bottom
    pub fn draw<P: AsRef<Path>>(&self, map: &DMatrix<f64>, path: P) -> Result<()> {
        let (m, n) = map.shape();
        if m == 0 || n == 0 {
            return Err(PlotError::Empty);
        }
        let colors = self.colors(map);

        let root = BitMapBackend::new(path.as_ref(), self.size).into_drawing_area();
        root.fill(&self.background).map_err(drawing_error)?;
        let mut chart = ChartBuilder::on(&root)
            .margin(10)
            .build_cartesian_2d(0..n, 0..m)
            .map_err(drawing_error)?;
        chart
            .draw_series((0..m).flat_map(|i| {
                let colors = &colors;
                (0..n).filter_map(move |j| {
                    colors[(i, j)].map(|c| Rectangle::new([(j, i), (j + 1, i + 1)], c.filled()))
                })
            }))
            .map_err(drawing_error)?;
        root.present().map_err(drawing_error)?;
        log::info!("{}x{} heatmap saved to {:?}", n, m, path.as_ref());
        Ok(())
    }
}
