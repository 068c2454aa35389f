//! Aberrated ronchigram
//!
//! The ronchigram is the image of a ronchi ruling seen through an optical system
//! with aberrations. The ruling is defined at the exit pupil: it is sampled on a
//! grid twice as large as the normalized pupil and interpolated at the
//! coordinates of the rays displaced by the aberrations.
//!
//! ```no_run
//! use ronchigram::{Aberrations, RonchigramBuilder};
//!
//! let rg = RonchigramBuilder::new(25., 200., 0.1, -30.)
//!     .aberrations(Aberrations::default().defocus(5e-4))
//!     .ruling_offset(0.)
//!     .build()?;
//! println!("{:?}", rg.shape());
//! # Ok::<(), ronchigram::Error>(())
//! ```

use crate::{
    grid,
    interpolation::LinearInterpolator,
    ruling::Ruling,
    Aberrations, Error, Result,
};
use nalgebra::DMatrix;
use npyz::WriterBuilder;
use serde::{Deserialize, Serialize};
use std::{fs::File, io::BufWriter, path::Path, time::Instant};

/// Half width of the normalized grid the ruling is sampled on
pub const RULING_HALF_WIDTH: usize = 2;

/// Ronchigram parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RonchigramBuilder {
    /// Exit pupil radius
    pupil_radius: f64,
    /// Focal length of the system under test
    focal_length: f64,
    /// Ruling band width
    ruling_period: f64,
    /// Offset from the focal point along the optical axis
    focal_offset: f64,
    /// Orientation of the ruling bands [deg]
    ruling_angle: f64,
    /// Wavefront aberration coefficients
    aberrations: Aberrations,
    /// Number of columns
    n: usize,
    /// Number of rows
    m: usize,
    /// Inverts the ruling if true
    negative: bool,
    /// Scaling factor of the ruling band width and offset
    ruling_scale: f64,
    /// Ruling offset, in units of the magnified pupil
    ruling_offset: f64,
}
impl RonchigramBuilder {
    /// Creates a new 200x200 ronchigram builder
    ///
    /// `pupil_radius`, `focal_length`, `ruling_period` and `focal_offset` share
    /// the same length unit.
    pub fn new(pupil_radius: f64, focal_length: f64, ruling_period: f64, focal_offset: f64) -> Self {
        Self {
            pupil_radius,
            focal_length,
            ruling_period,
            focal_offset,
            ruling_angle: 0f64,
            aberrations: Aberrations::default(),
            n: 200,
            m: 200,
            negative: false,
            ruling_scale: 1f64,
            ruling_offset: 1f64,
        }
    }
    /// Sets the orientation angle of the ruling bands in degree
    pub fn ruling_angle(self, ruling_angle: f64) -> Self {
        Self {
            ruling_angle,
            ..self
        }
    }
    pub fn aberrations(self, aberrations: Aberrations) -> Self {
        Self {
            aberrations,
            ..self
        }
    }
    /// Sets the ronchigram size to `n` columns and `m` rows
    pub fn size(self, n: usize, m: usize) -> Self {
        Self { n, m, ..self }
    }
    /// Inverts the ruling
    pub fn negative(self, negative: bool) -> Self {
        Self { negative, ..self }
    }
    /// Sets the scaling factor applied to the ruling band width and offset
    pub fn ruling_scale(self, ruling_scale: f64) -> Self {
        Self {
            ruling_scale,
            ..self
        }
    }
    /// Sets the ruling offset, in units of the magnified pupil
    pub fn ruling_offset(self, ruling_offset: f64) -> Self {
        Self {
            ruling_offset,
            ..self
        }
    }
    /// Returns the ronchigram size as (# of rows, # of columns)
    pub fn shape(&self) -> (usize, usize) {
        (self.m, self.n)
    }
    /// Returns the focal length, focal offset and ruling period normalized to the pupil radius
    pub fn normalized(&self) -> (f64, f64, f64) {
        let a = self.pupil_radius;
        (self.focal_length / a, self.focal_offset / a, self.ruling_period / a)
    }
    /// Returns the normalized radius of the optical system
    pub fn system_radius(&self) -> f64 {
        let (fn_, _, _) = self.normalized();
        2. * fn_
    }
    /// Returns the magnification of the ruling at the exit pupil
    ///
    /// At focus, the magnification is set to minus the system radius.
    pub fn magnification(&self) -> f64 {
        let (_, zn, _) = self.normalized();
        let rn = self.system_radius();
        if zn == 0f64 {
            -rn
        } else {
            -rn / zn
        }
    }
    /// Returns the width of the ruling bands on the ruling grid, in pixels
    ///
    /// The width is rounded half to even and is never less than 1 pixel.
    pub fn ruling_pitch(&self) -> f64 {
        let (_, _, dn) = self.normalized();
        let d1 = self.ruling_scale * dn * self.magnification().abs();
        if d1 > 1f64 {
            d1.round_ties_even()
        } else {
            1f64
        }
    }
    /// Returns the ruling offset on the ruling grid, in pixels
    pub fn ruling_pixel_offset(&self) -> f64 {
        RULING_HALF_WIDTH as f64 * self.ruling_scale * self.magnification() * self.ruling_offset
    }
    /// Returns the normalized pupil coordinates `(x, y)` over `[-1,1]`
    pub fn pupil_coordinates(&self) -> (DMatrix<f64>, DMatrix<f64>) {
        grid::centered(1., self.n, self.m)
    }
    /// Returns the pupil coordinates `(xa, ya)` displaced by the aberrations
    pub fn aberrated_coordinates(&self) -> (DMatrix<f64>, DMatrix<f64>) {
        let (x, y) = self.pupil_coordinates();
        let mag = self.magnification();
        let rn = self.system_radius();
        let xy: Vec<_> = x
            .iter()
            .zip(y.iter())
            .map(|(&x, &y)| self.aberrations.displace(x, y, mag, rn))
            .collect();
        let (xa, ya): (Vec<f64>, Vec<f64>) = xy.into_iter().unzip();
        (
            DMatrix::from_vec(self.m, self.n, xa),
            DMatrix::from_vec(self.m, self.n, ya),
        )
    }
    /// Returns the coordinates of the ruling grid over `[-2,2]`
    pub fn ruling_coordinates(&self) -> (DMatrix<f64>, DMatrix<f64>) {
        let c = RULING_HALF_WIDTH;
        grid::centered(c as f64, c * self.n, c * self.m)
    }
    /// Returns the magnified ruling sampled on the ruling grid
    pub fn ruling(&self) -> Result<DMatrix<bool>> {
        let c = RULING_HALF_WIDTH;
        Ok(Ruling::new(c * self.n, c * self.m, self.ruling_pitch())
            .angle(self.ruling_angle)
            .offset(self.ruling_pixel_offset())
            .negative(self.negative)
            .generate()?)
    }
    fn validate(&self) -> Result<()> {
        if self.pupil_radius == 0f64 || !self.pupil_radius.is_finite() {
            return Err(Error::PupilRadius(self.pupil_radius));
        }
        if self.n == 0 || self.m == 0 {
            return Err(Error::Size(self.n, self.m));
        }
        Ok(())
    }
    /// Computes the ronchigram
    pub fn build(self) -> Result<Ronchigram> {
        self.validate()?;
        log::debug!(
            "normalized (f,z,d): {:?}, system radius: {}, magnification: {}",
            self.normalized(),
            self.system_radius(),
            self.magnification()
        );
        log::debug!(
            "ruling pitch: {}px, ruling offset: {}px",
            self.ruling_pitch(),
            self.ruling_pixel_offset()
        );

        let now = Instant::now();
        let (xa, ya) = self.aberrated_coordinates();
        let (xm, ym) = self.ruling_coordinates();
        let ruling = self.ruling()?;
        let values = ruling.map(|b| if b { 1f64 } else { 0f64 });
        log::info!(
            "{}x{} ruling generated in {}ms",
            ruling.ncols(),
            ruling.nrows(),
            now.elapsed().as_millis()
        );

        let now = Instant::now();
        let interpolator = LinearInterpolator::from_grid(&xm, &ym, &values)?;
        let map = interpolator.interpolate_map(&xa, &ya)?;
        log::info!(
            "{}x{} ronchigram interpolated in {}ms",
            map.ncols(),
            map.nrows(),
            now.elapsed().as_millis()
        );

        let ronchigram = Ronchigram {
            parameters: self,
            map,
        };
        let n_nan = ronchigram.nan_count();
        if n_nan > 0 {
            log::warn!("{} ronchigram samples outside the ruling grid", n_nan);
        }
        Ok(ronchigram)
    }
}

/// Ronchigram
#[derive(Debug, Clone)]
pub struct Ronchigram {
    parameters: RonchigramBuilder,
    map: DMatrix<f64>,
}

#[derive(Serialize, Deserialize)]
struct RonchigramDump {
    parameters: RonchigramBuilder,
    map: Vec<Vec<f64>>,
}

impl Ronchigram {
    /// Returns the ronchigram size as (# of rows, # of columns)
    pub fn shape(&self) -> (usize, usize) {
        self.map.shape()
    }
    /// Returns the ronchigram map, rows along y
    pub fn map(&self) -> &DMatrix<f64> {
        &self.map
    }
    pub fn into_map(self) -> DMatrix<f64> {
        self.map
    }
    pub fn parameters(&self) -> &RonchigramBuilder {
        &self.parameters
    }
    /// Returns the number of samples that could not be interpolated
    pub fn nan_count(&self) -> usize {
        self.map.iter().filter(|x| x.is_nan()).count()
    }
    /// Returns the range of the finite samples
    pub fn value_range(&self) -> Option<(f64, f64)> {
        self.map
            .iter()
            .filter(|x| x.is_finite())
            .fold(None, |r, &x| match r {
                None => Some((x, x)),
                Some((lo, up)) => Some((lo.min(x), up.max(x))),
            })
    }
    /// Returns an iterator over the samples in row major order
    pub fn row_major_iter(&self) -> impl Iterator<Item = f64> + '_ {
        let map = &self.map;
        (0..map.nrows()).flat_map(move |i| (0..map.ncols()).map(move |j| map[(i, j)]))
    }
    /// Writes the ronchigram into a numpy `.npy` file
    pub fn to_npy<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let (m, n) = self.shape();
        let mut file = BufWriter::new(File::create(path.as_ref())?);
        let mut writer = npyz::WriteOptions::new()
            .default_dtype()
            .shape(&[m as u64, n as u64])
            .writer(&mut file)
            .begin_nd()?;
        writer.extend(self.row_major_iter())?;
        writer.finish()?;
        log::info!("ronchigram saved to {:?}", path.as_ref());
        Ok(())
    }
    /// Pickles the ronchigram parameters and map
    pub fn dump<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut file = BufWriter::new(File::create(path.as_ref())?);
        let dump = RonchigramDump {
            parameters: self.parameters.clone(),
            map: self
                .map
                .row_iter()
                .map(|row| row.iter().cloned().collect())
                .collect(),
        };
        serde_pickle::to_writer(&mut file, &dump, Default::default())?;
        log::info!("ronchigram pickled to {:?}", path.as_ref());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{fs, io::Read};

    fn demo() -> RonchigramBuilder {
        RonchigramBuilder::new(25., 200., 0.1, -30.)
            .aberrations(Aberrations::default().defocus(5e-4))
            .ruling_offset(0.)
    }

    #[test]
    fn optical_quantities() {
        let rg = demo();
        let (fn_, zn, dn) = rg.normalized();
        assert_eq!((fn_, zn), (8., -1.2));
        assert!((dn - 0.004).abs() < 1e-15);
        assert_eq!(rg.system_radius(), 16.);
        assert!((rg.magnification() - 16. / 1.2).abs() < 1e-12);
        assert_eq!(rg.ruling_pitch(), 1.);
        assert_eq!(rg.ruling_pixel_offset(), 0.);
    }

    #[test]
    fn magnification_at_focus() {
        let rg = RonchigramBuilder::new(25., 200., 0.1, 0.);
        assert_eq!(rg.magnification(), -16.);
        assert!(rg.magnification().is_finite());
        let rg = rg.size(40, 30).build().unwrap();
        assert_eq!(rg.shape(), (30, 40));
        assert_eq!(rg.nan_count(), 0);
        assert_eq!(rg.parameters().magnification(), -16.);
    }

    #[test]
    fn ruling_pitch_clamping() {
        // xsize.dn.|mag| = 0.8
        let rg = RonchigramBuilder::new(25., 200., 1.5, -30.);
        assert_eq!(rg.ruling_pitch(), 1.);
        // 2.666
        let rg = RonchigramBuilder::new(25., 200., 5., -30.);
        assert_eq!(rg.ruling_pitch(), 3.);
        // 26.66
        assert_eq!(rg.ruling_scale(10.).ruling_pitch(), 27.);
        // 1.333
        let rg = RonchigramBuilder::new(25., 200., 2.5, -30.);
        assert_eq!(rg.ruling_pitch(), 1.);
    }

    #[test]
    fn no_aberration_no_displacement() {
        let rg = RonchigramBuilder::new(25., 200., 0.1, -30.).size(31, 17);
        let (x, y) = rg.pupil_coordinates();
        let (xa, ya) = rg.aberrated_coordinates();
        assert_eq!(xa.shape(), (17, 31));
        assert_eq!(xa, x);
        assert_eq!(ya, y);
    }

    #[test]
    fn ruling_grid_is_twice_larger() {
        let rg = demo().size(30, 20);
        let (xm, ym) = rg.ruling_coordinates();
        assert_eq!(xm.shape(), (40, 60));
        assert_eq!(xm[(0, 0)], -2.);
        assert_eq!(ym[(39, 59)], 2.);
        assert_eq!(rg.ruling().unwrap().shape(), (40, 60));
    }

    #[test]
    fn demo_ronchigram() {
        let rg = demo().build().unwrap();
        assert_eq!(rg.shape(), (200, 200));
        assert_eq!(rg.nan_count(), 0);
        let (lo, up) = rg.value_range().unwrap();
        assert!(lo >= -1e-9 && up <= 1. + 1e-9, "({},{})", lo, up);
    }

    #[test]
    fn wide_bands_are_binary() {
        let rg = RonchigramBuilder::new(25., 200., 5., -30.)
            .ruling_scale(10.)
            .ruling_offset(0.)
            .size(60, 60)
            .build()
            .unwrap();
        let binary = rg
            .map()
            .iter()
            .filter(|&&x| x.abs() < 1e-9 || (x - 1.).abs() < 1e-9)
            .count();
        assert!(binary as f64 > 0.8 * 3600., "{} binary samples", binary);
        let (lo, up) = rg.value_range().unwrap();
        assert!(lo.abs() < 1e-9 && (up - 1.).abs() < 1e-9);
    }

    #[test]
    fn negative_ronchigram() {
        let rg = RonchigramBuilder::new(25., 200., 5., -30.)
            .ruling_scale(10.)
            .ruling_offset(0.)
            .size(40, 30);
        let positive = rg.clone().build().unwrap().into_map();
        let negative = rg.negative(true).build().unwrap().into_map();
        positive
            .iter()
            .zip(negative.iter())
            .for_each(|(p, n)| assert!((p + n - 1.).abs() < 1e-9));
    }

    #[test]
    fn shape_with_large_aberrations() {
        let rg = RonchigramBuilder::new(25., 200., 0.1, -30.)
            .aberrations(Aberrations::new(1e-2, 5e-3, 2e-3, 1e-2))
            .size(24, 18)
            .build()
            .unwrap();
        assert_eq!(rg.shape(), (18, 24));
        assert!(rg.nan_count() > 0);
    }

    #[test]
    fn rejects_invalid_parameters() {
        assert!(matches!(
            RonchigramBuilder::new(0., 200., 0.1, -30.).build(),
            Err(Error::PupilRadius(_))
        ));
        assert!(matches!(
            RonchigramBuilder::new(25., 200., 0.1, -30.)
                .size(0, 10)
                .build(),
            Err(Error::Size(0, 10))
        ));
    }

    #[test]
    fn npy_export() {
        let rg = demo().size(12, 8).build().unwrap();
        let path = std::env::temp_dir().join("ronchigram_npy_export.npy");
        rg.to_npy(&path).unwrap();
        let mut magic = [0u8; 6];
        fs::File::open(&path)
            .unwrap()
            .read_exact(&mut magic)
            .unwrap();
        assert_eq!(&magic, b"\x93NUMPY");
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn pickle_dump() {
        let rg = demo().size(12, 8).build().unwrap();
        let path = std::env::temp_dir().join("ronchigram_pickle_dump.pkl");
        rg.dump(&path).unwrap();
        let dump: RonchigramDump =
            serde_pickle::from_reader(fs::File::open(&path).unwrap(), Default::default())
                .unwrap();
        assert_eq!(&dump.parameters, rg.parameters());
        assert_eq!(dump.map.len(), 8);
        assert!(dump.map.iter().all(|row| row.len() == 12));
        assert_eq!(dump.map[3][5], rg.map()[(3, 5)]);
        fs::remove_file(&path).unwrap();
    }
}
