use clap::Parser;
use ronchigram::{Aberrations, Colormap, Heatmap, RonchigramBuilder};
use std::{path::PathBuf, time::Instant};

#[derive(Debug, Parser)]
#[command(name = "ronchigram")]
#[command(about = "Ronchigram of an optical system with third order aberrations")]
struct Args {
    /// Exit pupil radius
    #[arg(short = 'a', long, default_value_t = 25.)]
    pupil_radius: f64,
    /// Focal length of the system under test
    #[arg(short, long, default_value_t = 200.)]
    focal_length: f64,
    /// Ronchi ruling band width
    #[arg(short = 'd', long, default_value_t = 0.1)]
    ruling_period: f64,
    /// Offset from the focal point along the optical axis
    #[arg(short = 'z', long, default_value_t = -30., allow_hyphen_values = true)]
    focal_offset: f64,
    /// Ronchi ruling orientation [deg]
    #[arg(long, default_value_t = 0., allow_hyphen_values = true)]
    angle: f64,
    /// Spherical aberration coefficient
    #[arg(long, default_value_t = 0., allow_hyphen_values = true)]
    spherical: f64,
    /// Coma coefficient
    #[arg(long, default_value_t = 0., allow_hyphen_values = true)]
    coma: f64,
    /// Astigmatism coefficient
    #[arg(long, default_value_t = 0., allow_hyphen_values = true)]
    astigmatism: f64,
    /// Defocus coefficient
    #[arg(long, default_value_t = 5e-4, allow_hyphen_values = true)]
    defocus: f64,
    /// Ronchigram width in pixels
    #[arg(short, long, default_value_t = 200)]
    n: usize,
    /// Ronchigram height in pixels [default: width]
    #[arg(short, long)]
    m: Option<usize>,
    /// Invert the ronchi ruling
    #[arg(long)]
    negative: bool,
    /// Ronchi ruling scaling factor
    #[arg(long, default_value_t = 1.)]
    ruling_scale: f64,
    /// Ronchi ruling offset
    #[arg(long, default_value_t = 0., allow_hyphen_values = true)]
    ruling_offset: f64,
    /// Color map: viridis, plasma, greys or cubehelix
    #[arg(long, default_value = "viridis")]
    colormap: Colormap,
    /// Ronchigram image file
    #[arg(short, long, default_value = "ronchigram.png")]
    output: PathBuf,
    /// Save the ronchigram into a numpy file
    #[arg(long)]
    npy: Option<PathBuf>,
    /// Save the parameters and the ronchigram into a pickle file
    #[arg(long)]
    pickle: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let aberrations = Aberrations::new(
        args.spherical,
        args.coma,
        args.astigmatism,
        args.defocus,
    );
    println!("Aberrations: {}", aberrations);

    let now = Instant::now();
    let rg = RonchigramBuilder::new(
        args.pupil_radius,
        args.focal_length,
        args.ruling_period,
        args.focal_offset,
    )
    .ruling_angle(args.angle)
    .aberrations(aberrations)
    .size(args.n, args.m.unwrap_or(args.n))
    .negative(args.negative)
    .ruling_scale(args.ruling_scale)
    .ruling_offset(args.ruling_offset)
    .build()?;
    let (m, n) = rg.shape();
    println!("Ronchigram {}x{} computed in {}ms", n, m, now.elapsed().as_millis());
    println!(
        " - magnification: {:.3}, ruling pitch: {}px",
        rg.parameters().magnification(),
        rg.parameters().ruling_pitch()
    );
    match rg.value_range() {
        Some((lo, up)) => println!(" - value range: [{:.3},{:.3}]", lo, up),
        None => println!(" - no finite sample"),
    }
    println!(" - # of NaN samples: {}", rg.nan_count());

    Heatmap::default()
        .colormap(args.colormap)
        .draw(rg.map(), &args.output)?;
    println!("Ronchigram saved to {:?}", args.output);

    if let Some(path) = args.npy {
        rg.to_npy(path)?;
    }
    if let Some(path) = args.pickle {
        rg.dump(path)?;
    }

    Ok(())
}
