//! Region histogram tool for choosing clip bounds
//!
//! Histograms the raw samples inside a rectangle of one slice, prints the bin
//! counts, and writes two plots:
//!
//! - `histogram.png`: bar chart of the counts
//! - `region.png`: 8-bit preview of the slice with the region outlined in red
//!
//! # Usage
//!
//! ```bash
//! cargo run --release --bin region_histogram -- --image 02000.tif --region 3100,400,3250,550
//! cargo run --release --bin region_histogram -- --image 02000.tif --bins 50 --range-min 10000
//! ```

use std::path::{Path, PathBuf};

use clap::Parser;
use image::{Rgb, RgbImage};
use log::info;
use plotters::prelude::*;
use scanmask::analysis::{region_histogram, Histogram, Region};
use scanmask::image_proc::normalize::normalize;
use scanmask::io::load_image;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Slice to analyze
    #[arg(short, long, default_value = "02000.tif")]
    image: PathBuf,

    #[arg(
        short,
        long,
        default_value = "3100,400,3250,550",
        help = "Region as \"x_min,y_min,x_max,y_max\"",
        long_help = "Half-open pixel rectangle to histogram. x runs along columns and y \
            along rows. Bounds beyond the image are clipped."
    )]
    region: Region,

    /// Number of histogram bins
    #[arg(short, long, default_value_t = 100)]
    bins: usize,

    /// Lower edge of the first bin
    #[arg(long, default_value_t = 0.0)]
    range_min: f64,

    /// Upper edge of the last bin
    #[arg(long, default_value_t = 65535.0)]
    range_max: f64,

    /// Directory for histogram.png and region.png
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let image = load_image(&args.image)?;
    let (rows, cols) = image.dim();
    info!("Loaded {} ({}x{})", args.image.display(), cols, rows);

    let hist = region_histogram(
        image.view(),
        &args.region,
        args.bins,
        (args.range_min, args.range_max),
    )?;

    println!("Region {} ({} samples in range)", args.region, hist.total());
    println!("{:>10} {:>10} {:>10}", "from", "to", "count");
    for (lo, hi, count) in hist.bins() {
        println!("{lo:>10.1} {hi:>10.1} {count:>10}");
    }

    std::fs::create_dir_all(&args.output_dir)?;

    let histogram_path = args.output_dir.join("histogram.png");
    plot_histogram(&hist, &args.region, &histogram_path)?;
    println!("Histogram saved to {}", histogram_path.display());

    let preview = normalize(image.view(), 0.0, 65535.0, true)?;
    let mut region_img = RgbImage::from_fn(cols as u32, rows as u32, |x, y| {
        let v = preview[[y as usize, x as usize]];
        Rgb([v, v, v])
    });
    outline_region(&mut region_img, &args.region.clipped((rows, cols)), 2);
    let region_path = args.output_dir.join("region.png");
    region_img.save(&region_path)?;
    println!("Region preview saved to {}", region_path.display());

    Ok(())
}

/// Draw a red rectangle of the given line thickness just inside `region`.
fn outline_region(img: &mut RgbImage, region: &Region, thickness: usize) {
    let red = Rgb([255, 0, 0]);
    for y in region.y_min..region.y_max {
        for x in region.x_min..region.x_max {
            let on_edge = y < region.y_min + thickness
                || y + thickness >= region.y_max
                || x < region.x_min + thickness
                || x + thickness >= region.x_max;
            if on_edge {
                img.put_pixel(x as u32, y as u32, red);
            }
        }
    }
}

fn plot_histogram(
    hist: &Histogram,
    region: &Region,
    path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let x_min = hist.edges.first().copied().unwrap_or(0.0);
    let x_max = hist.edges.last().copied().unwrap_or(1.0);
    let y_max = hist.counts.iter().copied().max().unwrap_or(0).max(1) as f64 * 1.05;

    let root = BitMapBackend::new(path, (1200, 800)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(
            format!("Sample histogram of region {region}"),
            ("sans-serif", 28).into_font().color(&BLACK),
        )
        .margin(15)
        .x_label_area_size(50)
        .y_label_area_size(80)
        .build_cartesian_2d(x_min..x_max, 0.0..y_max)?;

    chart
        .configure_mesh()
        .x_desc("Raw sample value")
        .y_desc("Pixel count")
        .axis_desc_style(("sans-serif", 20))
        .label_style(("sans-serif", 16))
        .draw()?;

    chart.draw_series(hist.bins().map(|(lo, hi, count)| {
        Rectangle::new([(lo, 0.0), (hi, count as f64)], BLUE.mix(0.7).filled())
    }))?;

    root.present()?;
    Ok(())
}
