/// LAS/LAZ loading into an in-memory layer
use crate::bounds::CloudBounds;
use indicatif::{ProgressBar, ProgressStyle};
use las::Reader;
use point_cloud_autoseg::segmentation::{LayerId, MemoryLayer};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Handles both .las and .laz compressed formats.
pub fn create_reader(file_path: &Path) -> Result<Reader, Box<dyn std::error::Error>> {
    let file = File::open(file_path)?;
    let buf_reader = BufReader::new(file);
    Ok(Reader::new(buf_reader)?)
}

pub fn log_file_info(file_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let reader = create_reader(file_path)?;
    let header = reader.header();

    println!("LAS/LAZ File Information:");
    println!("  File: {}", file_path.display());
    println!(
        "  Version: {}.{}",
        header.version().major,
        header.version().minor
    );
    println!("  Points: {}", header.number_of_points());
    println!("  Point format: {:?}", header.point_format().to_u8());
    Ok(())
}

/// Reads every point into a layer with `x`, `y`, `z`, `intensity` and
/// `classification` attributes.
pub fn load_layer(file_path: &Path) -> Result<(MemoryLayer, CloudBounds), Box<dyn std::error::Error>> {
    let mut reader = create_reader(file_path)?;
    let total_points = reader.header().number_of_points() as usize;

    let pb = ProgressBar::new(total_points as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{bar:40.cyan/blue}] {pos}/{len} points ({percent}%) {msg}")?
            .progress_chars("▉▊▋▌▍▎▏ "),
    );
    pb.set_message("Loading points");

    let mut x = Vec::with_capacity(total_points);
    let mut y = Vec::with_capacity(total_points);
    let mut z = Vec::with_capacity(total_points);
    let mut intensity = Vec::with_capacity(total_points);
    let mut classification = Vec::with_capacity(total_points);

    for (idx, point_result) in reader.points().enumerate() {
        let point = point_result?;
        x.push(point.x);
        y.push(point.y);
        z.push(point.z);
        intensity.push(point.intensity as f64);
        classification.push(u8::from(point.classification) as f64);

        if idx % 50_000 == 0 {
            pb.set_position(idx as u64);
        }
    }
    pb.finish_with_message("Points loaded");

    let bounds = CloudBounds::from_columns(&x, &y, &z);

    let name = file_path
        .file_stem()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string();
    let mut layer = MemoryLayer::new(LayerId(0), &name);
    layer.add_attribute("x", x);
    layer.add_attribute("y", y);
    layer.add_attribute("z", z);
    layer.add_attribute("intensity", intensity);
    layer.add_attribute("classification", classification);

    Ok((layer, bounds))
}
