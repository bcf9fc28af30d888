/// Auto-segments a LAS/LAZ point cloud and writes a segment summary
mod bounds;
mod loader;
mod report;

use indicatif::{ProgressBar, ProgressStyle};
use point_cloud_autoseg::SegmentationConfig;
use point_cloud_autoseg::control::FitControl;
use point_cloud_autoseg::segmentation::AutoSegmenter;
use std::env;
use std::path::Path;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 || args.len() > 3 {
        eprintln!("Usage: {} <input.las|laz> [config.json]", args[0]);
        std::process::exit(1);
    }

    let input_path = Path::new(&args[1]);
    let config = match args.get(2) {
        Some(path) => SegmentationConfig::load(Path::new(path))?,
        None => SegmentationConfig::default(),
    };

    loader::log_file_info(input_path)?;
    let (mut layer, bounds) = loader::load_layer(input_path)?;
    bounds.print();

    let progress = ProgressBar::new(0);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("[{bar:40.magenta/blue}] {pos}/{len} rows ({percent}%) {msg}")?
            .progress_chars("▉▊▋▌▍▎▏ "),
    );

    println!(
        "Segmenting {} points with '{}' over [{}]...",
        layer.len(),
        config.method,
        config.axes.join(", ")
    );
    let segmenter = AutoSegmenter::default().with_control(FitControl::with_progress(progress));
    let result = segmenter.run(&mut layer, &config)?;

    let output_stem = args[1].trim_end_matches(".laz").trim_end_matches(".las");
    let output_path = format!("{}_segments.json", output_stem);
    let summary = report::SegmentsReport::new(input_path, &config, &layer, bounds, &result);
    summary.write(Path::new(&output_path))?;
    summary.print();

    Ok(())
}
