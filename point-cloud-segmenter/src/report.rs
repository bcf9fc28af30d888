/// Segment summary written next to the input cloud
use crate::bounds::CloudBounds;
use point_cloud_autoseg::SegmentationConfig;
use point_cloud_autoseg::segmentation::{MemoryLayer, SegmentationReport};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct SubsetSummary {
    pub label: String,
    pub value: usize,
    pub point_count: usize,
    /// `#RRGGBB`
    pub colour: String,
}

#[derive(Debug, Serialize)]
pub struct SegmentsReport {
    pub input: String,
    pub layer: String,
    /// Attribute columns loaded from the file.
    pub attributes: Vec<String>,
    pub point_count: usize,
    pub bounds: CloudBounds,
    pub method: String,
    pub params: Map<String, Value>,
    pub axes: Vec<String>,
    pub component_name: String,
    pub colormap: String,
    pub reversed: bool,
    pub subset_count: usize,
    pub noise_count: usize,
    pub subsets: Vec<SubsetSummary>,
}

impl SegmentsReport {
    pub fn new(
        input: &Path,
        config: &SegmentationConfig,
        layer: &MemoryLayer,
        bounds: CloudBounds,
        result: &SegmentationReport,
    ) -> Self {
        let subsets = result
            .subsets
            .iter()
            .zip(&result.sizes)
            .zip(&result.colors)
            .enumerate()
            .map(|(value, ((id, size), colour))| SubsetSummary {
                label: layer
                    .subset(*id)
                    .map(|s| s.label.clone())
                    .unwrap_or_else(|| format!("{} == {}", config.component_name, value)),
                value,
                point_count: *size,
                colour: colour.clone(),
            })
            .collect();

        Self {
            input: input.display().to_string(),
            layer: layer.name().to_string(),
            attributes: layer.attribute_names().map(str::to_string).collect(),
            point_count: result.rows,
            bounds,
            method: result.method.clone(),
            params: config.params.clone(),
            axes: config.axes.clone(),
            component_name: config.component_name.clone(),
            colormap: config.colormap.to_string(),
            reversed: config.reversed,
            subset_count: result.subset_count,
            noise_count: result.noise_count,
            subsets,
        }
    }

    pub fn write(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        println!("Generated segment summary: {}", path.display());
        Ok(())
    }

    pub fn print(&self) {
        println!("Segmentation Summary:");
        println!("  Layer: {} [{}]", self.layer, self.attributes.join(", "));
        println!("  Points: {}", self.point_count);
        println!("  Method: {}", self.method);
        println!("  Subsets: {}", self.subset_count);
        println!("  Noise points: {}", self.noise_count);
        for subset in &self.subsets {
            println!(
                "    {} -> {} points ({})",
                subset.label, subset.point_count, subset.colour
            );
        }
    }
}
