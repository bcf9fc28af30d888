/// Narrow interfaces onto the host's data layers
use crate::error::{Result, SegmentationError};
use bevy::color::Srgba;
use bevy::log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Host identifier of a data layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerId(pub u32);

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Handle to a component (column) owned by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentId(pub usize);

/// Handle to a subset owned by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubsetId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    /// Base data layer holding the columns.
    Data,
    /// Filtered view of a data layer.
    Subset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RendererKind {
    Scatter3d,
    Other,
}

/// One entry of the host's layer list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerEntry {
    pub id: LayerId,
    pub kind: LayerKind,
    pub renderer: RendererKind,
}

/// Picks the layer an auto-segmentation run writes to.
///
/// A base data layer is used as is. When the active layer is a subset (or
/// nothing is active) the first data layer drawn by a 3D scatter renderer is
/// used instead.
pub fn resolve_target_layer(active: Option<&LayerEntry>, layers: &[LayerEntry]) -> Result<LayerId> {
    if let Some(entry) = active.filter(|e| e.kind == LayerKind::Data) {
        return Ok(entry.id);
    }
    let fallback = layers
        .iter()
        .find(|e| e.kind == LayerKind::Data && e.renderer == RendererKind::Scatter3d)
        .map(|e| e.id)
        .ok_or(SegmentationError::NoEligibleLayer)?;
    debug!("Active layer is not a data layer, segmenting layer {} instead", fallback);
    Ok(fallback)
}

/// Read-only numeric columns, row aligned per layer.
pub trait AttributeSource {
    fn attribute(&self, layer: LayerId, name: &str) -> Option<&[f64]>;
}

pub trait ComponentSink {
    fn component_names(&self, layer: LayerId) -> Vec<String>;

    fn component_id(&self, layer: LayerId, name: &str) -> Option<ComponentId>;

    /// `None` when `layer` is not hosted by this sink; nothing is written.
    fn add_component(
        &mut self,
        layer: LayerId,
        name: &str,
        values: Vec<i64>,
    ) -> Option<ComponentId>;

    /// Overwrites values in place; external references to `id` stay valid.
    fn update_component(&mut self, id: ComponentId, values: Vec<i64>);
}

pub trait SubsetSink {
    /// Returns one subset per label in `[0, step_count)` in label order,
    /// reusing subsets with matching criteria and dropping those for labels
    /// outside the range.
    fn facet(&mut self, layer: LayerId, component: &str, step_count: usize) -> Vec<SubsetId>;
}

pub trait Colorizer {
    fn colorize(&mut self, subsets: &[SubsetId], colors: &[Srgba]);
}

/// Everything a segmentation run reads from and writes to.
pub trait LayerRepository: AttributeSource + ComponentSink + SubsetSink + Colorizer {
    fn layers(&self) -> Vec<LayerEntry>;

    fn active_layer(&self) -> Option<LayerEntry>;

    fn row_count(&self, layer: LayerId) -> Option<usize>;
}
