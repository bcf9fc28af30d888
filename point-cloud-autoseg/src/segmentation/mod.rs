pub mod colormap;
pub mod dbscan;
pub mod labels;
pub mod layer;
pub mod matrix;
pub mod memory;
pub mod neighbors;
pub mod optics;
pub mod params;
pub mod pipeline;
pub mod registry;

pub use colormap::Colormap;
pub use labels::ClusterLabeling;
pub use layer::{
    AttributeSource, Colorizer, ComponentId, ComponentSink, LayerEntry, LayerId, LayerKind,
    LayerRepository, RendererKind, SubsetId, SubsetSink, resolve_target_layer,
};
pub use matrix::AttributeMatrix;
pub use memory::MemoryLayer;
pub use params::{ParameterKind, ParameterSpec, ParameterValue, ParameterValues};
pub use pipeline::{AutoSegmenter, MaterializePlan, SegmentationReport, materialize, segment};
pub use registry::{FitFn, MethodDescriptor, MethodRegistry};
