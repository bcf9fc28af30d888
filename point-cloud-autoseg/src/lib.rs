//! Projected point selection and auto-segmentation for 3D point clouds.
//!
//! Two tools share this crate: a density based pick tool that grows a
//! selection around the point under the cursor, and an auto-segmentation
//! tool that clusters a layer's attributes and writes the result back as a
//! label component plus one coloured subset per cluster.
//!
//! ## Selection Architecture
//!
//! ```text
//! press(x, y)
//!   └─> DensitySelection (Unarmed | Armed | Stale)
//!       ├─> Unarmed/Stale: read axes, fit DensityModel -> Armed
//!       ├─> Armed: move cursor only, reuse model
//!       └─> DensityRoi::contains()
//!           ├─> locate() nearest projected point (chunked, rayon)
//!           └─> |density(p) - density(nearest)| < DENSITY_MATCH_THRESHOLD
//! ```
//!
//! Attribute change notifications only invalidate the fitted model; the refit
//! happens lazily on the next press.
//!
//! ## Segmentation Architecture
//!
//! ```text
//! SegmentationConfig
//!   └─> MethodRegistry::get(method)
//!       └─> MethodDescriptor::validate(params)   (ParameterError, no mutation)
//!           └─> fit(AttributeMatrix) -> ClusterLabeling
//!               └─> MaterializePlan (labels, subset count, colours)
//!                   └─> LayerRepository: component -> facet -> colorize
//! ```
//!
//! Every fallible step runs before the first write to the layer, so a failed
//! run leaves the layer untouched.
//!
//! ## Non-finite rows
//!
//! Rows with a non-finite coordinate never take part in a fit, are never
//! located as the nearest point, are always `false` in selection masks and
//! always carry the noise label after segmentation.

/// Point cloud columns and finite-row bookkeeping.
pub mod cloud;

/// Cancellation flag and progress bar shared with long running fits.
pub mod control;

/// Serde configuration for the selection and segmentation tools.
pub mod config;

/// Error types shared by both tools.
pub mod error;

/// Projected selection: projection, nearest point lookup, density ROI and
/// the gesture state machine with its bevy plugin.
pub mod selection;

/// Auto-segmentation: parameter model, method registry, clustering backends
/// and layer materialisation.
pub mod segmentation;

pub use bevy::color::Srgba;
pub use bevy::math::{DVec2, DVec3};
pub use cloud::PointCloud;
pub use config::{SegmentationConfig, SelectionConfig};
pub use error::{ParameterError, SegmentationError, SelectionError};
