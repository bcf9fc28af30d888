pub mod density;
pub mod locate;
pub mod nearest;
pub mod plugin;
pub mod projection;
pub mod roi;
pub mod state;

pub use density::DensityModel;
pub use locate::{Located, locate};
pub use nearest::NearestPointRoi;
pub use plugin::{
    DensitySelectionPlugin, DensitySelectionTool, SelectionApplied, SelectionLayer, SelectionMove,
    SelectionPress, SelectionRelease, ViewProjection,
};
pub use projection::{ProjectionMatrix, project};
pub use roi::DensityRoi;
pub use state::{AttributeChanged, DensitySelection, GestureOutcome, SelectionState, SelectionTarget};
