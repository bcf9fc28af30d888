/// Error types for selection and segmentation
use crate::segmentation::layer::LayerId;
use crate::segmentation::params::ParameterKind;

pub type SelectionResult<T> = std::result::Result<T, SelectionError>;
pub type Result<T> = std::result::Result<T, SegmentationError>;

/// Failures on the interactive selection path.
///
/// None of these abort the interaction loop: a gesture that hits one simply
/// selects nothing.
#[derive(Debug, thiserror::Error)]
pub enum SelectionError {
    #[error("no finite point available to select")]
    EmptySelection,

    #[error("density model could not be fitted: {0}")]
    DensityFit(String),

    #[error("projection is degenerate (w = 0) for every candidate point")]
    ProjectionDegenerate,

    #[error("attribute '{0}' is not available on the selected layer")]
    AttributeMissing(String),

    #[error("axis column has {found} rows, expected {expected}")]
    ColumnLengthMismatch { expected: usize, found: usize },

    #[error("selection was cancelled")]
    Cancelled,
}

/// Parameter coercion and validation failures, reported back to the
/// parameter entry form before any clustering runs.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParameterError {
    #[error("unknown segmentation method '{0}'")]
    UnknownMethod(String),

    #[error("method '{method}' has no parameter '{name}'")]
    UnknownParameter { method: String, name: String },

    #[error("parameter '{name}' expects {expected} but got {found}")]
    TypeMismatch {
        name: String,
        expected: ParameterKind,
        found: String,
    },

    #[error("parameter '{name}' is out of range: {reason}")]
    OutOfRange { name: String, reason: String },
}

/// Failures of an auto-segmentation run. A run that returns any of these has
/// not touched the target layer.
#[derive(Debug, thiserror::Error)]
pub enum SegmentationError {
    #[error(transparent)]
    Parameter(#[from] ParameterError),

    #[error("no base data layer with a 3D scatter renderer is available")]
    NoEligibleLayer,

    #[error("attribute '{attribute}' is missing on layer {layer}")]
    AttributeMissing { layer: LayerId, attribute: String },

    #[error("attribute column has {found} rows, expected {expected}")]
    ColumnLengthMismatch { expected: usize, found: usize },

    #[error("layer {0} refused the label component")]
    ComponentRejected(LayerId),

    #[error("segmentation was cancelled")]
    Cancelled,
}
