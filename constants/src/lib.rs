/// Shared defaults for projected selection and auto-segmentation
pub mod segmentation;
pub mod selection;
