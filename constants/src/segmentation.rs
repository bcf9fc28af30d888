/// Component the auto-segmentation labels are written into.
pub const AUTOSEG_COMPONENT_NAME: &str = "_autoseg_labels";

/// Label reserved for points that belong to no cluster.
pub const NOISE_LABEL: i64 = -1;

/// Attribute columns stacked into the clustering matrix by default.
pub const DEFAULT_AXES: [&str; 3] = ["x", "y", "z"];

/// Clustering method used when none is configured.
pub const DEFAULT_METHOD: &str = "dbscan";

/// DBSCAN neighbourhood radius default.
pub const DBSCAN_EPS: f64 = 2.5;

/// DBSCAN neighbour count (including the point itself) for a core point.
pub const DBSCAN_MIN_SAMPLES: i64 = 2;

/// OPTICS defaults: neighbour count, search radius, extraction radius.
pub const OPTICS_MIN_SAMPLES: i64 = 5;
pub const OPTICS_MAX_EPS: f64 = f64::INFINITY;
pub const OPTICS_EPS: f64 = 0.5;
