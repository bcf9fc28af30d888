/// Maximum number of points projected in one batch when locating picks.
pub const PROJECTION_CHUNK_SIZE: usize = 10_000;

/// Absolute density difference below which a point joins the picked neighbourhood.
pub const DENSITY_MATCH_THRESHOLD: f64 = 1e-6;

/// Screen-space radius for the single point pick tool.
pub const POINT_PICK_RADIUS: f64 = 5.0;

/// Number of spatial dimensions the density estimate is fitted over.
pub const DENSITY_DIMENSIONS: usize = 3;
