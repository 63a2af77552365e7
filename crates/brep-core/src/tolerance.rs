/// User-facing tessellation tolerance knobs and their per-entity resolution.

/// Smallest distance the resolver will ever produce (in model units).
pub const DIST_FLOOR: f64 = 1e-7;

/// Distance below which a point is considered to lie exactly on an entity.
pub const ON_ZERO_TOLERANCE: f64 = 1e-9;

/// Caller-supplied tessellation tolerances.
///
/// A value of zero (or less) disables the corresponding constraint.
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
pub struct MeshTolerance {
    /// Absolute chord-deviation tolerance (in model units)
    pub absolute: f64,
    /// Deviation tolerance relative to local feature size
    pub relative: f64,
    /// Maximum normal/tangent deviation angle (in radians)
    pub normal_angle: f64,
}

impl MeshTolerance {
    pub fn new(absolute: f64, relative: f64, normal_angle: f64) -> Self {
        Self {
            absolute,
            relative,
            normal_angle,
        }
    }

    /// Absolute-only tolerance, no relative or angular constraint.
    pub fn from_absolute(absolute: f64) -> Self {
        Self {
            absolute,
            relative: 0.0,
            normal_angle: 0.0,
        }
    }

    /// Resolve the knobs against a local feature size (edge chord length, loop
    /// median segment length, or surface bounding-box diagonal) into concrete
    /// per-entity thresholds. Pure; called per edge and per face.
    pub fn resolve(&self, feature_size: f64) -> ResolvedTolerance {
        let min_dist = self.absolute.max(DIST_FLOOR);
        let mut max_dist = feature_size.max(min_dist);

        let within_dist = if self.relative > 0.0 {
            let within = (self.relative * feature_size).max(min_dist);
            max_dist = max_dist.max(10.0 * within);
            within
        } else {
            (0.01 * feature_size).max(min_dist)
        };

        // An exact 0.0 (cos of 90 deg) disables the angular constraint
        let cos_within_angle = if self.normal_angle > 0.0 {
            self.normal_angle.cos()
        } else {
            0.0
        };

        ResolvedTolerance {
            min_dist,
            max_dist,
            within_dist,
            cos_within_angle,
        }
    }
}

impl Default for MeshTolerance {
    fn default() -> Self {
        Self {
            absolute: 0.0,
            relative: 0.01,
            normal_angle: 0.0,
        }
    }
}

/// Concrete per-entity thresholds produced by [`MeshTolerance::resolve`].
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
pub struct ResolvedTolerance {
    /// Segments shorter than this are never split further
    pub min_dist: f64,
    /// Maximum allowed segment chord length
    pub max_dist: f64,
    /// Maximum allowed chord deviation from the true curve/surface
    pub within_dist: f64,
    /// Cosine of the maximum normal/tangent deviation angle
    pub cos_within_angle: f64,
}

impl ResolvedTolerance {
    /// Whether two unit vectors stay within the angular constraint.
    pub fn within_angle(&self, cos_between: f64) -> bool {
        cos_between >= self.cos_within_angle
    }
}
