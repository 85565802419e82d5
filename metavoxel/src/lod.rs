//! Level-of-detail policy.

/// Level of detail relative to a viewer position.
///
/// A cell is subdivided when its size is at least its distance to the
/// viewer scaled by `threshold`. A threshold of zero subdivides everything.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MetavoxelLod {
    pub position: [f32; 3],
    pub threshold: f32,
}

impl MetavoxelLod {
    #[must_use]
    pub const fn new(position: [f32; 3], threshold: f32) -> Self {
        Self {
            position,
            threshold,
        }
    }

    /// Returns `true` if a cell at `minimum` with edge length `size` should
    /// be subdivided.
    #[must_use]
    pub fn should_subdivide(&self, minimum: [f32; 3], size: f32) -> bool {
        let half = size * 0.5;
        let distance_sq: f32 = (0..3)
            .map(|axis| {
                let delta = minimum[axis] + half - self.position[axis];
                delta * delta
            })
            .sum();
        size >= distance_sq.sqrt() * self.threshold
    }
}
