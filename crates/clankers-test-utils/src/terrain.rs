//! Analytic terrain maps.

use clankers_preview::TerrainMap;
use nalgebra::Vector2;

/// Inclined plane `z = height + slope · (x, y)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlaneTerrain {
    pub height: f64,
    pub slope: Vector2<f64>,
}

impl PlaneTerrain {
    /// Horizontal ground at `height`.
    pub fn flat(height: f64) -> Self {
        Self {
            height,
            slope: Vector2::zeros(),
        }
    }

    pub fn inclined(height: f64, slope: Vector2<f64>) -> Self {
        Self { height, slope }
    }
}

impl TerrainMap for PlaneTerrain {
    fn has_elevation_data(&self) -> bool {
        true
    }

    fn elevation_at(&self, position: &Vector2<f64>) -> f64 {
        self.height + self.slope.dot(position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn inclined_plane_elevation() {
        let plane = PlaneTerrain::inclined(0.1, Vector2::new(0.5, 0.0));
        assert!(plane.has_elevation_data());
        assert_relative_eq!(plane.elevation_at(&Vector2::new(0.2, 3.0)), 0.2);
        assert_relative_eq!(PlaneTerrain::flat(-0.05).elevation_at(&Vector2::new(1.0, 1.0)), -0.05);
    }
}
