//! Component height estimates for clearance checks
//!
//! Heights are point estimates: each known tall component is an obstacle
//! at a pad position, and the height at a query point is the tallest
//! obstacle within a fixed radius.

use pastekit_core::{Pad, Point2D};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Default proximity radius for height lookups (mm)
pub const DEFAULT_OBSTACLE_RADIUS: f64 = 2.0;

/// A positioned component height
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: String,
    pub position: Point2D,
    pub height: f64,
}

/// Point-estimate height map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentHeightMap {
    obstacles: Vec<Obstacle>,
    radius: f64,
}

impl Default for ComponentHeightMap {
    fn default() -> Self {
        Self::new(DEFAULT_OBSTACLE_RADIUS)
    }
}

impl ComponentHeightMap {
    pub fn new(radius: f64) -> Self {
        Self {
            obstacles: Vec::new(),
            radius,
        }
    }

    /// Build from `pad id -> height` entries, resolving ids against `pads`.
    ///
    /// Ids that match no pad are logged and ignored.
    pub fn from_pad_heights<'a>(
        pads: &[Pad],
        heights: impl IntoIterator<Item = (&'a str, f64)>,
        radius: f64,
    ) -> Self {
        let by_id: HashMap<&str, &Pad> = pads.iter().map(|p| (p.id.as_str(), p)).collect();
        let mut map = Self::new(radius);
        for (id, height) in heights {
            match by_id.get(id) {
                Some(pad) => map.insert(id, pad.position(), height),
                None => warn!("Height given for unknown pad '{}', ignoring", id),
            }
        }
        debug!("Height map holds {} obstacles", map.obstacles.len());
        map
    }

    pub fn insert(&mut self, id: impl Into<String>, position: Point2D, height: f64) {
        self.obstacles.push(Obstacle {
            id: id.into(),
            position,
            height,
        });
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn is_empty(&self) -> bool {
        self.obstacles.is_empty()
    }

    /// Tallest obstacle within the radius of `p`, 0 when none
    pub fn height_at(&self, p: &Point2D) -> f64 {
        self.obstacles
            .iter()
            .filter(|o| o.position.distance_to(p) <= self.radius)
            .map(|o| o.height)
            .fold(0.0, f64::max)
    }

    /// Tallest obstacle anywhere on the board, 0 when empty
    pub fn max_height(&self) -> f64 {
        self.obstacles.iter().map(|o| o.height).fold(0.0, f64::max)
    }

    /// Highest sampled height on the straight path `from -> to`.
    ///
    /// Samples every `step` mm with both endpoints included.
    pub fn max_along(&self, from: &Point2D, to: &Point2D, step: f64) -> f64 {
        if self.obstacles.is_empty() {
            return 0.0;
        }
        let length = from.distance_to(to);
        let segments = if step > 0.0 {
            (length / step).ceil().max(1.0) as usize
        } else {
            1
        };
        (0..=segments)
            .map(|i| from.lerp(to, i as f64 / segments as f64))
            .map(|p| self.height_at(&p))
            .fold(0.0, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pastekit_core::{PadShape, PadSource};

    fn pad(id: &str, x: f64, y: f64) -> Pad {
        Pad::new(id, x, y, 1.0, 1.0, PadShape::Rect, PadSource::Structural)
    }

    #[test]
    fn test_height_lookup_radius() {
        let mut map = ComponentHeightMap::default();
        map.insert("U1", Point2D::new(10.0, 10.0), 5.0);
        map.insert("C1", Point2D::new(11.0, 10.0), 2.0);

        assert_eq!(map.height_at(&Point2D::new(10.0, 11.5)), 5.0);
        assert_eq!(map.height_at(&Point2D::new(12.5, 10.0)), 2.0);
        assert_eq!(map.height_at(&Point2D::new(20.0, 20.0)), 0.0);
        assert_eq!(map.max_height(), 5.0);
    }

    #[test]
    fn test_from_pad_heights_ignores_unknown_ids() {
        let pads = vec![pad("S1", 0.0, 0.0), pad("S2", 5.0, 0.0)];
        let map = ComponentHeightMap::from_pad_heights(
            &pads,
            [("S2", 4.0), ("S9", 8.0)],
            DEFAULT_OBSTACLE_RADIUS,
        );
        assert_eq!(map.obstacles().len(), 1);
        assert_eq!(map.obstacles()[0].position, Point2D::new(5.0, 0.0));
        assert_eq!(map.max_height(), 4.0);
    }

    #[test]
    fn test_max_along_samples_path() {
        let mut map = ComponentHeightMap::default();
        map.insert("U1", Point2D::new(5.0, 1.5), 6.0);

        let from = Point2D::new(0.0, 0.0);
        let to = Point2D::new(10.0, 0.0);
        assert_eq!(map.max_along(&from, &to, 0.5), 6.0);
        assert_eq!(map.max_along(&from, &Point2D::new(0.0, -10.0), 0.5), 0.0);
        // A zero-length path still checks its endpoint.
        let on_top = Point2D::new(5.0, 1.5);
        assert_eq!(map.max_along(&on_top, &on_top, 0.5), 6.0);
    }
}
