//! Terrain geometry consumed by the simulation.
//!
//! Terrain is an ordered polyline of ground points with a flagged landing
//! zone. It is validated once at construction and read-only afterwards.

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// A single ground vertex. `is_flag` marks landing-zone endpoints.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TerrainPoint {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub is_flag: bool,
}

/// The band where a soft touchdown counts as a landing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LandingZone {
    pub x_min: f64,
    pub x_max: f64,
    /// Ground height across the zone.
    pub y: f64,
}

impl LandingZone {
    /// Whether a horizontal position falls inside the zone band.
    pub fn contains(&self, x: f64) -> bool {
        x >= self.x_min && x <= self.x_max
    }
}

/// Validated ground polyline with a landing zone.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "Vec<TerrainPoint>", into = "Vec<TerrainPoint>")]
pub struct Terrain {
    points: Vec<TerrainPoint>,
}

impl Terrain {
    /// Build terrain from ground points.
    ///
    /// Requires at least two points, strictly ascending x, and a pair of
    /// consecutive flagged points delimiting the landing zone. Without the
    /// zone there is no way to classify a touchdown, so this is rejected
    /// up front rather than discovered mid-run.
    pub fn new(points: Vec<TerrainPoint>) -> Result<Self, ConfigError> {
        if points.len() < 2 {
            return Err(ConfigError::TerrainTooShort(points.len()));
        }
        for pair in points.windows(2) {
            if pair[1].x <= pair[0].x {
                return Err(ConfigError::TerrainNotAscending { x: pair[1].x });
            }
        }
        let terrain = Self { points };
        if terrain.find_landing_zone().is_none() {
            return Err(ConfigError::MissingLandingZone);
        }
        Ok(terrain)
    }

    /// A flat floor with a centered landing zone; used by tests and the
    /// example configuration.
    pub fn flat(width: f64, ground_y: f64, zone_x_min: f64, zone_x_max: f64) -> Self {
        let points = vec![
            TerrainPoint {
                x: 0.0,
                y: ground_y,
                is_flag: false,
            },
            TerrainPoint {
                x: zone_x_min,
                y: ground_y,
                is_flag: true,
            },
            TerrainPoint {
                x: zone_x_max,
                y: ground_y,
                is_flag: true,
            },
            TerrainPoint {
                x: width,
                y: ground_y,
                is_flag: false,
            },
        ];
        Self::new(points).expect("flat terrain is always valid")
    }

    pub fn points(&self) -> &[TerrainPoint] {
        &self.points
    }

    /// Ground height under `x`, linearly interpolated on the containing
    /// segment. Positions outside the polyline clamp to the end heights.
    pub fn height_at(&self, x: f64) -> f64 {
        let first = &self.points[0];
        if x <= first.x {
            return first.y;
        }
        for pair in self.points.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            if x >= a.x && x <= b.x {
                let t = (x - a.x) / (b.x - a.x);
                return a.y + (b.y - a.y) * t;
            }
        }
        self.points[self.points.len() - 1].y
    }

    /// The landing zone delimited by the first pair of consecutive flagged
    /// points. Validation guarantees it exists.
    pub fn landing_zone(&self) -> LandingZone {
        self.find_landing_zone()
            .expect("validated terrain has a landing zone")
    }

    fn find_landing_zone(&self) -> Option<LandingZone> {
        self.points.windows(2).find_map(|pair| {
            (pair[0].is_flag && pair[1].is_flag).then(|| LandingZone {
                x_min: pair[0].x,
                x_max: pair[1].x,
                y: pair[0].y,
            })
        })
    }
}

impl TryFrom<Vec<TerrainPoint>> for Terrain {
    type Error = ConfigError;

    fn try_from(points: Vec<TerrainPoint>) -> Result<Self, Self::Error> {
        Terrain::new(points)
    }
}

impl From<Terrain> for Vec<TerrainPoint> {
    fn from(terrain: Terrain) -> Self {
        terrain.points
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_short_terrain() {
        assert!(matches!(
            Terrain::new(vec![TerrainPoint {
                x: 0.0,
                y: 100.0,
                is_flag: true
            }]),
            Err(ConfigError::TerrainTooShort(1))
        ));
    }

    #[test]
    fn test_rejects_unsorted_terrain() {
        let points = vec![
            TerrainPoint {
                x: 0.0,
                y: 100.0,
                is_flag: true,
            },
            TerrainPoint {
                x: 0.0,
                y: 100.0,
                is_flag: true,
            },
        ];
        assert!(matches!(
            Terrain::new(points),
            Err(ConfigError::TerrainNotAscending { .. })
        ));
    }

    #[test]
    fn test_rejects_missing_landing_zone() {
        let points = vec![
            TerrainPoint {
                x: 0.0,
                y: 100.0,
                is_flag: false,
            },
            TerrainPoint {
                x: 800.0,
                y: 100.0,
                is_flag: true,
            },
        ];
        assert!(matches!(
            Terrain::new(points),
            Err(ConfigError::MissingLandingZone)
        ));
    }

    #[test]
    fn test_height_interpolation() {
        let points = vec![
            TerrainPoint {
                x: 0.0,
                y: 100.0,
                is_flag: false,
            },
            TerrainPoint {
                x: 100.0,
                y: 200.0,
                is_flag: true,
            },
            TerrainPoint {
                x: 200.0,
                y: 200.0,
                is_flag: true,
            },
        ];
        let terrain = Terrain::new(points).unwrap();
        assert_eq!(terrain.height_at(50.0), 150.0);
        assert_eq!(terrain.height_at(150.0), 200.0);
        // Outside the polyline clamps to the end heights.
        assert_eq!(terrain.height_at(-10.0), 100.0);
        assert_eq!(terrain.height_at(500.0), 200.0);
    }

    #[test]
    fn test_landing_zone_band() {
        let terrain = Terrain::flat(800.0, 100.0, 350.0, 450.0);
        let zone = terrain.landing_zone();
        assert_eq!(zone.y, 100.0);
        assert!(zone.contains(400.0));
        assert!(!zone.contains(300.0));
        assert!(!zone.contains(451.0));
    }
}
