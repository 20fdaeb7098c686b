//! Race track and wind layers
//!
//! The track is a closed polyline walked by arc length. Vehicles don't steer:
//! they move along the track at the speed of the wind layer they sit in and
//! get pushed sideways by its drift, so the only control is picking an
//! altitude.

use glam::Vec3;

use crate::consts::*;

#[derive(Debug, Clone)]
pub struct Track {
    points: Vec<Vec3>,
    /// Arc length at each point; `cumulative[i]` is the distance to `points[i]`
    cumulative: Vec<f32>,
    length: f32,
}

impl Track {
    /// Closed track through `points`, last point connects back to the first
    pub fn from_points(points: Vec<Vec3>) -> Self {
        let mut cumulative = Vec::with_capacity(points.len());
        let mut length = 0.0;
        for (i, p) in points.iter().enumerate() {
            cumulative.push(length);
            let next = points[(i + 1) % points.len()];
            length += p.distance(next);
        }
        Self {
            points,
            cumulative,
            length,
        }
    }

    /// Ellipse starting at the origin heading +x
    pub fn ellipse(radius_x: f32, radius_z: f32, center_z: f32, segments: usize) -> Self {
        let segments = segments.max(3);
        let points = (0..segments)
            .map(|i| {
                let t = i as f32 / segments as f32 * std::f32::consts::TAU;
                Vec3::new(
                    radius_x * t.sin(),
                    0.0,
                    center_z + radius_z * t.cos(),
                )
            })
            .collect();
        Self::from_points(points)
    }

    pub fn standard() -> Self {
        Self::ellipse(TRACK_RADIUS_X, TRACK_RADIUS_Z, TRACK_CENTER_Z, TRACK_SEGMENTS)
    }

    pub fn length(&self) -> f32 {
        self.length
    }

    fn segment_at(&self, distance: f32) -> (usize, f32) {
        if self.points.len() < 2 || self.length <= 0.0 {
            return (0, 0.0);
        }
        let d = distance.rem_euclid(self.length);
        let index = match self.cumulative.binary_search_by(|c| c.total_cmp(&d)) {
            Ok(i) => i,
            Err(i) => i.saturating_sub(1),
        };
        (index, d - self.cumulative[index])
    }

    /// Point on the center line `distance` along the track (wraps around)
    pub fn point_at(&self, distance: f32) -> Vec3 {
        if self.points.is_empty() {
            return Vec3::ZERO;
        }
        let (index, along) = self.segment_at(distance);
        let a = self.points[index];
        let b = self.points[(index + 1) % self.points.len()];
        let span = a.distance(b);
        if span <= f32::EPSILON {
            return a;
        }
        a.lerp(b, along / span)
    }

    /// Unit travel direction at `distance`
    pub fn direction_at(&self, distance: f32) -> Vec3 {
        if self.points.len() < 2 {
            return Vec3::X;
        }
        let (index, _) = self.segment_at(distance);
        let a = self.points[index];
        let b = self.points[(index + 1) % self.points.len()];
        (b - a).normalize_or(Vec3::X)
    }

    /// Center line point shifted sideways by `lane` and lifted to `altitude`
    pub fn position_at(&self, distance: f32, lane: f32, altitude: f32) -> Vec3 {
        let dir = self.direction_at(distance);
        let side = Vec3::new(-dir.z, 0.0, dir.x);
        self.point_at(distance) + side * lane + Vec3::Y * altitude
    }

    /// Whether a vehicle `lane` units from the center line has left the track
    pub fn is_off_track(&self, lane: f32) -> bool {
        lane.abs() > TRACK_HALF_WIDTH
    }

    /// Completed laps after `distance`
    pub fn laps(&self, distance: f32) -> u32 {
        if self.length <= 0.0 {
            return 0;
        }
        (distance / self.length).floor().max(0.0) as u32
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindLayer {
    pub altitude: f32,
    pub speed: f32,
    /// Sideways push in units/s; the sign picks the side
    pub drift: f32,
}

/// Stacked wind layers, ground first
#[derive(Debug, Clone)]
pub struct Atmosphere {
    layers: Vec<WindLayer>,
}

impl Atmosphere {
    /// One layer per standard altitude; missing speeds and drifts are calm
    pub fn new(speeds: &[f32], drifts: &[f32]) -> Self {
        let layers = WIND_LAYER_ALTITUDES
            .iter()
            .enumerate()
            .map(|(i, &altitude)| WindLayer {
                altitude,
                speed: speeds.get(i).copied().unwrap_or(0.0),
                drift: drifts.get(i).copied().unwrap_or(0.0),
            })
            .collect();
        Self { layers }
    }

    pub fn layer(&self, index: usize) -> Option<&WindLayer> {
        self.layers.get(index)
    }

    pub fn altitude(&self, index: usize) -> f32 {
        self.layer(index).map(|l| l.altitude).unwrap_or(0.0)
    }

    pub fn speed(&self, index: usize) -> f32 {
        self.layer(index).map(|l| l.speed).unwrap_or(0.0)
    }

    pub fn drift(&self, index: usize) -> f32 {
        self.layer(index).map(|l| l.drift).unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Layer reached from `current` after moving `delta` layers, clamped
    pub fn shift(&self, current: usize, delta: i8) -> usize {
        let top = self.layers.len().saturating_sub(1) as i64;
        (current as i64 + delta as i64).clamp(0, top) as usize
    }
}
