//! Collision detection between hitbox shapes
//!
//! Entities carry one or more hitboxes, each either a sphere or an
//! axis-aligned box. Touching counts as colliding for every pair of shapes,
//! and the predicate is symmetric.

use glam::{Affine3A, Vec3};
use serde::{Deserialize, Serialize};

/// A single collision shape, in local or world space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Hitbox {
    Sphere { center: Vec3, radius: f32 },
    Aabb { min: Vec3, max: Vec3 },
}

impl Hitbox {
    pub fn sphere(center: Vec3, radius: f32) -> Self {
        Hitbox::Sphere { center, radius }
    }

    /// Box from two opposite corners, in any order
    pub fn aabb(a: Vec3, b: Vec3) -> Self {
        Hitbox::Aabb {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Box around `center` extending `half_extents` on each axis
    pub fn cuboid(center: Vec3, half_extents: Vec3) -> Self {
        Hitbox::aabb(center - half_extents, center + half_extents)
    }

    /// Whether two shapes overlap or touch
    pub fn intersects(&self, other: &Hitbox) -> bool {
        match (*self, *other) {
            (
                Hitbox::Sphere { center: a, radius: ra },
                Hitbox::Sphere { center: b, radius: rb },
            ) => a.distance_squared(b) <= (ra + rb) * (ra + rb),
            (Hitbox::Aabb { min: amin, max: amax }, Hitbox::Aabb { min: bmin, max: bmax }) => {
                amin.cmple(bmax).all() && bmin.cmple(amax).all()
            }
            (Hitbox::Sphere { center, radius }, Hitbox::Aabb { min, max })
            | (Hitbox::Aabb { min, max }, Hitbox::Sphere { center, radius }) => {
                sphere_aabb(center, radius, min, max)
            }
        }
    }

    /// Shape after applying an affine transform
    ///
    /// Spheres scale by the largest axis scale; boxes are re-fitted around
    /// their transformed corners.
    pub fn transformed(&self, transform: &Affine3A) -> Hitbox {
        match *self {
            Hitbox::Sphere { center, radius } => {
                let m = transform.matrix3;
                let scale = m.x_axis.length().max(m.y_axis.length()).max(m.z_axis.length());
                Hitbox::Sphere {
                    center: transform.transform_point3(center),
                    radius: radius * scale,
                }
            }
            Hitbox::Aabb { min, max } => {
                let mut lo = Vec3::splat(f32::INFINITY);
                let mut hi = Vec3::splat(f32::NEG_INFINITY);
                for i in 0..8 {
                    let corner = Vec3::new(
                        if i & 1 == 0 { min.x } else { max.x },
                        if i & 2 == 0 { min.y } else { max.y },
                        if i & 4 == 0 { min.z } else { max.z },
                    );
                    let p = transform.transform_point3(corner);
                    lo = lo.min(p);
                    hi = hi.max(p);
                }
                Hitbox::Aabb { min: lo, max: hi }
            }
        }
    }

    /// Distance along `ray` to the first contact, if the ray hits
    ///
    /// A ray starting inside the shape hits at distance 0.
    pub fn ray_distance(&self, ray: &Ray) -> Option<f32> {
        match *self {
            Hitbox::Sphere { center, radius } => {
                let m = ray.origin - center;
                let b = m.dot(ray.direction);
                let c = m.length_squared() - radius * radius;
                if c > 0.0 && b > 0.0 {
                    return None;
                }
                let discriminant = b * b - c;
                if discriminant < 0.0 {
                    return None;
                }
                Some((-b - discriminant.sqrt()).max(0.0))
            }
            Hitbox::Aabb { min, max } => {
                let mut t_min = 0.0_f32;
                let mut t_max = f32::INFINITY;
                for axis in 0..3 {
                    let origin = ray.origin[axis];
                    let dir = ray.direction[axis];
                    if dir.abs() < f32::EPSILON {
                        if origin < min[axis] || origin > max[axis] {
                            return None;
                        }
                        continue;
                    }
                    let t1 = (min[axis] - origin) / dir;
                    let t2 = (max[axis] - origin) / dir;
                    t_min = t_min.max(t1.min(t2));
                    t_max = t_max.min(t1.max(t2));
                    if t_min > t_max {
                        return None;
                    }
                }
                Some(t_min)
            }
        }
    }
}

fn sphere_aabb(center: Vec3, radius: f32, min: Vec3, max: Vec3) -> bool {
    let closest = center.clamp(min, max);
    closest.distance_squared(center) <= radius * radius
}

/// Whether any hitbox of `a` touches any hitbox of `b`
pub fn collides(a: &[Hitbox], b: &[Hitbox]) -> bool {
    a.iter().any(|ha| b.iter().any(|hb| ha.intersects(hb)))
}

/// Half-line used for picking
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Unit direction
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    /// Ray from `origin` through `target`
    pub fn through(origin: Vec3, target: Vec3) -> Self {
        Self::new(origin, target - origin)
    }

    pub fn at(&self, distance: f32) -> Vec3 {
        self.origin + self.direction * distance
    }
}
