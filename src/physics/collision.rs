mod collider;
pub use collider::{Collider, ColliderShape};

pub mod query;

use crate::{
    math::{self as m, Unit},
    physics::ColliderKey,
};

/// A ray with a start point and a direction.
#[derive(Clone, Copy, Debug)]
pub struct Ray {
    pub start: m::Vec2,
    pub dir: Unit<m::Vec2>,
}

impl Ray {
    /// Get the point `t` units along the ray.
    #[inline]
    pub fn point_at_t(&self, t: f64) -> m::Vec2 {
        self.start + t * *self.dir
    }
}

/// Bitmask selecting which collision layers a query considers.
///
/// Layers are identified by their index, so there can be at most 64 of them.
/// Indices past that are never part of any mask.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde-types", derive(serde::Deserialize, serde::Serialize))]
pub struct LayerMask(pub u64);

impl LayerMask {
    pub const ALL: LayerMask = LayerMask(u64::MAX);
    pub const NONE: LayerMask = LayerMask(0);

    /// A mask containing only the given layer.
    #[inline]
    pub const fn single(layer: usize) -> Self {
        LayerMask(layer_bit(layer))
    }

    /// Add a layer to the mask in a builder-like chain.
    #[inline]
    pub const fn with(self, layer: usize) -> Self {
        LayerMask(self.0 | layer_bit(layer))
    }

    #[inline]
    pub fn get(&self, layer: usize) -> bool {
        self.0 & layer_bit(layer) != 0
    }
}

#[inline]
const fn layer_bit(layer: usize) -> u64 {
    if layer < 64 {
        1 << layer
    } else {
        0
    }
}

impl Default for LayerMask {
    fn default() -> Self {
        Self::ALL
    }
}

/// The first collider a ray cast hit.
#[derive(Clone, Copy, Debug)]
pub struct RayHit {
    pub collider: ColliderKey,
    /// Distance from the ray's start to the hit point.
    pub t: f64,
    pub point: m::Vec2,
    /// Surface normal at the hit point, facing against the ray.
    pub normal: Unit<m::Vec2>,
}

/// Spatial queries against the obstacles of a physics world.
///
/// This is everything the bending rope needs to know about the world's geometry.
/// [`PhysicsWorld`][crate::physics::PhysicsWorld] implements it with brute force over all colliders;
/// an engine with a spatial index can implement it more efficiently.
pub trait QueryBackend {
    /// Find the closest collider hit by a ray within `max_dist` units from its start.
    fn cast_ray(&self, ray: Ray, max_dist: f64, mask: LayerMask) -> Option<RayHit>;

    /// Find any collider overlapping the circle.
    fn overlap_circle(&self, center: m::Vec2, radius: f64, mask: LayerMask)
        -> Option<ColliderKey>;

    /// Find every collider overlapping the circle.
    fn overlap_circle_all(&self, center: m::Vec2, radius: f64, mask: LayerMask)
        -> Vec<ColliderKey>;

    /// Check whether any collider is in the way on the line segment from `a` to `b`.
    fn line_of_sight_blocked(&self, a: m::Vec2, b: m::Vec2, mask: LayerMask) -> bool {
        let Some(dir) = Unit::try_new(b - a, 1e-9) else {
            return false;
        };
        let dist = (b - a).mag();
        self.cast_ray(Ray { start: a, dir }, dist, mask).is_some()
            || self.overlap_circle(a, 0.0, mask).is_some()
    }

    /// Find the point on the collider's surface closest to `point`.
    /// `None` if the collider doesn't exist.
    fn closest_surface_point(&self, collider: ColliderKey, point: m::Vec2) -> Option<m::Vec2>;

    /// Center and radius of a circle containing the whole collider.
    fn bounding_circle(&self, collider: ColliderKey) -> Option<(m::Vec2, f64)>;
}
