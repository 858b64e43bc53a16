//! Intersection queries for points, circles and rays vs. colliders.
//!
//! All shapes are solid, so a ray starting inside a collider doesn't hit it.

use super::{Collider, ColliderShape, Ray};
use crate::math::{self as m, Unit};

/// Result of a successful ray intersection test, in world space.
#[derive(Clone, Copy, Debug)]
pub struct RayIntersection {
    /// Distance along the ray.
    pub t: f64,
    /// Surface normal at the point of intersection, facing against the ray.
    pub normal: Unit<m::Vec2>,
}

/// Check whether or not a point intersects with a collider.
pub fn point_collider_bool(point: m::Vec2, coll: &Collider) -> bool {
    let p_wrt_c = coll.pose.inversed() * point;
    match coll.shape {
        ColliderShape::Circle { r } => p_wrt_c.mag_sq() < r * r,
        ColliderShape::Rect { hw, hh } => p_wrt_c.x.abs() < hw && p_wrt_c.y.abs() < hh,
        ColliderShape::Capsule { hl, r } => {
            let x_dist = (p_wrt_c.x.abs() - hl).max(0.0);
            let y_dist = p_wrt_c.y.abs();
            x_dist * x_dist + y_dist * y_dist < r * r
        }
    }
}

/// Check whether a circle overlaps with a collider.
pub fn circle_collider_bool(center: m::Vec2, radius: f64, coll: &Collider) -> bool {
    if point_collider_bool(center, coll) {
        return true;
    }
    (closest_boundary_point(center, coll) - center).mag_sq() < radius * radius
}

/// Find the point on the boundary of a collider closest to the given point.
///
/// Works for points both inside and outside the collider.
pub fn closest_boundary_point(point: m::Vec2, coll: &Collider) -> m::Vec2 {
    let p = coll.pose.inversed() * point;
    let local = match coll.shape {
        ColliderShape::Circle { r } => {
            if p.mag_sq() == 0.0 {
                m::Vec2::new(r, 0.0)
            } else {
                p.normalized() * r
            }
        }
        ColliderShape::Rect { hw, hh } => {
            if p.x.abs() < hw && p.y.abs() < hh {
                // inside, move to the closest edge
                if hw - p.x.abs() < hh - p.y.abs() {
                    m::Vec2::new(p.x.signum() * hw, p.y)
                } else {
                    m::Vec2::new(p.x, p.y.signum() * hh)
                }
            } else {
                m::Vec2::new(p.x.clamp(-hw, hw), p.y.clamp(-hh, hh))
            }
        }
        ColliderShape::Capsule { hl, r } => {
            let on_segment = m::Vec2::new(p.x.clamp(-hl, hl), 0.0);
            let offset = p - on_segment;
            if offset.mag_sq() == 0.0 {
                on_segment + m::Vec2::new(0.0, r)
            } else {
                on_segment + offset.normalized() * r
            }
        }
    };
    coll.pose * local
}

/// Intersect a ray with a collider, looking at most `max_t` units along the ray.
///
/// Only hits entering the collider from outside are reported.
pub fn ray_collider(ray: Ray, max_t: f64, coll: &Collider) -> Option<RayIntersection> {
    let inv = coll.pose.inversed();
    let start = inv * ray.start;
    let dir = inv.rotation * *ray.dir;
    let (t, local_normal) = match coll.shape {
        ColliderShape::Circle { r } => ray_circle(start, dir, m::Vec2::zero(), r)?,
        ColliderShape::Rect { hw, hh } => ray_rect(start, dir, hw, hh)?,
        ColliderShape::Capsule { hl, r } => ray_capsule(start, dir, hl, r)?,
    };
    if t > max_t {
        return None;
    }
    Some(RayIntersection {
        t,
        normal: Unit::new_normalize(coll.pose.rotation * local_normal),
    })
}

fn ray_circle(start: m::Vec2, dir: m::Vec2, center: m::Vec2, r: f64) -> Option<(f64, m::Vec2)> {
    let rel = start - center;
    let b = rel.dot(dir);
    let c = rel.mag_sq() - r * r;
    // starting inside, or pointing away
    if c < 0.0 || b > 0.0 {
        return None;
    }
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    let t = (-b - disc.sqrt()).max(0.0);
    let normal = (rel + t * dir) / r;
    Some((t, normal))
}

fn ray_rect(start: m::Vec2, dir: m::Vec2, hw: f64, hh: f64) -> Option<(f64, m::Vec2)> {
    if start.x.abs() < hw && start.y.abs() < hh {
        return None;
    }
    let mut t_enter = f64::NEG_INFINITY;
    let mut t_exit = f64::INFINITY;
    let mut normal = m::Vec2::zero();
    for (s, d, half, axis) in [
        (start.x, dir.x, hw, m::Vec2::unit_x()),
        (start.y, dir.y, hh, m::Vec2::unit_y()),
    ] {
        if d == 0.0 {
            if s.abs() > half {
                return None;
            }
            continue;
        }
        let t0 = (-half - s) / d;
        let t1 = (half - s) / d;
        let (near, far) = if t0 < t1 { (t0, t1) } else { (t1, t0) };
        if near > t_enter {
            t_enter = near;
            normal = -d.signum() * axis;
        }
        t_exit = t_exit.min(far);
    }
    if t_enter > t_exit || t_exit < 0.0 || t_enter < 0.0 {
        return None;
    }
    Some((t_enter, normal))
}

fn ray_capsule(start: m::Vec2, dir: m::Vec2, hl: f64, r: f64) -> Option<(f64, m::Vec2)> {
    let x_dist = (start.x.abs() - hl).max(0.0);
    if x_dist * x_dist + start.y * start.y < r * r {
        return None;
    }

    let mut best: Option<(f64, m::Vec2)> = None;
    let mut consider = |cand: Option<(f64, m::Vec2)>| {
        if let Some((t, n)) = cand {
            if best.map(|(bt, _)| t < bt).unwrap_or(true) {
                best = Some((t, n));
            }
        }
    };

    // flat sides, only the one facing the ray's start can be entered
    if dir.y != 0.0 && start.y.abs() >= r {
        let side = r * start.y.signum();
        let t = (side - start.y) / dir.y;
        let x = start.x + t * dir.x;
        if t >= 0.0 && x.abs() <= hl {
            consider(Some((t, m::Vec2::new(0.0, start.y.signum()))));
        }
    }
    // rounded ends
    consider(ray_circle(start, dir, m::Vec2::new(-hl, 0.0), r));
    consider(ray_circle(start, dir, m::Vec2::new(hl, 0.0), r));

    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ray(start: [f64; 2], dir: [f64; 2]) -> Ray {
        Ray {
            start: m::Vec2::new(start[0], start[1]),
            dir: Unit::new_normalize(m::Vec2::new(dir[0], dir[1])),
        }
    }

    fn approx(a: m::Vec2, b: m::Vec2) -> bool {
        (a - b).mag() < 1e-9
    }

    #[test]
    fn ray_hits_each_shape_from_outside() {
        let circle = Collider::new_circle(1.0).with_position(m::Vec2::new(5.0, 0.0));
        let hit = ray_collider(ray([0.0, 0.0], [1.0, 0.0]), 10.0, &circle).unwrap();
        assert!((hit.t - 4.0).abs() < 1e-9);
        assert!(approx(*hit.normal, m::Vec2::new(-1.0, 0.0)));

        let rect = Collider::new_rect(2.0, 4.0).with_position(m::Vec2::new(0.0, 5.0));
        let hit = ray_collider(ray([0.5, 0.0], [0.0, 1.0]), 10.0, &rect).unwrap();
        assert!((hit.t - 3.0).abs() < 1e-9);
        assert!(approx(*hit.normal, m::Vec2::new(0.0, -1.0)));

        let capsule = Collider::new_capsule(4.0, 0.5).with_position(m::Vec2::new(0.0, -3.0));
        let hit = ray_collider(ray([1.0, 0.0], [0.0, -1.0]), 10.0, &capsule).unwrap();
        assert!((hit.t - 2.5).abs() < 1e-9);
        assert!(approx(*hit.normal, m::Vec2::new(0.0, 1.0)));
        // hitting the rounded end
        let hit = ray_collider(ray([-6.0, -3.0], [1.0, 0.0]), 10.0, &capsule).unwrap();
        assert!((hit.t - 3.5).abs() < 1e-9);
        assert!(approx(*hit.normal, m::Vec2::new(-1.0, 0.0)));
    }

    #[test]
    fn rotated_rect_normal_is_in_world_space() {
        let rect = Collider::new_square(2.0)
            .with_position(m::Vec2::new(4.0, 0.0))
            .with_rotation(m::Angle::Deg(90.0));
        let hit = ray_collider(ray([0.0, 0.0], [1.0, 0.0]), 10.0, &rect).unwrap();
        assert!((hit.t - 3.0).abs() < 1e-9);
        assert!(approx(*hit.normal, m::Vec2::new(-1.0, 0.0)));
    }

    #[test]
    fn ray_misses() {
        let circle = Collider::new_circle(1.0).with_position(m::Vec2::new(5.0, 0.0));
        // too short
        assert!(ray_collider(ray([0.0, 0.0], [1.0, 0.0]), 3.9, &circle).is_none());
        // pointing away
        assert!(ray_collider(ray([0.0, 0.0], [-1.0, 0.0]), 10.0, &circle).is_none());
        // passing by
        assert!(ray_collider(ray([0.0, 2.0], [1.0, 0.0]), 10.0, &circle).is_none());
        // starting inside
        assert!(ray_collider(ray([5.0, 0.5], [1.0, 0.0]), 10.0, &circle).is_none());
        let rect = Collider::new_square(2.0);
        assert!(ray_collider(ray([0.0, 0.0], [1.0, 1.0]), 10.0, &rect).is_none());
        assert!(ray_collider(ray([3.0, 0.0], [0.0, 1.0]), 10.0, &rect).is_none());
    }

    #[test]
    fn closest_points_inside_and_outside() {
        let rect = Collider::new_rect(4.0, 2.0);
        assert!(approx(
            closest_boundary_point(m::Vec2::new(1.5, 0.2), &rect),
            m::Vec2::new(2.0, 0.2)
        ));
        assert!(approx(
            closest_boundary_point(m::Vec2::new(0.5, -0.8), &rect),
            m::Vec2::new(0.5, -1.0)
        ));
        assert!(approx(
            closest_boundary_point(m::Vec2::new(3.0, 3.0), &rect),
            m::Vec2::new(2.0, 1.0)
        ));

        let circle = Collider::new_circle(2.0).with_position(m::Vec2::new(1.0, 1.0));
        assert!(approx(
            closest_boundary_point(m::Vec2::new(1.0, 5.0), &circle),
            m::Vec2::new(1.0, 3.0)
        ));

        let capsule = Collider::new_capsule(2.0, 1.0);
        assert!(approx(
            closest_boundary_point(m::Vec2::new(0.5, 0.1), &capsule),
            m::Vec2::new(0.5, 1.0)
        ));
        assert!(approx(
            closest_boundary_point(m::Vec2::new(4.0, 0.0), &capsule),
            m::Vec2::new(2.0, 0.0)
        ));
    }

    #[test]
    fn circle_overlap() {
        let circle = Collider::new_circle(1.0);
        assert!(circle_collider_bool(m::Vec2::new(1.4, 0.0), 0.5, &circle));
        assert!(!circle_collider_bool(m::Vec2::new(1.6, 0.0), 0.5, &circle));
        assert!(circle_collider_bool(m::Vec2::new(0.2, 0.0), 0.01, &circle));
        let rect = Collider::new_square(2.0);
        assert!(circle_collider_bool(m::Vec2::new(1.3, 1.3), 0.5, &rect));
        assert!(!circle_collider_bool(m::Vec2::new(1.4, 1.4), 0.5, &rect));
    }
}
