use crate::math::{self as m, Angle};

use thunderdome as td;

//

pub mod body;
pub use body::{Body, Mass};

pub mod collision;
pub use collision::{Collider, ColliderShape, LayerMask, QueryBackend, Ray, RayHit};

pub mod constraint;
pub use constraint::{
    ConstraintLimit, DistanceJoint, DistanceJointBuilder, JointBreak, JointKey, JointTarget,
};

mod entity_set;
pub use entity_set::{BodyKey, ColliderKey, EntitySet};

pub mod forcefield;
pub use forcefield::ForceField;

pub mod rope;
pub use rope::{Anchor, BendRope, BreakOutcome, RopeEvent, RopeParameters};

//

/// Velocity of an object.
///
// Equivalent to a Vec3 but with names for the translational and rotational part.
#[derive(Copy, Clone, Debug)]
pub struct Velocity {
    /// Linear velocity in metres per second.
    pub linear: m::Vec2,
    /// Angular velocity in radians per second.
    pub angular: f64,
}

impl Default for Velocity {
    fn default() -> Self {
        Velocity {
            linear: m::Vec2::zero(),
            angular: 0.0,
        }
    }
}

impl Velocity {
    pub fn apply_to_pose(&self, dt: f64, mut pose: m::Pose) -> m::Pose {
        let scaled = *self * dt;
        pose.append_translation(scaled.linear);
        pose.prepend_rotation(m::Angle::Rad(scaled.angular).into());
        pose
    }
}

impl std::ops::Mul<f64> for Velocity {
    type Output = Velocity;

    fn mul(self, rhs: f64) -> Self::Output {
        Velocity {
            linear: self.linear * rhs,
            angular: self.angular * rhs,
        }
    }
}

/// A minimal physics world: bodies moved by a force field, static obstacle colliders,
/// and distance joints solved with position projection.
///
/// Obstacles don't push bodies around, they only exist to be queried
/// through [`QueryBackend`][self::QueryBackend].
pub struct PhysicsWorld {
    pub substeps: usize,
    pub entities: EntitySet,
    joints: td::Arena<DistanceJoint>,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::with_substeps(10)
    }
}

impl PhysicsWorld {
    /// Create a physics world with the specified number of substeps per frame.
    pub fn with_substeps(substeps: usize) -> Self {
        PhysicsWorld {
            substeps: substeps.max(1),
            entities: EntitySet::new(),
            joints: td::Arena::new(),
        }
    }

    /// Add a joint to the world. Returns a key that can be used to access or remove it later.
    pub fn insert_joint(&mut self, joint: DistanceJoint) -> JointKey {
        JointKey(self.joints.insert(joint))
    }

    /// Access a joint if it still exists.
    pub fn joint(&self, key: JointKey) -> Option<&DistanceJoint> {
        self.joints.get(key.0)
    }

    /// Mutably access a joint if it still exists.
    pub fn joint_mut(&mut self, key: JointKey) -> Option<&mut DistanceJoint> {
        self.joints.get_mut(key.0)
    }

    /// Remove a joint from the world. Returns the joint if it still existed.
    ///
    /// Joints also disappear on their own if the bodies they're attached to
    /// are removed, so it's not guaranteed the joint will exist
    /// even if it hasn't been explicitly removed before.
    pub fn remove_joint(&mut self, key: JointKey) -> Option<DistanceJoint> {
        self.joints.remove(key.0)
    }

    /// Remove everything from the world.
    pub fn clear(&mut self) {
        self.entities.clear();
        self.joints.clear();
    }

    /// Move bodies and solve joints.
    ///
    /// Returns the joints that broke during this step.
    /// Broken joints are disabled, not removed.
    pub fn tick(&mut self, dt: f64, forcefield: &impl ForceField) -> Vec<JointBreak> {
        let _span = tracy_span!("physics tick");

        let dt = dt / self.substeps as f64;
        let inv_dt = 1.0 / dt;
        let inv_dt_sq = inv_dt * inv_dt;

        // remove joints where one or both participating bodies have been destroyed
        let bodies = &self.entities.bodies;
        self.joints.retain(|_, j| {
            bodies.contains(j.owner.0)
                && match j.target {
                    JointTarget::Body(t) => bodies.contains(t.0),
                    JointTarget::Point(_) => true,
                }
        });

        let mut breaks = Vec::new();
        for _substep in 0..self.substeps {
            // apply external forces and estimate post-step pose with explicit Euler step
            let mut old_poses: Vec<(td::Index, m::Pose)> =
                Vec::with_capacity(self.entities.bodies.len());
            for (idx, body) in self.entities.bodies.iter_mut() {
                if let Mass::Finite { .. } = body.mass {
                    body.velocity.linear += forcefield.value_at(body.pose.translation) * dt;
                }
                old_poses.push((idx, body.pose));
                body.pose = body.velocity.apply_to_pose(dt, body.pose);
            }

            for (key, joint) in self.joints.iter_mut() {
                if !joint.enabled {
                    continue;
                }
                let Some((force, torque)) =
                    solve_distance_joint(joint, &mut self.entities, inv_dt_sq)
                else {
                    continue;
                };
                let over_force = joint.break_force.map(|f| force > f).unwrap_or(false);
                let over_torque = joint.break_torque.map(|t| torque > t).unwrap_or(false);
                if over_force || over_torque {
                    log::debug!("joint broke with force {force:.2}, torque {torque:.2}");
                    joint.enabled = false;
                    breaks.push(JointBreak {
                        joint: JointKey(key),
                        force,
                        torque,
                    });
                }
            }

            // update velocities from pose differences
            for (idx, old_pose) in old_poses {
                let Some(body) = self.entities.bodies.get_mut(idx) else {
                    continue;
                };
                if !body.sees_forces() {
                    continue;
                }
                body.velocity.linear = (body.pose.translation - old_pose.translation) * inv_dt;
                // I'm sure there are more efficient ways to handle the angle but this'll do
                body.velocity.angular =
                    Angle::from(body.pose.rotation * old_pose.rotation.reversed()).rad() * inv_dt;
            }
        }

        breaks
    }
}

/// Single position projection of a distance joint.
/// Returns the force and torque applied, or `None` if nothing needed correcting.
fn solve_distance_joint(
    joint: &DistanceJoint,
    entities: &mut EntitySet,
    inv_dt_sq: f64,
) -> Option<(f64, f64)> {
    match joint.target {
        JointTarget::Body(target) if target != joint.owner => {
            let (Some(b0), Some(b1)) = entities.bodies.get2_mut(joint.owner.0, target.0) else {
                return None;
            };
            let offsets_rotated = [
                b0.pose.rotation * joint.offsets[0],
                b1.pose.rotation * joint.offsets[1],
            ];
            let actual_dist = (b1.pose.translation + offsets_rotated[1])
                - (b0.pose.translation + offsets_rotated[0]);
            let actual_dist_mag = actual_dist.mag();
            let error = joint.distance - actual_dist_mag;
            if !joint.limit.applies_to(error) {
                return None;
            }
            let dir = if actual_dist_mag != 0.0 {
                actual_dist / actual_dist_mag
            } else {
                m::Vec2::unit_y()
            };

            let inv_masses = [b0.mass.inv(), b1.mass.inv()];
            let inv_mom_inertias = [b0.moment_of_inertia.inv(), b1.moment_of_inertia.inv()];
            let offsets_wedge_dir = [
                offsets_rotated[0].wedge(dir).xy,
                offsets_rotated[1].wedge(dir).xy,
            ];
            let eff_inv_masses = [
                inv_masses[0] + offsets_wedge_dir[0].powi(2) * inv_mom_inertias[0],
                inv_masses[1] + offsets_wedge_dir[1].powi(2) * inv_mom_inertias[1],
            ];
            let denom = eff_inv_masses[0] + eff_inv_masses[1] + joint.compliance * inv_dt_sq;
            if denom == 0.0 {
                return None;
            }
            let lambda = -error / denom;

            b0.pose.append_translation(inv_masses[0] * lambda * dir);
            b0.pose.prepend_rotation(
                Angle::Rad(inv_mom_inertias[0] * lambda * offsets_wedge_dir[0]).into(),
            );
            b1.pose.append_translation(-inv_masses[1] * lambda * dir);
            b1.pose.prepend_rotation(
                Angle::Rad(-inv_mom_inertias[1] * lambda * offsets_wedge_dir[1]).into(),
            );

            let force = lambda.abs() * inv_dt_sq;
            let torque = force * offsets_wedge_dir[0].abs().max(offsets_wedge_dir[1].abs());
            Some((force, torque))
        }
        JointTarget::Body(_) => None,
        JointTarget::Point(point) => {
            let b0 = entities.bodies.get_mut(joint.owner.0)?;
            let offset_rotated = b0.pose.rotation * joint.offsets[0];
            let actual_dist = point - (b0.pose.translation + offset_rotated);
            let actual_dist_mag = actual_dist.mag();
            let error = joint.distance - actual_dist_mag;
            if !joint.limit.applies_to(error) {
                return None;
            }
            let dir = if actual_dist_mag != 0.0 {
                actual_dist / actual_dist_mag
            } else {
                m::Vec2::unit_y()
            };

            let inv_mass = b0.mass.inv();
            let inv_mom_inertia = b0.moment_of_inertia.inv();
            let offset_wedge_dir = offset_rotated.wedge(dir).xy;
            let eff_inv_mass = inv_mass + offset_wedge_dir.powi(2) * inv_mom_inertia;
            let denom = eff_inv_mass + joint.compliance * inv_dt_sq;
            if denom == 0.0 {
                return None;
            }
            let lambda = -error / denom;

            b0.pose.append_translation(inv_mass * lambda * dir);
            b0.pose
                .prepend_rotation(Angle::Rad(inv_mom_inertia * lambda * offset_wedge_dir).into());

            let force = lambda.abs() * inv_dt_sq;
            Some((force, force * offset_wedge_dir.abs()))
        }
    }
}

impl QueryBackend for PhysicsWorld {
    fn cast_ray(&self, ray: Ray, max_dist: f64, mask: LayerMask) -> Option<RayHit> {
        self.entities
            .colliders()
            .filter(|(_, coll)| mask.get(coll.layer))
            .filter_map(|(key, coll)| {
                collision::query::ray_collider(ray, max_dist, coll).map(|isect| RayHit {
                    collider: key,
                    t: isect.t,
                    point: ray.point_at_t(isect.t),
                    normal: isect.normal,
                })
            })
            .min_by(|h1, h2| h1.t.total_cmp(&h2.t))
    }

    fn overlap_circle(
        &self,
        center: m::Vec2,
        radius: f64,
        mask: LayerMask,
    ) -> Option<ColliderKey> {
        self.entities
            .colliders()
            .find(|(_, coll)| {
                mask.get(coll.layer) && collision::query::circle_collider_bool(center, radius, coll)
            })
            .map(|(key, _)| key)
    }

    fn overlap_circle_all(&self, center: m::Vec2, radius: f64, mask: LayerMask) -> Vec<ColliderKey> {
        self.entities
            .colliders()
            .filter(|(_, coll)| {
                mask.get(coll.layer) && collision::query::circle_collider_bool(center, radius, coll)
            })
            .map(|(key, _)| key)
            .collect()
    }

    fn closest_surface_point(&self, collider: ColliderKey, point: m::Vec2) -> Option<m::Vec2> {
        let coll = self.entities.get_collider(collider)?;
        Some(collision::query::closest_boundary_point(point, coll))
    }

    fn bounding_circle(&self, collider: ColliderKey) -> Option<(m::Vec2, f64)> {
        let coll = self.entities.get_collider(collider)?;
        Some((coll.pose.translation, coll.bounding_radius()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forcefield::{Gravity, NoneField};

    fn world_with_particle(pos: m::Vec2) -> (PhysicsWorld, BodyKey) {
        let mut world = PhysicsWorld::with_substeps(4);
        let body = world
            .entities
            .insert_body(Body::new_particle(1.0).with_position(pos));
        (world, body)
    }

    #[test]
    fn max_distance_joint_holds_hanging_body() {
        let (mut world, body) = world_with_particle(m::Vec2::new(0.0, -2.0));
        let joint = world.insert_joint(
            DistanceJointBuilder::new(body)
                .with_limit(ConstraintLimit::Lt)
                .build(2.0),
        );
        let gravity = Gravity(m::Vec2::new(0.0, -9.81));
        for _ in 0..120 {
            assert!(world.tick(1.0 / 60.0, &gravity).is_empty());
        }
        let pos = world.entities.get_body(body).unwrap().position();
        assert!((pos.mag() - 2.0).abs() < 0.01, "body drifted to {pos:?}");
        assert!(world.joint(joint).unwrap().enabled);
    }

    #[test]
    fn max_distance_joint_allows_slack() {
        let (mut world, body) = world_with_particle(m::Vec2::new(0.5, 0.0));
        world.insert_joint(
            DistanceJointBuilder::new(body)
                .with_limit(ConstraintLimit::Lt)
                .build(2.0),
        );
        world.tick(1.0 / 60.0, &NoneField);
        let pos = world.entities.get_body(body).unwrap().position();
        assert!((pos - m::Vec2::new(0.5, 0.0)).mag() < 1e-9);
    }

    #[test]
    fn overloaded_joint_breaks_and_disables() {
        let (mut world, body) = world_with_particle(m::Vec2::new(0.0, -2.0));
        let joint = world.insert_joint(
            DistanceJointBuilder::new(body)
                .with_limit(ConstraintLimit::Lt)
                .with_break_thresholds(Some(5.0), None)
                .build(2.0),
        );
        let gravity = Gravity(m::Vec2::new(0.0, -9.81));
        let breaks: Vec<JointBreak> = (0..10)
            .flat_map(|_| world.tick(1.0 / 60.0, &gravity))
            .collect();
        assert_eq!(breaks.len(), 1);
        assert_eq!(breaks[0].joint, joint);
        assert!(breaks[0].force > 5.0);
        assert!(!world.joint(joint).unwrap().enabled);
    }

    #[test]
    fn two_body_joint_pulls_bodies_together() {
        let mut world = PhysicsWorld::with_substeps(1);
        let b0 = world
            .entities
            .insert_body(Body::new_particle(1.0).with_position(m::Vec2::new(-2.0, 0.0)));
        let b1 = world
            .entities
            .insert_body(Body::new_particle(1.0).with_position(m::Vec2::new(2.0, 0.0)));
        world.insert_joint(
            DistanceJointBuilder::new(b0)
                .with_target(JointTarget::Body(b1))
                .build(2.0),
        );
        world.tick(1.0 / 60.0, &NoneField);
        let p0 = world.entities.get_body(b0).unwrap().position();
        let p1 = world.entities.get_body(b1).unwrap().position();
        assert!((p0 - m::Vec2::new(-1.0, 0.0)).mag() < 1e-9);
        assert!((p1 - m::Vec2::new(1.0, 0.0)).mag() < 1e-9);
    }

    #[test]
    fn joints_disappear_with_their_bodies() {
        let (mut world, body) = world_with_particle(m::Vec2::zero());
        let joint = world.insert_joint(DistanceJointBuilder::new(body).build(1.0));
        world.entities.remove_body(body);
        world.tick(1.0 / 60.0, &NoneField);
        assert!(world.joint(joint).is_none());
    }

    #[test]
    fn queries_respect_layers_and_pick_closest() {
        let mut world = PhysicsWorld::default();
        let near = world
            .entities
            .insert_collider(Collider::new_circle(0.5).with_position(m::Vec2::new(3.0, 0.0)));
        let far = world.entities.insert_collider(
            Collider::new_square(1.0)
                .with_position(m::Vec2::new(6.0, 0.0))
                .with_layer(1),
        );
        let ray = Ray {
            start: m::Vec2::zero(),
            dir: m::Unit::unit_x(),
        };
        let hit = world.cast_ray(ray, 10.0, LayerMask::ALL).unwrap();
        assert_eq!(hit.collider, near);
        assert!((hit.point - m::Vec2::new(2.5, 0.0)).mag() < 1e-9);
        let hit = world.cast_ray(ray, 10.0, LayerMask::single(1)).unwrap();
        assert_eq!(hit.collider, far);
        assert!(world.cast_ray(ray, 2.0, LayerMask::ALL).is_none());

        assert!(world.line_of_sight_blocked(m::Vec2::zero(), m::Vec2::new(8.0, 0.0), LayerMask::ALL));
        assert!(!world.line_of_sight_blocked(
            m::Vec2::new(0.0, 1.0),
            m::Vec2::new(8.0, 1.0),
            LayerMask::ALL
        ));

        let overlaps = world.overlap_circle_all(m::Vec2::new(4.5, 0.0), 1.2, LayerMask::ALL);
        assert_eq!(overlaps.len(), 2);
        assert_eq!(
            world.overlap_circle(m::Vec2::new(4.5, 0.0), 1.2, LayerMask::single(0)),
            Some(near)
        );
        assert_eq!(world.bounding_circle(near), Some((m::Vec2::new(3.0, 0.0), 0.5)));
    }
}
