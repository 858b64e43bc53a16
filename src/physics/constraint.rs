//! The distance joint, a two-body constraint keeping two points at (or within) a distance.

use super::BodyKey;
use crate::math as m;

/// What the far end of a distance joint is attached to.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum JointTarget {
    /// A point on another body, given by the joint's target offset.
    Body(BodyKey),
    /// A fixed point in the world.
    Point(m::Vec2),
}

/// A distance joint restricts the relative motion of an owning body
/// and a target body or point in the world.
///
/// [`DistanceJointBuilder`][self::DistanceJointBuilder] is the preferred
/// way to create these, but the fields are public to allow in-place editing,
/// which is how ropes re-point them every tick.
#[derive(Clone, Copy, Debug)]
pub struct DistanceJoint {
    /// The body that owns this joint.
    pub owner: BodyKey,
    /// The body or point this joint is attached to.
    pub target: JointTarget,
    /// The desired distance.
    pub distance: f64,
    /// Inverse of stiffness, or how much the joint resists violation.
    pub compliance: f64,
    /// Offsets from each body's center of mass.
    /// The second offset is ignored when the target is a point.
    pub offsets: [m::Vec2; 2],
    /// Which directions to enforce the joint in.
    pub limit: ConstraintLimit,
    /// Force above which the joint breaks.
    pub break_force: Option<f64>,
    /// Torque above which the joint breaks.
    pub break_torque: Option<f64>,
    /// Disabled joints are skipped by the solver.
    pub enabled: bool,
}

/// Some constraints can be set to only work in one direction,
/// to e.g. set a maximum distance while allowing shorter distances.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConstraintLimit {
    /// Always apply a correction to the constraint.
    Eq,
    /// Only apply a correction if the constraint value is less than the target.
    Lt,
    /// Only apply a correction if the constraint value is greater than the target.
    Gt,
}

impl ConstraintLimit {
    /// Check whether a distance error (target minus actual) needs correcting.
    #[inline]
    pub fn applies_to(&self, error: f64) -> bool {
        match self {
            ConstraintLimit::Eq => true,
            ConstraintLimit::Lt => error < 0.0,
            ConstraintLimit::Gt => error > 0.0,
        }
    }
}

impl DistanceJoint {
    /// World-space position of the joint's far end, if the target still exists.
    pub fn target_point(&self, bodies: &super::EntitySet) -> Option<m::Vec2> {
        match self.target {
            JointTarget::Point(p) => Some(p),
            JointTarget::Body(key) => bodies.get_body(key).map(|b| b.pose * self.offsets[1]),
        }
    }
}

/// Notification that a joint's measured force or torque exceeded its limits.
///
/// The joint has been disabled by the time this is received.
#[derive(Clone, Copy, Debug)]
pub struct JointBreak {
    pub joint: JointKey,
    pub force: f64,
    pub torque: f64,
}

/// Key type to look up a joint stored in the physics world.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct JointKey(pub(super) thunderdome::Index);

/// A builder that allows ergonomic construction of distance joints.
#[derive(Clone, Copy, Debug)]
pub struct DistanceJointBuilder {
    owner: BodyKey,
    target: JointTarget,
    offsets: [m::Vec2; 2],
    limit: ConstraintLimit,
    compliance: f64,
    break_force: Option<f64>,
    break_torque: Option<f64>,
}

impl DistanceJointBuilder {
    /// Start building a joint.
    ///
    /// An owning body is required.
    /// If you don't connect the joint to something with
    /// `with_target`, it will be connected to the world origin.
    pub fn new(owner: BodyKey) -> Self {
        Self {
            owner,
            target: JointTarget::Point(m::Vec2::zero()),
            offsets: [m::Vec2::zero(); 2],
            limit: ConstraintLimit::Eq,
            compliance: 0.0,
            break_force: None,
            break_torque: None,
        }
    }

    /// Attach the joint to another body or a point in the world.
    pub fn with_target(mut self, target: JointTarget) -> Self {
        self.target = target;
        self
    }

    /// Set the origin point of the joint on the owning body
    /// relative to the center of mass.
    pub fn with_origin(mut self, point: m::Vec2) -> Self {
        self.offsets[0] = point;
        self
    }

    /// Set the origin point of the joint on the target body
    /// relative to the center of mass.
    pub fn with_target_origin(mut self, point: m::Vec2) -> Self {
        self.offsets[1] = point;
        self
    }

    /// Add compliance (inverse stiffness) to the joint.
    /// This makes it behave like a spring instead of a hard limit.
    ///
    /// Units of compliance are m/N.
    pub fn with_compliance(mut self, compliance: f64) -> Self {
        self.compliance = compliance;
        self
    }

    /// Set the limit for when to enforce the joint.
    pub fn with_limit(mut self, limit: ConstraintLimit) -> Self {
        self.limit = limit;
        self
    }

    /// Make the joint break when its force or torque goes over the given values.
    pub fn with_break_thresholds(mut self, force: Option<f64>, torque: Option<f64>) -> Self {
        self.break_force = force;
        self.break_torque = torque;
        self
    }

    pub fn build(self, distance: f64) -> DistanceJoint {
        DistanceJoint {
            owner: self.owner,
            target: self.target,
            distance,
            compliance: self.compliance,
            offsets: self.offsets,
            limit: self.limit,
            break_force: self.break_force,
            break_torque: self.break_torque,
            enabled: true,
        }
    }
}
