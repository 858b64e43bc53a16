//! A 2D rope that wraps around obstacles.
//!
//! The rope is a distance joint between a moving body and an anchor, plus a chain of
//! bend nodes discovered by scanning the rope for obstacle contacts every tick.
//! [`physics::PhysicsWorld`] is a small world for the rope to live in;
//! the rope only needs spatial queries from it, through [`physics::QueryBackend`].

/// Profiling span that lasts until the end of the enclosing scope.
/// Does nothing unless the `tracy` feature is enabled and a client is running.
macro_rules! tracy_span {
    ($name:expr) => {
        tracy_client::Client::running()
            .map(|client| client.span(tracy_client::span_location!($name), 0))
    };
}

pub mod math;
pub use math::{uv, Angle, Pose, Rotor2, Unit, Vec2};

pub mod physics;
pub use physics::{
    body::{Body, Mass},
    collision::{self, Collider, ColliderShape, LayerMask, QueryBackend, Ray, RayHit},
    constraint::{
        ConstraintLimit, DistanceJoint, DistanceJointBuilder, JointBreak, JointKey, JointTarget,
    },
    forcefield,
    rope::{
        self, Anchor, BendNode, BendRope, BreakAction, BreakOutcome, ParamError, PathHistory,
        ProxyPoint, RemovalReason, RopeEvent, RopeParameters, RopePathSnapshot,
    },
    BodyKey, ColliderKey, EntitySet, PhysicsWorld, Velocity,
};
