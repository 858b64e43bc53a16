use super::Velocity;
use crate::math as m;

/// A body is something that moves, such as the character at the end of a rope
/// or a swinging platform the rope is hooked onto.
#[derive(Clone, Copy, Debug)]
pub struct Body {
    pub pose: m::Pose,
    pub velocity: Velocity,
    pub mass: Mass,
    pub moment_of_inertia: Mass,
}

impl Body {
    /// A particle responds to external forces but does not rotate.
    pub fn new_particle(mass: f64) -> Self {
        Self {
            pose: m::Pose::new(m::Vec2::zero(), m::Rotor2::identity()),
            velocity: Velocity::default(),
            mass: Mass::from(mass),
            moment_of_inertia: Mass::Infinite,
        }
    }

    /// Dynamic bodies respond to external forces and are allowed to rotate.
    pub fn new_dynamic(mass: f64, moment_of_inertia: f64) -> Self {
        Self {
            moment_of_inertia: Mass::from(moment_of_inertia),
            ..Self::new_particle(mass)
        }
    }

    /// Kinematic bodies are not affected by forces but still move with their velocity.
    pub fn new_kinematic() -> Self {
        Self {
            mass: Mass::Infinite,
            ..Self::new_particle(1.0)
        }
    }

    /// Set the position of the body in a builder-like chain.
    pub fn with_position(mut self, pos: m::Vec2) -> Self {
        self.pose.translation = pos;
        self
    }

    /// Set the velocity of the body in a builder-like chain.
    pub fn with_velocity(mut self, vel: Velocity) -> Self {
        self.velocity = vel;
        self
    }

    #[inline]
    pub fn position(&self) -> m::Vec2 {
        self.pose.translation
    }

    /// Check whether the body has finite mass or moment of inertia, allowing forces to have an
    /// effect on it.
    #[inline]
    pub fn sees_forces(&self) -> bool {
        !matches!(
            (self.mass, self.moment_of_inertia),
            (Mass::Infinite, Mass::Infinite)
        )
    }
}

/// Mass or moment of inertia of a body, which can be infinite.
///
/// This stores both a mass value and its inverse, because calculating inverse mass
/// is expensive and needed a lot in physics calculations.
#[derive(Clone, Copy, Debug)]
pub enum Mass {
    Finite { mass: f64, inverse: f64 },
    Infinite,
}

impl From<f64> for Mass {
    #[inline]
    fn from(mass: f64) -> Self {
        Mass::Finite {
            mass,
            inverse: 1.0 / mass,
        }
    }
}

impl Mass {
    /// Get the inverse of the mass, which is zero if the mass is infinite.
    #[inline]
    pub fn inv(&self) -> f64 {
        match self {
            Mass::Finite { inverse, .. } => *inverse,
            Mass::Infinite => 0.0,
        }
    }
}
