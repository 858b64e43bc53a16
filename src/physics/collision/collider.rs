use crate::math as m;

/// A static obstacle shape placed in the world.
///
/// Rope bend nodes are created where the rope's segments hit these.
#[derive(Clone, Copy, Debug)]
pub struct Collider {
    pub shape: ColliderShape,
    /// Placement of the collider's center in the world.
    pub pose: m::Pose,
    /// Index of the layer the collider belongs to, see [`LayerMask`][super::LayerMask].
    pub layer: usize,
}

/// The physical shape of a collider.
///
/// All shapes are convex and centered at the collider's pose.
#[derive(Clone, Copy, Debug)]
pub enum ColliderShape {
    Circle {
        r: f64,
    },
    /// The rect collider stores its side lengths halved because this makes
    /// intersection tests easier.
    Rect {
        hw: f64,
        hh: f64,
    },
    /// A capsule is a line segment along the local x axis with half-length `hl`,
    /// padded by radius `r`.
    Capsule {
        hl: f64,
        r: f64,
    },
}

impl Collider {
    /// Create a circle collider from a radius.
    pub fn new_circle(radius: f64) -> Self {
        Self::new(ColliderShape::Circle { r: radius })
    }

    /// Create a rect collider with both sides set to the same length.
    pub fn new_square(side_length: f64) -> Self {
        Self::new_rect(side_length, side_length)
    }

    /// Create a rect collider with two different side lengths.
    pub fn new_rect(width: f64, height: f64) -> Self {
        Self::new(ColliderShape::Rect {
            hw: width / 2.0,
            hh: height / 2.0,
        })
    }

    /// Create a capsule collider. `length` is the length of the straight part,
    /// not including the rounded ends.
    pub fn new_capsule(length: f64, radius: f64) -> Self {
        Self::new(ColliderShape::Capsule {
            hl: length / 2.0,
            r: radius,
        })
    }

    fn new(shape: ColliderShape) -> Self {
        Self {
            shape,
            pose: m::Pose::new(m::Vec2::zero(), m::Rotor2::identity()),
            layer: 0,
        }
    }

    /// Set the pose of the collider in a builder-like chain.
    pub fn with_pose(mut self, pose: m::Pose) -> Self {
        self.pose = pose;
        self
    }

    /// Place the collider at a position without rotation.
    pub fn with_position(mut self, pos: m::Vec2) -> Self {
        self.pose.translation = pos;
        self
    }

    /// Set the rotation of the collider.
    pub fn with_rotation(mut self, angle: m::Angle) -> Self {
        self.pose.rotation = angle.into();
        self
    }

    /// Set the collision layer of the collider.
    pub fn with_layer(mut self, layer: usize) -> Self {
        self.layer = layer;
        self
    }

    /// Radius of the smallest circle around the collider's center
    /// that contains the whole shape.
    pub fn bounding_radius(&self) -> f64 {
        self.shape.bounding_radius()
    }
}

impl ColliderShape {
    pub fn bounding_radius(&self) -> f64 {
        match *self {
            ColliderShape::Circle { r } => r,
            ColliderShape::Rect { hw, hh } => (hw * hw + hh * hh).sqrt(),
            ColliderShape::Capsule { hl, r } => hl + r,
        }
    }
}
