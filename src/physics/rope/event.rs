use crate::math as m;

/// Things that happened to a rope during a tick or an API call.
///
/// Events queue up in the rope until they're taken out with
/// [`BendRope::drain_events`][super::BendRope::drain_events].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RopeEvent {
    NodeInserted {
        index: usize,
        position: m::Vec2,
    },
    NodeRemoved {
        position: m::Vec2,
        reason: RemovalReason,
    },
    /// The last bend node was removed and the rope went straight to the anchor again.
    Collapsed { distance: f64 },
    /// All bend nodes were cleared through the API.
    Cleared,
    /// The distance joint broke.
    Broken { force: f64, torque: f64 },
}

/// Why a bend node was removed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RemovalReason {
    /// The node is out of any obstacle and its neighbours see each other.
    ObstacleCleared,
    /// The body reversed its swing past the node.
    SwungBack,
    /// The bend towards the anchor straightened out.
    Straightened,
    /// The body swung back through the node's original bend direction.
    PassedThrough,
    /// Too close to the previous node.
    TooClose,
}
