use crate::math as m;

/// A point where the rope changes direction around an obstacle.
///
/// The direction fields are unit vectors captured when the node was created,
/// or zero if there was no meaningful direction at the time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BendNode {
    pub position: m::Vec2,
    /// Surface normal of the obstacle at creation or at the last penetration correction.
    pub normal: m::Vec2,
    /// Whether this is the node the distance joint currently targets.
    pub is_active: bool,
    /// Simulation time of creation.
    pub creation_time: f64,
    /// Direction from the previous node (or the anchor) towards this node.
    pub direction_to_prev_node: m::Vec2,
    /// Direction from this node towards the body.
    pub direction_to_player: m::Vec2,
    /// Direction the body was moving in.
    pub player_movement_direction: m::Vec2,
    /// Index of the path history snapshot this node interrupted, if any.
    pub original_path_index: Option<usize>,
}

impl BendNode {
    /// Time since the node was created.
    #[inline]
    pub fn age(&self, now: f64) -> f64 {
        now - self.creation_time
    }
}
