//! Deciding which bend nodes the rope doesn't need anymore.

use super::{BendRope, RemovalReason, TickFrame};
use crate::{math as m, physics::QueryBackend};

impl BendRope {
    /// Remove every node past its minimum lifetime that is no longer needed.
    pub(super) fn remove_obsolete_nodes(&mut self, frame: &TickFrame, query: &impl QueryBackend) {
        let _span = tracy_span!("remove rope nodes");

        let movement = frame.movement_dir(self.params.min_movement);
        let doomed: Vec<(usize, RemovalReason)> = (0..self.nodes.len())
            .filter(|&idx| self.nodes[idx].age(frame.time) >= self.params.min_node_lifetime)
            .filter_map(|idx| {
                self.removal_reason(idx, movement, frame, query)
                    .map(|reason| (idx, reason))
            })
            .collect();

        // back to front so the remaining indices stay valid
        for (idx, reason) in doomed.into_iter().rev() {
            self.remove_node(idx, reason);
        }
    }

    fn removal_reason(
        &self,
        idx: usize,
        movement: Option<m::Vec2>,
        frame: &TickFrame,
        query: &impl QueryBackend,
    ) -> Option<RemovalReason> {
        if self.obstacle_cleared(idx, frame, query) {
            return Some(RemovalReason::ObstacleCleared);
        }

        let node = &self.nodes[idx];
        let params = &self.params;
        let to_body = m::normalized_or_zero(frame.body - node.position, 1e-9);
        let to_anchor = m::normalized_or_zero(frame.anchor - node.position, 1e-9);
        let reversed = movement
            .is_some_and(|mv| node.player_movement_direction.dot(mv) < params.swing_back_dot_threshold);

        if let Some(movement) = movement {
            if reversed
                && m::angle_between(node.direction_to_player, to_body).rad()
                    > params.swing_angle_threshold.rad()
                && movement.dot(to_body).abs() < params.movement_parallel_threshold
            {
                return Some(RemovalReason::SwungBack);
            }
        }

        // doesn't depend on the body moving
        if node.direction_to_prev_node.dot(to_anchor) > params.similarity_dot_threshold {
            return Some(RemovalReason::Straightened);
        }

        if reversed && to_body.dot(node.direction_to_player) > params.passed_through_dot_threshold {
            return Some(RemovalReason::PassedThrough);
        }

        None
    }

    /// True if the node is outside every obstacle and its neighbours can see each other.
    ///
    /// The ends of the checked segment are trimmed the same way as contact detection,
    /// so obstacles touching the anchor or the body don't keep nodes alive.
    fn obstacle_cleared(&self, idx: usize, frame: &TickFrame, query: &impl QueryBackend) -> bool {
        let node = &self.nodes[idx];
        let layers = self.params.obstacle_layers;
        if query
            .overlap_circle(node.position, self.params.node_radius, layers)
            .is_some()
        {
            return false;
        }

        let is_first = idx == 0;
        let is_last = idx + 1 == self.nodes.len();
        let prev = if is_first {
            frame.anchor
        } else {
            self.nodes[idx - 1].position
        };
        let next = if is_last {
            frame.body
        } else {
            self.nodes[idx + 1].position
        };

        let length = (next - prev).mag();
        let Some(dir) = m::Unit::try_new(next - prev, 1e-9) else {
            return true;
        };
        let start_trim = if is_first {
            self.params.hook_exclusion_radius
        } else {
            0.0
        };
        let end_trim = if is_last {
            self.params.no_bend_radius()
        } else {
            0.0
        };
        if start_trim + end_trim >= length {
            return true;
        }

        !query.line_of_sight_blocked(prev + *dir * start_trim, next - *dir * end_trim, layers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::{Body, Collider, PhysicsWorld, RopeParameters};

    use super::super::{BendNode, RopeEvent};

    fn node_at(position: m::Vec2, anchor: m::Vec2, body: m::Vec2, movement: m::Vec2) -> BendNode {
        BendNode {
            position,
            normal: m::Vec2::unit_y(),
            is_active: false,
            creation_time: 0.0,
            direction_to_prev_node: m::normalized_or_zero(position - anchor, 1e-9),
            direction_to_player: m::normalized_or_zero(body - position, 1e-9),
            player_movement_direction: movement,
            original_path_index: None,
        }
    }

    fn rope_with_node(node: BendNode) -> BendRope {
        let body = PhysicsWorld::default()
            .entities
            .insert_body(Body::new_particle(1.0));
        let mut rope = BendRope::new(body, RopeParameters::default());
        rope.nodes.push(node);
        rope
    }

    fn frame(anchor: m::Vec2, body: m::Vec2, movement: m::Vec2, time: f64) -> TickFrame {
        TickFrame {
            anchor,
            body,
            movement,
            time,
        }
    }

    /// A body hanging to the lower right of a circle,
    /// with the rope bent over the circle's top while swinging right.
    fn bent_over_circle() -> (PhysicsWorld, m::Vec2, m::Vec2, BendNode) {
        let mut world = PhysicsWorld::default();
        world
            .entities
            .insert_collider(Collider::new_circle(1.0));
        let anchor = m::Vec2::new(-4.0, 2.0);
        let node_pos = m::Vec2::new(0.0, 1.06);
        let body = m::Vec2::new(4.0, -2.0);
        let node = node_at(node_pos, anchor, body, m::Vec2::new(1.0, 0.0));
        (world, anchor, body, node)
    }

    fn reason(rope: &BendRope, f: &TickFrame, world: &PhysicsWorld) -> Option<RemovalReason> {
        rope.removal_reason(0, f.movement_dir(1e-3), f, world)
    }

    #[test]
    fn young_nodes_are_kept() {
        let world = PhysicsWorld::default();
        let anchor = m::Vec2::new(-4.0, 0.0);
        let body = m::Vec2::new(4.0, 0.0);
        let mut rope = rope_with_node(node_at(m::Vec2::zero(), anchor, body, m::Vec2::zero()));
        rope.remove_obsolete_nodes(&frame(anchor, body, m::Vec2::zero(), 0.1), &world);
        assert_eq!(rope.nodes.len(), 1);
        rope.remove_obsolete_nodes(&frame(anchor, body, m::Vec2::zero(), 0.3), &world);
        assert!(rope.nodes.is_empty());
    }

    #[test]
    fn node_stays_while_obstacle_blocks() {
        let (world, anchor, body, node) = bent_over_circle();
        let mut rope = rope_with_node(node);
        // still moving the same way as when the node was made
        let f = frame(anchor, body, m::Vec2::new(0.05, 0.0), 1.0);
        rope.remove_obsolete_nodes(&f, &world);
        assert_eq!(rope.nodes.len(), 1);
    }

    #[test]
    fn node_goes_when_obstacle_does() {
        let (_, anchor, body, node) = bent_over_circle();
        let mut rope = rope_with_node(node);
        let empty = PhysicsWorld::default();
        rope.remove_obsolete_nodes(&frame(anchor, body, m::Vec2::zero(), 1.0), &empty);
        assert!(rope.nodes.is_empty());
        assert_eq!(
            rope.drain_events().next(),
            Some(RopeEvent::NodeRemoved {
                position: node.position,
                reason: RemovalReason::ObstacleCleared,
            })
        );
    }

    #[test]
    fn swinging_back_removes_node() {
        let (world, anchor, _, node) = bent_over_circle();
        let rope = rope_with_node(node);
        // body came back a bit, moving against its original direction
        let body = m::Vec2::new(3.0, -2.5);
        let f = frame(anchor, body, m::Vec2::new(-0.05, 0.0), 1.0);
        assert_eq!(reason(&rope, &f, &world), Some(RemovalReason::SwungBack));
    }

    #[test]
    fn moving_along_the_rope_is_not_a_swing() {
        let (world, anchor, _, node) = bent_over_circle();
        let rope = rope_with_node(node);
        let body = m::Vec2::new(3.0, -2.5);
        // reeling in straight towards the node
        let to_node = m::normalized_or_zero(node.position - body, 1e-9);
        let f = frame(anchor, body, to_node * 0.05, 1.0);
        assert_eq!(reason(&rope, &f, &world), None);
    }

    #[test]
    fn straightened_bend_is_removed() {
        let (world, _, _, mut node) = bent_over_circle();
        // made when the anchor was straight to the left of the node
        node.direction_to_prev_node = m::Vec2::new(1.0, 0.0);
        let rope = rope_with_node(node);
        // and now the anchor is straight to the right
        let anchor = m::Vec2::new(4.0, 1.06);
        let body = m::Vec2::new(-4.0, -2.0);
        let f = frame(anchor, body, m::Vec2::new(0.05, 0.0), 1.0);
        assert_eq!(reason(&rope, &f, &world), Some(RemovalReason::Straightened));
    }

    #[test]
    fn straightened_bend_is_removed_with_the_body_at_rest() {
        let (world, _, _, mut node) = bent_over_circle();
        node.direction_to_prev_node = m::Vec2::new(1.0, 0.0);
        let rope = rope_with_node(node);
        // the anchor swung over to the other side while the body hung still
        let anchor = m::Vec2::new(4.0, 1.06);
        let body = m::Vec2::new(-4.0, -2.0);
        let f = frame(anchor, body, m::Vec2::zero(), 1.0);
        assert_eq!(f.movement_dir(1e-3), None);
        assert_eq!(reason(&rope, &f, &world), Some(RemovalReason::Straightened));
    }

    #[test]
    fn passing_back_through_the_bend_is_removed() {
        let (world, anchor, body, node) = bent_over_circle();
        let rope = rope_with_node(node);
        // same direction from node to body as at creation, but moving back
        let back = -node.direction_to_player * 0.05;
        let f = frame(anchor, body, back, 1.0);
        assert_eq!(reason(&rope, &f, &world), Some(RemovalReason::PassedThrough));
    }
}
