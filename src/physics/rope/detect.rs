//! Finding new obstacle contacts along the rope.

use super::{BendNode, BendRope, RopeEvent, TickFrame};
use crate::{
    math as m,
    physics::{LayerMask, QueryBackend, Ray, RayHit},
};

/// Longest step between rays cast along a rope segment.
const MAX_SCAN_STEP: f64 = 0.1;

impl BendRope {
    /// Scan every segment of the rope for obstacles and insert bend nodes where they're hit.
    pub(super) fn detect_contacts(&mut self, frame: &TickFrame, query: &impl QueryBackend) {
        let _span = tracy_span!("detect rope contacts");

        let step = self.params.min_node_distance.min(MAX_SCAN_STEP);
        let mut segment = 0;
        let mut rescanned = false;
        loop {
            let path = self.path_points(frame);
            let (Some(&start), Some(&end)) = (path.get(segment), path.get(segment + 1)) else {
                break;
            };
            // a new node splits the segment, so look at the same index once more
            if self.scan_segment(start, end, step, frame, query) && !rescanned {
                rescanned = true;
                continue;
            }
            rescanned = false;
            segment += 1;
        }
    }

    fn path_points(&self, frame: &TickFrame) -> Vec<m::Vec2> {
        let mut path = Vec::with_capacity(self.nodes.len() + 2);
        path.push(frame.anchor);
        path.extend(self.nodes.iter().map(|n| n.position));
        path.push(frame.body);
        path
    }

    /// Cast short rays along the segment. Returns true if a node was inserted.
    fn scan_segment(
        &mut self,
        start: m::Vec2,
        end: m::Vec2,
        step: f64,
        frame: &TickFrame,
        query: &impl QueryBackend,
    ) -> bool {
        let length = (end - start).mag();
        let Some(dir) = m::Unit::try_new(end - start, 1e-9) else {
            return false;
        };

        let mut travelled = 0.0;
        while travelled < length {
            let ray = Ray {
                start: start + *dir * travelled,
                dir,
            };
            // rays don't report the collider they start in,
            // so a segment already cutting through an obstacle is caught here
            if let Some(hit) = inside_hit(ray.start, self.params.obstacle_layers, query) {
                if self.try_insert(hit, frame) {
                    return true;
                }
                travelled += step;
                continue;
            }
            let ray_len = step.min(length - travelled);
            if let Some(hit) = query.cast_ray(ray, ray_len, self.params.obstacle_layers) {
                if self.try_insert(hit, frame) {
                    return true;
                }
            }
            travelled += step;
        }
        false
    }

    /// Insert a node at a ray hit unless it's excluded. Returns true if a node was inserted.
    fn try_insert(&mut self, hit: RayHit, frame: &TickFrame) -> bool {
        let point = hit.point;
        if (point - frame.body).mag() < self.params.no_bend_radius()
            || (point - frame.anchor).mag() < self.params.hook_exclusion_radius
        {
            return false;
        }
        if self
            .nodes
            .iter()
            .any(|n| (n.position - point).mag() < self.params.min_node_distance)
        {
            return false;
        }
        if self.nodes.len() >= self.params.max_nodes {
            log::trace!("bend node limit reached, ignoring hit at {point:?}");
            return false;
        }
        if frame.time - self.last_insertion_time < self.params.insertion_interval {
            return false;
        }

        // ordered by straight-line distance to the anchor, not by position along the rope
        let dist_to_anchor = (point - frame.anchor).mag();
        let index = self
            .nodes
            .iter()
            .position(|n| (n.position - frame.anchor).mag() > dist_to_anchor)
            .unwrap_or(self.nodes.len());

        let prev = match index {
            0 => frame.anchor,
            _ => self.nodes[index - 1].position,
        };
        let direction_to_player = m::normalized_or_zero(frame.body - point, 1e-9);
        let node = BendNode {
            position: point,
            normal: *hit.normal,
            is_active: false,
            creation_time: frame.time,
            direction_to_prev_node: m::normalized_or_zero(point - prev, 1e-9),
            direction_to_player,
            player_movement_direction: frame
                .movement_dir(self.params.min_movement)
                .unwrap_or(direction_to_player),
            original_path_index: self.history.claim(hit.collider, point),
        };
        self.nodes.insert(index, node);
        self.last_insertion_time = frame.time;
        self.events.push(RopeEvent::NodeInserted {
            index,
            position: point,
        });
        rope_debug!(
            self.params,
            "inserted bend node {index} at {point:?}, {} total",
            self.nodes.len()
        );
        true
    }
}

/// A hit on the surface of the obstacle containing `point`, if there is one.
fn inside_hit(
    point: m::Vec2,
    layers: LayerMask,
    query: &impl QueryBackend,
) -> Option<RayHit> {
    let collider = query.overlap_circle(point, 0.0, layers)?;
    let surface = query.closest_surface_point(collider, point)?;
    let normal = m::Unit::try_new(surface - point, 1e-9)?;
    Some(RayHit {
        collider,
        t: 0.0,
        point: surface,
        normal,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::{Body, Collider, PhysicsWorld, RopeParameters};

    fn frame(anchor: m::Vec2, body: m::Vec2, time: f64) -> TickFrame {
        TickFrame {
            anchor,
            body,
            movement: m::Vec2::zero(),
            time,
        }
    }

    fn rope_in(world: &mut PhysicsWorld, params: RopeParameters) -> BendRope {
        let body = world.entities.insert_body(Body::new_particle(1.0));
        BendRope::new(body, params)
    }

    #[test]
    fn single_obstacle_creates_one_node_at_hit_point() {
        let mut world = PhysicsWorld::default();
        world
            .entities
            .insert_collider(Collider::new_circle(1.0));
        let mut rope = rope_in(&mut world, RopeParameters::default());

        let f = frame(m::Vec2::new(0.0, 5.0), m::Vec2::new(0.0, -5.0), 1.0);
        rope.detect_contacts(&f, &world);
        assert_eq!(rope.nodes.len(), 1);
        let node = rope.nodes[0];
        assert!((node.position - m::Vec2::new(0.0, 1.0)).mag() < 1e-9);
        assert!((node.normal - m::Vec2::unit_y()).mag() < 1e-9);
        assert!((node.direction_to_prev_node - m::Vec2::new(0.0, -1.0)).mag() < 1e-9);
        assert!((node.direction_to_player - m::Vec2::new(0.0, -1.0)).mag() < 1e-9);
        // body wasn't moving
        assert_eq!(node.player_movement_direction, node.direction_to_player);
    }

    #[test]
    fn hits_near_the_ends_are_ignored() {
        let mut world = PhysicsWorld::default();
        // around the anchor and around the body
        world
            .entities
            .insert_collider(Collider::new_circle(0.2).with_position(m::Vec2::new(0.0, 5.0)));
        world
            .entities
            .insert_collider(Collider::new_circle(0.5).with_position(m::Vec2::new(0.0, -5.0)));
        let mut rope = rope_in(&mut world, RopeParameters::default());

        let f = frame(m::Vec2::new(0.0, 5.0), m::Vec2::new(0.0, -5.0), 1.0);
        rope.detect_contacts(&f, &world);
        assert!(rope.nodes.is_empty());
    }

    #[test]
    fn segment_through_an_obstacle_gets_a_node_on_the_far_side() {
        let mut world = PhysicsWorld::default();
        world
            .entities
            .insert_collider(Collider::new_circle(1.0));
        let mut rope = rope_in(&mut world, RopeParameters::default());
        let top = m::Vec2::new(0.0, 1.06);
        rope.nodes.push(BendNode {
            position: top,
            normal: m::Vec2::unit_y(),
            is_active: true,
            creation_time: 0.0,
            direction_to_prev_node: m::Vec2::new(1.0, -1.0).normalized(),
            direction_to_player: m::Vec2::new(0.0, -1.0),
            player_movement_direction: m::Vec2::new(0.0, -1.0),
            original_path_index: None,
        });

        // every ray after the node starts inside the circle
        let f = frame(m::Vec2::new(-3.0, 3.0), m::Vec2::new(0.0, -4.0), 1.0);
        rope.detect_contacts(&f, &world);
        assert_eq!(rope.nodes.len(), 2);
        assert_eq!(rope.nodes[0].position, top);
        let far_side = rope.nodes[1];
        assert!((far_side.position - m::Vec2::new(0.0, -1.0)).mag() < 1e-9);
        assert!((far_side.normal - m::Vec2::new(0.0, -1.0)).mag() < 1e-9);
    }

    #[test]
    fn insertion_interval_limits_node_rate() {
        let mut world = PhysicsWorld::default();
        for y in [2.0, -2.0] {
            world
                .entities
                .insert_collider(Collider::new_circle(0.5).with_position(m::Vec2::new(0.0, y)));
        }
        let mut rope = rope_in(&mut world, RopeParameters::default());

        let f = frame(m::Vec2::new(0.0, 5.0), m::Vec2::new(0.0, -5.0), 1.0);
        rope.detect_contacts(&f, &world);
        assert_eq!(rope.nodes.len(), 1);
        rope.detect_contacts(&f, &world);
        assert_eq!(rope.nodes.len(), 1);

        let later = frame(f.anchor, f.body, 1.1);
        rope.detect_contacts(&later, &world);
        assert_eq!(rope.nodes.len(), 2);
        assert!(rope.nodes[0].position.y > rope.nodes[1].position.y);
    }

    #[test]
    fn node_limit_is_respected() {
        let mut world = PhysicsWorld::default();
        for y in [3.0, 1.0, -1.0, -3.0] {
            world
                .entities
                .insert_collider(Collider::new_circle(0.4).with_position(m::Vec2::new(0.0, y)));
        }
        let params = RopeParameters {
            max_nodes: 2,
            insertion_interval: 0.0,
            ..Default::default()
        };
        let mut rope = rope_in(&mut world, params);

        let f = frame(m::Vec2::new(0.0, 5.0), m::Vec2::new(0.0, -5.0), 1.0);
        for _ in 0..3 {
            rope.detect_contacts(&f, &world);
        }
        assert_eq!(rope.nodes.len(), 2);
    }

    #[test]
    fn new_nodes_are_ordered_by_distance_to_anchor() {
        let mut world = PhysicsWorld::default();
        world
            .entities
            .insert_collider(Collider::new_circle(0.3).with_position(m::Vec2::new(2.6, -1.2)));
        let mut rope = rope_in(&mut world, RopeParameters::default());
        let far = m::Vec2::new(5.0, 0.0);
        rope.nodes.push(BendNode {
            position: far,
            normal: m::Vec2::unit_y(),
            is_active: true,
            creation_time: 0.0,
            direction_to_prev_node: m::Vec2::unit_x(),
            direction_to_player: m::Vec2::zero(),
            player_movement_direction: m::Vec2::zero(),
            original_path_index: None,
        });

        // the hit is on the segment after the existing node,
        // but closer to the anchor in a straight line
        let f = frame(m::Vec2::zero(), m::Vec2::new(1.0, -2.0), 1.0);
        rope.detect_contacts(&f, &world);
        assert_eq!(rope.nodes.len(), 2);
        assert!((rope.nodes[0].position - m::Vec2::new(2.868, -1.066)).mag() < 1e-3);
        assert_eq!(rope.nodes[1].position, far);
        assert!(matches!(
            rope.drain_events().next(),
            Some(RopeEvent::NodeInserted { index: 0, .. })
        ));
    }
}
