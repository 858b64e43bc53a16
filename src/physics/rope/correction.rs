//! Keeping bend nodes apart from each other and out of obstacles.

use super::{BendRope, RemovalReason};
use crate::{math as m, physics::QueryBackend};

impl BendRope {
    /// Remove the body-side node of every pair closer than `min_node_distance`,
    /// walking from the body towards the anchor until no such pair is left.
    pub(super) fn enforce_spacing(&mut self) {
        let min_dist = self.params.min_node_distance;
        while let Some(idx) = (1..self.nodes.len())
            .rev()
            .find(|&i| (self.nodes[i].position - self.nodes[i - 1].position).mag() < min_dist)
        {
            self.remove_node(idx, RemovalReason::TooClose);
        }
    }

    /// Push nodes that ended up inside obstacles back out to the surface.
    pub(super) fn resolve_penetration(&mut self, query: &impl QueryBackend) {
        let _span = tracy_span!("resolve rope penetration");

        let layers = self.params.obstacle_layers;
        let push_dist = self.params.node_radius + self.params.penetration_margin;
        for pass in 0..self.params.penetration_passes {
            let mut corrected = false;
            for idx in 0..self.nodes.len() {
                let node = self.nodes[idx];
                let Some(&obstacle) = query
                    .overlap_circle_all(node.position, self.params.node_radius, layers)
                    .first()
                else {
                    continue;
                };
                let Some(surface) = query.closest_surface_point(obstacle, node.position) else {
                    continue;
                };

                let inside = query
                    .overlap_circle_all(node.position, 0.0, layers)
                    .contains(&obstacle);
                let from_surface = if inside {
                    surface - node.position
                } else {
                    node.position - surface
                };
                let geometric = m::normalized_or_zero(from_surface, 1e-9);
                // the stored normal is better at corners, as long as it points out of the surface
                // and actually gets the node clear
                let stored_fits = node.normal != m::Vec2::zero()
                    && (geometric == m::Vec2::zero() || node.normal.dot(geometric) > 0.0)
                    && !query
                        .overlap_circle_all(
                            surface + node.normal * push_dist,
                            self.params.node_radius,
                            layers,
                        )
                        .contains(&obstacle);
                let outward = if stored_fits { node.normal } else { geometric };
                if outward == m::Vec2::zero() {
                    continue;
                }

                let new_pos = surface + outward * push_dist;
                let node = &mut self.nodes[idx];
                node.position = new_pos;
                node.normal = outward;
                if node.is_active {
                    self.proxy.pose.translation = new_pos;
                }
                corrected = true;
            }
            if !corrected {
                break;
            }
            log::trace!("rope penetration pass {pass} moved nodes");
        }
    }
}
