//! Snapshots of the straight rope recorded while it wasn't bent,
//! kept around to inform the rope's length when it straightens out again.

use itertools::Itertools;

use super::{BendNode, RopeParameters};
use crate::{
    math as m,
    physics::{ColliderKey, QueryBackend},
};

/// A recorded unobstructed rope path that was about to run into an obstacle.
#[derive(Clone, Debug, PartialEq)]
pub struct RopePathSnapshot {
    pub points: Vec<m::Vec2>,
    pub record_time: f64,
    /// Whether a bend node has claimed this snapshot.
    pub is_active: bool,
    /// The obstacle the rope was expected to wrap around.
    pub obstacle: ColliderKey,
    pub obstacle_position: m::Vec2,
    pub obstacle_radius: f64,
}

impl RopePathSnapshot {
    /// Total length of the recorded path.
    pub fn length(&self) -> f64 {
        self.points
            .iter()
            .tuple_windows()
            .map(|(a, b)| (*b - *a).mag())
            .sum()
    }
}

/// Path snapshots in recording order.
#[derive(Clone, Debug, Default)]
pub struct PathHistory {
    snapshots: Vec<RopePathSnapshot>,
}

impl PathHistory {
    #[inline]
    pub fn snapshots(&self) -> &[RopePathSnapshot] {
        &self.snapshots
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    #[inline]
    pub fn get(&self, idx: usize) -> Option<&RopePathSnapshot> {
        self.snapshots.get(idx)
    }

    pub(super) fn clear(&mut self) {
        self.snapshots.clear();
    }

    /// Probe the straight path from `anchor` to `body` for obstacles near it
    /// and store a snapshot for each one not already tracked.
    ///
    /// Returns the number of snapshots added.
    pub(super) fn record(
        &mut self,
        anchor: m::Vec2,
        body: m::Vec2,
        time: f64,
        params: &RopeParameters,
        query: &impl QueryBackend,
    ) -> usize {
        let _span = tracy_span!("record rope history");

        let mut added = 0;
        let sample_count = params.history_samples;
        for sample in 1..=sample_count {
            let t = sample as f64 / (sample_count + 1) as f64;
            let point = anchor + (body - anchor) * t;
            for obstacle in
                query.overlap_circle_all(point, params.history_probe_radius, params.obstacle_layers)
            {
                let Some(closest) = query.closest_surface_point(obstacle, point) else {
                    continue;
                };
                let already_tracked = self.snapshots.iter().any(|snap| {
                    snap.obstacle == obstacle
                        || (snap.obstacle_position - closest).mag() <= snap.obstacle_radius
                });
                if already_tracked {
                    continue;
                }
                let Some((obstacle_position, obstacle_radius)) = query.bounding_circle(obstacle)
                else {
                    continue;
                };
                self.snapshots.push(RopePathSnapshot {
                    points: vec![anchor, body],
                    record_time: time,
                    is_active: false,
                    obstacle,
                    obstacle_position,
                    obstacle_radius,
                });
                added += 1;
            }
        }
        added
    }

    /// Find the most recent snapshot expecting a wrap around the given obstacle
    /// and mark it as claimed.
    pub(super) fn claim(&mut self, obstacle: ColliderKey, hit_point: m::Vec2) -> Option<usize> {
        let (idx, snap) = self.snapshots.iter_mut().enumerate().rev().find(|(_, snap)| {
            snap.obstacle == obstacle
                || (snap.obstacle_position - hit_point).mag() <= snap.obstacle_radius
        })?;
        snap.is_active = true;
        Some(idx)
    }

    /// Forget snapshots that are no longer useful, fixing up the indices nodes refer to them by.
    ///
    /// Claimed snapshots live as long as a node refers to them,
    /// unclaimed ones until they're older than `lifetime`.
    /// Returns the number of snapshots removed.
    pub(super) fn prune(&mut self, nodes: &mut [BendNode], time: f64, lifetime: f64) -> usize {
        let mut removed = 0;
        for idx in (0..self.snapshots.len()).rev() {
            let snap = &self.snapshots[idx];
            let stale = if snap.is_active {
                !nodes.iter().any(|n| n.original_path_index == Some(idx))
            } else {
                time - snap.record_time > lifetime
            };
            if !stale {
                continue;
            }

            self.snapshots.remove(idx);
            removed += 1;
            for node in nodes.iter_mut() {
                match node.original_path_index {
                    Some(i) if i == idx => node.original_path_index = None,
                    Some(i) if i > idx => node.original_path_index = Some(i - 1),
                    _ => {}
                }
            }
        }
        removed
    }

    /// The snapshot to restore the rope length from when the last node goes away:
    /// the newest claimed one if any, otherwise the newest one.
    pub(super) fn best_for_collapse(&self) -> Option<&RopePathSnapshot> {
        self.snapshots
            .iter()
            .rev()
            .find(|snap| snap.is_active)
            .or_else(|| self.snapshots.last())
    }
}
