//! A rope that bends around obstacles.
//!
//! The rope itself is a single [`DistanceJoint`][crate::physics::DistanceJoint]
//! between a moving body and an anchor. When the straight line between them runs into an
//! obstacle, a bend node is placed at the contact point and the joint is re-pointed to
//! the node closest to the body, so the body swings around the obstacle instead of through it.
//! Nodes are removed again when the obstacle is out of the way or the body swings back.

use crate::{
    math as m,
    physics::{
        BodyKey, ConstraintLimit, DistanceJointBuilder, EntitySet, JointBreak, JointKey,
        JointTarget, PhysicsWorld,
    },
};

/// Debug-level log line that only appears with `debug_logging` enabled in the rope parameters.
macro_rules! rope_debug {
    ($params:expr, $($arg:tt)+) => {
        if $params.debug_logging {
            log::debug!($($arg)+);
        }
    };
}

mod correction;
mod detect;
mod event;
pub use event::{RemovalReason, RopeEvent};
mod history;
pub use history::{PathHistory, RopePathSnapshot};
mod node;
pub use node::BendNode;
mod params;
pub use params::{BreakAction, ParamError, RopeParameters};
mod removal;

//

/// What the far end of a rope is attached to.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Anchor {
    /// A fixed point in the world.
    Point(m::Vec2),
    /// A point on a body, relative to its pose.
    Body { body: BodyKey, offset: m::Vec2 },
}

impl From<m::Vec2> for Anchor {
    fn from(point: m::Vec2) -> Self {
        Anchor::Point(point)
    }
}

impl Anchor {
    /// World-space position of the anchor, if its body still exists.
    pub fn position(&self, entities: &EntitySet) -> Option<m::Vec2> {
        match *self {
            Anchor::Point(p) => Some(p),
            Anchor::Body { body, offset } => entities.get_body(body).map(|b| b.pose * offset),
        }
    }

    fn joint_target(&self) -> (JointTarget, m::Vec2) {
        match *self {
            Anchor::Point(p) => (JointTarget::Point(p), m::Vec2::zero()),
            Anchor::Body { body, offset } => (JointTarget::Body(body), offset),
        }
    }
}

/// The point the distance joint pulls towards while the rope is bent.
///
/// It follows the bend node closest to the body.
#[derive(Clone, Copy, Debug)]
pub struct ProxyPoint {
    pub pose: m::Pose,
    pub active: bool,
}

impl Default for ProxyPoint {
    fn default() -> Self {
        Self {
            pose: m::Pose::new(m::Vec2::zero(), m::Rotor2::identity()),
            active: false,
        }
    }
}

impl ProxyPoint {
    #[inline]
    pub fn position(&self) -> m::Vec2 {
        self.pose.translation
    }
}

/// What the owner of a rope should do after its joint broke.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BreakOutcome {
    /// The joint was removed from the world. Drop the rope.
    Destroyed,
    /// The joint was disabled and the rope can be shot again.
    Disabled,
}

/// Positions and timing sampled once at the start of a tick.
#[derive(Clone, Copy, Debug)]
pub(crate) struct TickFrame {
    pub anchor: m::Vec2,
    pub body: m::Vec2,
    /// Body displacement since the last fixed tick.
    pub movement: m::Vec2,
    pub time: f64,
}

impl TickFrame {
    /// Direction the body is moving in, if it moved at least `min_movement`.
    #[inline]
    pub fn movement_dir(&self, min_movement: f64) -> Option<m::Vec2> {
        m::Unit::try_new(self.movement, min_movement).map(m::Unit::into_inner)
    }
}

/// A rope between a body and an anchor that wraps around obstacles.
///
/// Call [`tick_variable`][Self::tick_variable] and then
/// [`tick_fixed`][Self::tick_fixed] once per frame before
/// [`PhysicsWorld::tick`][crate::physics::PhysicsWorld::tick].
#[derive(Clone, Debug)]
pub struct BendRope {
    params: RopeParameters,
    body: BodyKey,
    anchor: Option<Anchor>,
    joint: Option<JointKey>,
    distance: f64,
    enabled: bool,
    bending_enabled: bool,
    nodes: Vec<BendNode>,
    history: PathHistory,
    proxy: ProxyPoint,
    events: Vec<RopeEvent>,
    time: f64,
    last_insertion_time: f64,
    last_history_time: f64,
    last_fixed_position: Option<m::Vec2>,
}

impl BendRope {
    /// Create a rope for a body. It does nothing until
    /// [`shoot_rope`][Self::shoot_rope] attaches it to something.
    ///
    /// Invalid parameters are logged and clamped into range.
    pub fn new(body: BodyKey, params: RopeParameters) -> Self {
        let params = Self::checked_params(params);
        Self {
            distance: params.min_distance,
            params,
            body,
            anchor: None,
            joint: None,
            enabled: false,
            bending_enabled: true,
            nodes: Vec::new(),
            history: PathHistory::default(),
            proxy: ProxyPoint::default(),
            events: Vec::new(),
            time: 0.0,
            last_insertion_time: f64::NEG_INFINITY,
            last_history_time: f64::NEG_INFINITY,
            last_fixed_position: None,
        }
    }

    fn checked_params(params: RopeParameters) -> RopeParameters {
        match params.validate() {
            Ok(()) => params,
            Err(errors) => {
                for err in errors {
                    log::warn!("Invalid rope parameter: {err}");
                }
                params.clamped()
            }
        }
    }

    //
    // accessors
    //

    #[inline]
    pub fn params(&self) -> &RopeParameters {
        &self.params
    }

    #[inline]
    pub fn body(&self) -> BodyKey {
        self.body
    }

    #[inline]
    pub fn anchor(&self) -> Option<Anchor> {
        self.anchor
    }

    #[inline]
    pub fn joint(&self) -> Option<JointKey> {
        self.joint
    }

    /// The rope length used while the rope is straight.
    #[inline]
    pub fn distance(&self) -> f64 {
        self.distance
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[inline]
    pub fn nodes(&self) -> &[BendNode] {
        &self.nodes
    }

    #[inline]
    pub fn history(&self) -> &PathHistory {
        &self.history
    }

    #[inline]
    pub fn proxy(&self) -> &ProxyPoint {
        &self.proxy
    }

    /// Take out every event queued since the last call.
    pub fn drain_events(&mut self) -> std::vec::Drain<'_, RopeEvent> {
        self.events.drain(..)
    }

    /// The points the rope passes through: the anchor, every bend node, and the body.
    ///
    /// Empty if the rope isn't attached or its body or anchor no longer exist.
    pub fn rope_path(&self, entities: &EntitySet) -> Vec<m::Vec2> {
        let Some((anchor, body)) = self.endpoints(entities) else {
            return Vec::new();
        };
        let mut path = Vec::with_capacity(self.nodes.len() + 2);
        path.push(anchor);
        path.extend(self.nodes.iter().map(|n| n.position));
        path.push(body);
        path
    }

    fn endpoints(&self, entities: &EntitySet) -> Option<(m::Vec2, m::Vec2)> {
        let anchor = self.anchor?.position(entities)?;
        let body = entities.get_body(self.body)?.position();
        Some((anchor, body))
    }

    //
    // control
    //

    /// Attach the rope to an anchor and enable it.
    pub fn shoot_rope(&mut self, world: &mut PhysicsWorld, anchor: impl Into<Anchor>) {
        self.set_connected_anchor(world, anchor);
        self.enable_joint(world, true);
    }

    /// Enable or disable the rope's joint.
    ///
    /// Enabling creates the joint if it doesn't exist yet and requires an anchor.
    /// Disabling clears all bend nodes and path history.
    pub fn enable_joint(&mut self, world: &mut PhysicsWorld, enabled: bool) {
        if !enabled {
            if self.enabled {
                rope_debug!(self.params, "disabling rope");
            }
            self.reset_bending();
            self.enabled = false;
            if let Some(joint) = self.joint.and_then(|key| world.joint_mut(key)) {
                joint.enabled = false;
            }
            self.bind_to_anchor(world);
            return;
        }

        let Some(anchor) = self.anchor else {
            log::warn!("tried to enable a rope without an anchor");
            return;
        };
        let Some((anchor_pos, body_pos)) = self.endpoints(&world.entities) else {
            return;
        };

        if !self.enabled {
            self.distance = self.params.clamp_distance((anchor_pos - body_pos).mag());
        }
        let joint_exists = self.joint.and_then(|key| world.joint(key)).is_some();
        if !joint_exists {
            let (target, target_origin) = anchor.joint_target();
            let joint = DistanceJointBuilder::new(self.body)
                .with_target(target)
                .with_target_origin(target_origin)
                .with_limit(self.joint_limit())
                .with_break_thresholds(self.params.break_force, self.params.break_torque)
                .build(self.distance);
            self.joint = Some(world.insert_joint(joint));
        }
        self.enabled = true;
        self.last_fixed_position = Some(body_pos);
        self.reconfigure_joint(world);
        if let Some(joint) = self.joint.and_then(|key| world.joint_mut(key)) {
            joint.enabled = true;
        }
        rope_debug!(self.params, "rope enabled with length {:.2}", self.distance);
    }

    /// Turn wrapping around obstacles on or off.
    /// Turning it off clears existing bend nodes.
    pub fn set_bending_enabled(&mut self, world: &mut PhysicsWorld, enabled: bool) {
        self.bending_enabled = enabled;
        if !enabled {
            self.clear_bend_nodes(world);
        }
    }

    /// Set the length of the straight rope, clamped into the configured range.
    ///
    /// While the rope is bent the joint holds the body at its distance from the nearest node
    /// and the new length takes effect when the rope straightens out.
    pub fn set_distance(&mut self, world: &mut PhysicsWorld, distance: f64) {
        self.distance = self.params.clamp_distance(distance);
        if self.nodes.is_empty() {
            if let Some(joint) = self.joint.and_then(|key| world.joint_mut(key)) {
                joint.distance = self.distance;
            }
        }
    }

    /// Move the rope's anchor, straightening the rope.
    pub fn set_connected_anchor(&mut self, world: &mut PhysicsWorld, anchor: impl Into<Anchor>) {
        self.anchor = Some(anchor.into());
        self.reset_bending();
        if let Some((anchor_pos, body_pos)) = self.endpoints(&world.entities) {
            self.distance = self.params.clamp_distance((anchor_pos - body_pos).mag());
        }
        self.bind_to_anchor(world);
        if let Some(joint) = self.joint.and_then(|key| world.joint_mut(key)) {
            joint.distance = self.distance;
        }
    }

    /// Remove all bend nodes, attaching the joint straight to the anchor again.
    ///
    /// Does nothing if there are no nodes.
    pub fn clear_bend_nodes(&mut self, world: &mut PhysicsWorld) {
        if self.nodes.is_empty() {
            return;
        }
        self.nodes.clear();
        self.proxy.active = false;
        self.events.push(RopeEvent::Cleared);
        rope_debug!(self.params, "bend nodes cleared");

        if let Some((anchor_pos, body_pos)) = self.endpoints(&world.entities) {
            self.distance = self.params.clamp_distance((anchor_pos - body_pos).mag());
        }
        self.bind_to_anchor(world);
        if let Some(joint) = self.joint.and_then(|key| world.joint_mut(key)) {
            joint.distance = self.distance;
        }
    }

    /// Replace the rope's parameters and apply them to the joint.
    pub fn set_params(&mut self, world: &mut PhysicsWorld, params: RopeParameters) {
        self.params = Self::checked_params(params);
        self.nodes.truncate(self.params.max_nodes);
        self.reconfigure_joint(world);
    }

    /// Push the current parameters (limit, break thresholds, length range) to the joint.
    pub fn reconfigure_joint(&mut self, world: &mut PhysicsWorld) {
        self.distance = self.params.clamp_distance(self.distance);
        let limit = self.joint_limit();
        let straight = self.nodes.is_empty();
        let Some(joint) = self.joint.and_then(|key| world.joint_mut(key)) else {
            return;
        };
        joint.limit = limit;
        joint.break_force = self.params.break_force;
        joint.break_torque = self.params.break_torque;
        if straight {
            joint.distance = self.distance;
        }
    }

    /// React to a joint breaking. Returns `None` if the break concerns some other joint.
    ///
    /// Clears all bend nodes and history, then removes or disables the joint
    /// according to [`RopeParameters::break_action`].
    pub fn on_joint_break(
        &mut self,
        world: &mut PhysicsWorld,
        joint_break: &JointBreak,
    ) -> Option<BreakOutcome> {
        if self.joint != Some(joint_break.joint) {
            return None;
        }
        log::debug!(
            "rope broke with force {:.2} and torque {:.2}",
            joint_break.force,
            joint_break.torque
        );
        self.reset_bending();
        self.enabled = false;
        self.events.push(RopeEvent::Broken {
            force: joint_break.force,
            torque: joint_break.torque,
        });

        match self.params.break_action {
            BreakAction::Destroy => {
                if let Some(key) = self.joint.take() {
                    world.remove_joint(key);
                }
                Some(BreakOutcome::Destroyed)
            }
            BreakAction::Disable => {
                self.bind_to_anchor(world);
                if let Some(joint) = self.joint.and_then(|key| world.joint_mut(key)) {
                    joint.enabled = false;
                }
                Some(BreakOutcome::Disabled)
            }
        }
    }

    /// Drop nodes, history and the proxy.
    fn reset_bending(&mut self) {
        self.nodes.clear();
        self.history.clear();
        self.proxy.active = false;
        self.last_insertion_time = f64::NEG_INFINITY;
        self.last_history_time = f64::NEG_INFINITY;
    }

    fn joint_limit(&self) -> ConstraintLimit {
        if self.params.max_distance_only {
            ConstraintLimit::Lt
        } else {
            ConstraintLimit::Eq
        }
    }

    /// Point the joint's far end at the anchor.
    fn bind_to_anchor(&mut self, world: &mut PhysicsWorld) {
        let Some(anchor) = self.anchor else {
            return;
        };
        let Some(joint) = self.joint.and_then(|key| world.joint_mut(key)) else {
            return;
        };
        let (target, target_origin) = anchor.joint_target();
        joint.target = target;
        joint.offsets[1] = target_origin;
    }

    //
    // per-tick logic
    //

    /// Run the bend node logic: record history, remove obsolete nodes, detect new contacts,
    /// fix spacing and penetration, and re-point the joint.
    pub fn tick_variable(&mut self, dt: f64, world: &mut PhysicsWorld) {
        let _span = tracy_span!("bend rope tick");

        self.time += dt.max(0.0);
        if !self.enabled {
            return;
        }
        let joint_exists = self.joint.and_then(|key| world.joint(key)).is_some();
        if !joint_exists {
            return;
        }
        let Some((anchor, body)) = self.endpoints(&world.entities) else {
            return;
        };
        let frame = TickFrame {
            anchor,
            body,
            movement: self
                .last_fixed_position
                .map(|last| body - last)
                .unwrap_or_else(m::Vec2::zero),
            time: self.time,
        };

        let was_bent = !self.nodes.is_empty();

        if self.bending_enabled
            && self.nodes.is_empty()
            && frame.time - self.last_history_time >= self.params.history_interval
        {
            self.last_history_time = frame.time;
            let added = self
                .history
                .record(anchor, body, frame.time, &self.params, &*world);
            if added > 0 {
                rope_debug!(self.params, "recorded {added} path snapshots");
            }
        }
        self.history
            .prune(&mut self.nodes, frame.time, self.params.history_lifetime);

        self.remove_obsolete_nodes(&frame, &*world);
        if self.bending_enabled {
            self.detect_contacts(&frame, &*world);
        }
        self.enforce_spacing();
        self.resolve_penetration(&*world);

        self.update_attachment(&frame, was_bent, world);
    }

    /// Sample the body's position so the next tick knows how it moved.
    pub fn tick_fixed(&mut self, _dt: f64, world: &PhysicsWorld) {
        if let Some(body) = world.entities.get_body(self.body) {
            self.last_fixed_position = Some(body.position());
        }
    }

    /// Make the node closest to the body active and point the joint at it,
    /// or at the anchor if there are no nodes.
    fn update_attachment(&mut self, frame: &TickFrame, was_bent: bool, world: &mut PhysicsWorld) {
        let nearest = self
            .nodes
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                (a.position - frame.body)
                    .mag_sq()
                    .total_cmp(&(b.position - frame.body).mag_sq())
            })
            .map(|(idx, _)| idx);
        for (idx, node) in self.nodes.iter_mut().enumerate() {
            node.is_active = Some(idx) == nearest;
        }

        match nearest {
            Some(idx) => {
                let node_pos = self.nodes[idx].position;
                self.proxy.pose.translation = node_pos;
                self.proxy.active = true;
                if let Some(joint) = self.joint.and_then(|key| world.joint_mut(key)) {
                    joint.target = JointTarget::Point(node_pos);
                    joint.offsets[1] = m::Vec2::zero();
                    joint.distance = (frame.body - node_pos).mag();
                }
            }
            None => {
                self.proxy.active = false;
                if was_bent {
                    self.collapse(frame);
                }
                self.bind_to_anchor(world);
                if let Some(joint) = self.joint.and_then(|key| world.joint_mut(key)) {
                    joint.distance = self.distance;
                }
            }
        }
    }

    /// Pick the rope length after the last bend node went away.
    fn collapse(&mut self, frame: &TickFrame) {
        let straight = (frame.anchor - frame.body).mag();
        let restored = if self.params.restore_from_history {
            self.history
                .best_for_collapse()
                .map(|snap| snap.length().max(straight).min(self.params.max_distance))
        } else {
            None
        };
        self.distance = self
            .params
            .clamp_distance(restored.unwrap_or(straight));
        self.events.push(RopeEvent::Collapsed {
            distance: self.distance,
        });
        rope_debug!(
            self.params,
            "rope straightened, length {:.2}{}",
            self.distance,
            if restored.is_some() { " from history" } else { "" }
        );
    }

    /// Remove a node, keeping the event queue up to date.
    fn remove_node(&mut self, idx: usize, reason: RemovalReason) {
        let node = self.nodes.remove(idx);
        rope_debug!(
            self.params,
            "removed bend node {idx} at {:?}: {reason:?}",
            node.position
        );
        self.events.push(RopeEvent::NodeRemoved {
            position: node.position,
            reason,
        });
    }
}
