use crate::{math as m, physics::LayerMask};

/// What happens to a rope when its distance joint breaks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde-types", derive(serde::Deserialize, serde::Serialize))]
pub enum BreakAction {
    /// Remove the joint from the world. The rope should be dropped by its owner.
    Destroy,
    /// Keep the joint around but disabled, so the rope can be shot again.
    Disable,
}

/// Tunable parameters of a [`BendRope`][super::BendRope].
///
/// Distances are in metres and times in seconds of simulation time.
/// Defaults are tuned for a character about one metre tall.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde-types",
    derive(serde::Deserialize, serde::Serialize),
    serde(default)
)]
pub struct RopeParameters {
    /// Smallest allowed distance between two bend nodes,
    /// and the radius around an existing node where new hits are ignored.
    pub min_node_distance: f64,
    /// Upper bound on the number of bend nodes.
    pub max_nodes: usize,
    /// Radius of the circle used to test whether a node is inside an obstacle.
    pub node_radius: f64,
    /// Extra distance added when pushing a node out of an obstacle.
    pub penetration_margin: f64,
    /// Radius of the body at the end of the rope.
    pub player_radius: f64,
    /// Hits within `player_radius * no_bend_radius_multiplier` of the body don't create nodes.
    pub no_bend_radius_multiplier: f64,
    /// Hits within this distance of the anchor don't create nodes.
    pub hook_exclusion_radius: f64,
    /// Collision layers the rope wraps around.
    pub obstacle_layers: LayerMask,
    /// Nodes younger than this are never removed.
    pub min_node_lifetime: f64,
    /// Minimum time between two node insertions.
    pub insertion_interval: f64,
    /// Dot product between the body's movement at node creation and now
    /// below which the body is considered to be swinging back.
    pub swing_back_dot_threshold: f64,
    /// Minimum change in direction from node to body for a swing-back removal.
    pub swing_angle_threshold: m::Angle,
    /// Movement this parallel to the rope (absolute dot product) doesn't count as swinging.
    pub movement_parallel_threshold: f64,
    /// Dot product above which a node's bend is considered straightened out.
    pub similarity_dot_threshold: f64,
    /// Dot product above which the body is considered back at a node's original bend direction.
    pub passed_through_dot_threshold: f64,
    /// Movement shorter than this per tick doesn't have a direction.
    pub min_movement: f64,
    /// Maximum number of passes pushing nodes out of obstacles per tick.
    pub penetration_passes: usize,
    /// Time between path history recordings.
    pub history_interval: f64,
    /// Number of points checked along the straight rope when recording history.
    pub history_samples: usize,
    /// Radius of the circle checked around each history sample point.
    pub history_probe_radius: f64,
    /// Snapshots no node has claimed are forgotten after this long.
    pub history_lifetime: f64,
    /// Use the recorded path length when collapsing back to a straight rope.
    pub restore_from_history: bool,
    pub min_distance: f64,
    pub max_distance: f64,
    /// Let the rope go slack instead of holding the distance exactly.
    pub max_distance_only: bool,
    pub break_force: Option<f64>,
    pub break_torque: Option<f64>,
    pub break_action: BreakAction,
    /// Emit per-node diagnostics at debug level.
    pub debug_logging: bool,
}

impl Default for RopeParameters {
    fn default() -> Self {
        Self {
            min_node_distance: 0.2,
            max_nodes: 16,
            node_radius: 0.05,
            penetration_margin: 0.01,
            player_radius: 0.5,
            no_bend_radius_multiplier: 1.2,
            hook_exclusion_radius: 0.25,
            obstacle_layers: LayerMask::ALL,
            min_node_lifetime: 0.2,
            insertion_interval: 0.05,
            swing_back_dot_threshold: -0.5,
            swing_angle_threshold: m::Angle::Deg(5.0),
            movement_parallel_threshold: 0.9,
            similarity_dot_threshold: 0.995,
            passed_through_dot_threshold: 0.99,
            min_movement: 1e-3,
            penetration_passes: 5,
            history_interval: 0.25,
            history_samples: 4,
            history_probe_radius: 0.3,
            history_lifetime: 2.0,
            restore_from_history: false,
            min_distance: 0.5,
            max_distance: 20.0,
            max_distance_only: true,
            break_force: None,
            break_torque: None,
            break_action: BreakAction::Disable,
            debug_logging: false,
        }
    }
}

/// A rope parameter outside its valid range.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ParamError {
    #[error("{name} must be positive, got {value}")]
    NotPositive { name: &'static str, value: f64 },
    #[error("{name} must not be negative, got {value}")]
    Negative { name: &'static str, value: f64 },
    #[error("{name} must be within [{min}, {max}], got {value}")]
    OutOfRange {
        name: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("{name} must be at least 1")]
    Zero { name: &'static str },
    #[error("min_distance ({min}) is larger than max_distance ({max})")]
    InvertedDistances { min: f64, max: f64 },
}

impl RopeParameters {
    /// Check every parameter, reporting all problems at once.
    pub fn validate(&self) -> Result<(), Vec<ParamError>> {
        let mut copy = *self;
        let errors = copy.fix();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Get a copy with every invalid parameter clamped into its valid range.
    pub fn clamped(&self) -> Self {
        let mut params = *self;
        params.fix();
        params
    }

    /// Clamp parameters in place, returning what was wrong.
    fn fix(&mut self) -> Vec<ParamError> {
        let defaults = Self::default();
        let mut errs = Vec::new();

        positive(
            "min_node_distance",
            &mut self.min_node_distance,
            defaults.min_node_distance,
            &mut errs,
        );
        positive(
            "node_radius",
            &mut self.node_radius,
            defaults.node_radius,
            &mut errs,
        );
        non_negative("penetration_margin", &mut self.penetration_margin, &mut errs);
        non_negative("player_radius", &mut self.player_radius, &mut errs);
        non_negative(
            "no_bend_radius_multiplier",
            &mut self.no_bend_radius_multiplier,
            &mut errs,
        );
        non_negative(
            "hook_exclusion_radius",
            &mut self.hook_exclusion_radius,
            &mut errs,
        );
        non_negative("min_node_lifetime", &mut self.min_node_lifetime, &mut errs);
        non_negative("insertion_interval", &mut self.insertion_interval, &mut errs);
        in_range(
            "swing_back_dot_threshold",
            &mut self.swing_back_dot_threshold,
            -1.0,
            1.0,
            &mut errs,
        );
        let mut swing_rad = self.swing_angle_threshold.rad();
        if in_range(
            "swing_angle_threshold",
            &mut swing_rad,
            0.0,
            std::f64::consts::PI,
            &mut errs,
        ) {
            self.swing_angle_threshold = m::Angle::Rad(swing_rad);
        }
        in_range(
            "movement_parallel_threshold",
            &mut self.movement_parallel_threshold,
            0.0,
            1.0,
            &mut errs,
        );
        in_range(
            "similarity_dot_threshold",
            &mut self.similarity_dot_threshold,
            -1.0,
            1.0,
            &mut errs,
        );
        in_range(
            "passed_through_dot_threshold",
            &mut self.passed_through_dot_threshold,
            -1.0,
            1.0,
            &mut errs,
        );
        non_negative("min_movement", &mut self.min_movement, &mut errs);
        positive(
            "history_interval",
            &mut self.history_interval,
            defaults.history_interval,
            &mut errs,
        );
        non_negative(
            "history_probe_radius",
            &mut self.history_probe_radius,
            &mut errs,
        );
        non_negative("history_lifetime", &mut self.history_lifetime, &mut errs);

        for (name, count) in [
            ("max_nodes", &mut self.max_nodes),
            ("penetration_passes", &mut self.penetration_passes),
            ("history_samples", &mut self.history_samples),
        ] {
            if *count == 0 {
                errs.push(ParamError::Zero { name });
                *count = 1;
            }
        }

        non_negative("min_distance", &mut self.min_distance, &mut errs);
        positive(
            "max_distance",
            &mut self.max_distance,
            defaults.max_distance,
            &mut errs,
        );
        if self.min_distance > self.max_distance {
            errs.push(ParamError::InvertedDistances {
                min: self.min_distance,
                max: self.max_distance,
            });
            std::mem::swap(&mut self.min_distance, &mut self.max_distance);
        }

        for (name, threshold) in [
            ("break_force", &mut self.break_force),
            ("break_torque", &mut self.break_torque),
        ] {
            if let Some(value) = *threshold {
                if !(value > 0.0) {
                    errs.push(ParamError::NotPositive { name, value });
                    *threshold = None;
                }
            }
        }

        errs
    }

    /// Radius around the body where hits don't create nodes.
    #[inline]
    pub fn no_bend_radius(&self) -> f64 {
        self.player_radius * self.no_bend_radius_multiplier
    }

    /// Clamp a rope length into `[min_distance, max_distance]`.
    #[inline]
    pub fn clamp_distance(&self, distance: f64) -> f64 {
        if distance.is_nan() {
            return self.min_distance;
        }
        distance.clamp(self.min_distance, self.max_distance)
    }
}

fn positive(name: &'static str, value: &mut f64, fallback: f64, errs: &mut Vec<ParamError>) {
    if !(*value > 0.0) || !value.is_finite() {
        errs.push(ParamError::NotPositive {
            name,
            value: *value,
        });
        *value = fallback;
    }
}

fn non_negative(name: &'static str, value: &mut f64, errs: &mut Vec<ParamError>) {
    if !(*value >= 0.0) {
        errs.push(ParamError::Negative {
            name,
            value: *value,
        });
        *value = 0.0;
    }
}

/// Returns true if the value was changed.
fn in_range(
    name: &'static str,
    value: &mut f64,
    min: f64,
    max: f64,
    errs: &mut Vec<ParamError>,
) -> bool {
    if (min..=max).contains(value) {
        return false;
    }
    errs.push(ParamError::OutOfRange {
        name,
        value: *value,
        min,
        max,
    });
    *value = if value.is_nan() {
        min
    } else {
        value.clamp(min, max)
    };
    true
}
