#![cfg(feature = "serde-types")]

use wraprope::{Angle, BreakAction, LayerMask, RopeParameters};

#[test]
fn params_load_from_ron() {
    let src = r#"(
        max_nodes: 4,
        swing_angle_threshold: Deg(10.0),
        break_action: Destroy,
        break_force: Some(50.0),
        obstacle_layers: LayerMask(3),
    )"#;
    let params: RopeParameters = ron::from_str(src).unwrap();

    assert_eq!(params.max_nodes, 4);
    assert_eq!(params.swing_angle_threshold, Angle::Deg(10.0));
    assert_eq!(params.break_action, BreakAction::Destroy);
    assert_eq!(params.break_force, Some(50.0));
    assert_eq!(params.obstacle_layers, LayerMask(3));
    assert!(params.validate().is_ok());

    // everything else comes from the defaults
    let defaults = RopeParameters::default();
    assert_eq!(params.min_node_distance, defaults.min_node_distance);
    assert_eq!(params.history_interval, defaults.history_interval);
    assert_eq!(params.break_torque, None);
    assert_eq!(params.max_distance_only, defaults.max_distance_only);
}

#[test]
fn empty_config_is_default() {
    let params: RopeParameters = ron::from_str("()").unwrap();
    assert_eq!(params, RopeParameters::default());
}

#[test]
fn invalid_values_load_but_fail_validation() {
    let params: RopeParameters =
        ron::from_str("(min_distance: 30.0, max_distance: 10.0, node_radius: -1.0)").unwrap();
    let errs = params.validate().unwrap_err();
    assert_eq!(errs.len(), 2);

    let fixed = params.clamped();
    assert_eq!((fixed.min_distance, fixed.max_distance), (10.0, 30.0));
    assert_eq!(fixed.node_radius, RopeParameters::default().node_radius);
}

#[test]
fn params_survive_a_round_trip() {
    let params = RopeParameters {
        restore_from_history: true,
        break_torque: Some(12.5),
        ..Default::default()
    };
    let text = ron::to_string(&params).unwrap();
    let back: RopeParameters = ron::from_str(&text).unwrap();
    assert_eq!(back, params);
}
