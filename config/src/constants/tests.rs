//! Tests for the centralized defaults and bounds.

use super::*;

#[test]
fn default_solver_tolerances_are_admissible() {
    for eps in [DEFAULT_UNIVAR_EPS, DEFAULT_BIVAR_EPS] {
        assert!((SOLVER_EPS_MIN..=SOLVER_EPS_MAX).contains(&eps));
    }
}

#[test]
fn default_angular_segments_within_bounds() {
    assert!((MIN_ANGULAR_SEGMENTS..=MAX_ANGULAR_SEGMENTS).contains(&DEFAULT_ANGULAR_SEGMENTS));
}

#[test]
fn radius_factor_floor_is_reachable() {
    assert!(RADIUS_FACTOR_FLOOR > 0.0);
    assert!(DEFAULT_RADIUS_FACTOR_DECREMENT <= MAX_RADIUS_FACTOR_DECREMENT);
    assert!(DEFAULT_INITIAL_RADIUS_FACTOR - DEFAULT_RADIUS_FACTOR_DECREMENT > RADIUS_FACTOR_FLOOR);
}

#[test]
fn default_hc_parameters_converge() {
    assert!(DEFAULT_HC_BETA > DEFAULT_HC_ALPHA);
}

#[test]
fn error_messages_name_the_parameter() {
    let err = ConfigError::out_of_range("meshing-flush", 12, "[1024, oo)");
    assert_eq!(
        err.to_string(),
        "parameter \"meshing-flush\" = 12 out of range, expected [1024, oo)"
    );
    let err = ConfigError::HcBetaNotGreaterThanAlpha { alpha: 0.5, beta: 0.5 };
    assert!(err.to_string().contains("greater than alpha"));
}
