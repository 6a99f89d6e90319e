use super::*;
use approx::assert_relative_eq;

#[test]
fn perpendicular_of_arbitrary_vector() {
    let v = Vec3::new(1.0, 2.0, 3.0);
    let p = any_perpendicular(v);
    assert_relative_eq!(p.dot(v), 0.0, epsilon = 1e-12);
    assert_relative_eq!(p.length(), 1.0, epsilon = 1e-12);
}

#[test]
fn perpendicular_of_zero_falls_back() {
    assert_eq!(any_perpendicular(Vec3::ZERO), Vec3::Y);
}

#[test]
fn rotation_quarter_turn() {
    let r = rotate_about(Vec3::X, Vec3::Z, std::f64::consts::FRAC_PI_2);
    assert_relative_eq!(r.x, 0.0, epsilon = 1e-12);
    assert_relative_eq!(r.y, 1.0, epsilon = 1e-12);
}

#[test]
fn angle_with_zero_vector_is_zero() {
    assert_eq!(angle_between(Vec3::ZERO, Vec3::X), 0.0);
    assert_relative_eq!(angle_between(Vec3::X, -Vec3::X), std::f64::consts::PI, epsilon = 1e-12);
}
