//! Angle utilities used across the matcher and propagation code.
//!
//! Recipe angles are degrees over the full circle; unlike grid-line work
//! there is no modulo-π ambiguity here, a fiducial rotated by 180° is a
//! different pose.

/// Normalizes an angle in degrees into (-180, 180].
#[inline]
pub fn normalize_deg(angle: f32) -> f32 {
    let mut a = angle.rem_euclid(360.0);
    if a > 180.0 {
        a -= 360.0;
    }
    a
}

/// Signed difference `a − b` in degrees, normalized into (-180, 180].
#[inline]
pub fn signed_diff_deg(a: f32, b: f32) -> f32 {
    normalize_deg(a - b)
}

/// True when `angle` lies within `tol` degrees of any entry in `tried`.
///
/// The rotation search uses this to avoid re-evaluating candidates from an
/// earlier stage.
#[inline]
pub fn near_any(angle: f32, tried: &[f32], tol: f32) -> bool {
    tried
        .iter()
        .any(|&t| signed_diff_deg(angle, t).abs() < tol)
}
