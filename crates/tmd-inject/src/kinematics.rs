//! Per-event derived quantities entering the spin modulation.

use tmd_core::PROTON_MASS;

/// Floor on the squared denominator of the spin projection.
pub const SPIN_PROJECTION_FLOOR: f64 = 1e-12;

/// Virtual-photon depolarization factor `(1-y)/(1-y+y^2/2)`.
pub fn depolarization(y: f64) -> f64 {
    (1.0 - y) / (1.0 - y + 0.5 * y * y)
}

/// Target-spin polar angle between the lepton beam and the virtual photon.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpinAngle {
    /// `sin(theta)`, clamped to at most 1.
    pub sin_theta: f64,
    /// `cos(theta)`, non-negative.
    pub cos_theta: f64,
}

/// Polar angle from x, Q and y with `gamma = 2 x m_p / Q`.
///
/// Both components are NaN when `gamma` or `y` is not finite.
pub fn spin_angle(x: f64, q: f64, y: f64) -> SpinAngle {
    let gamma = 2.0 * x * PROTON_MASS / (q * q).sqrt();
    if !(gamma.is_finite() && y.is_finite()) {
        return SpinAngle {
            sin_theta: f64::NAN,
            cos_theta: f64::NAN,
        };
    }
    let radicand = (1.0 - y - 0.25 * y * y * gamma * gamma) / (1.0 + gamma * gamma);
    let sin_theta = (gamma * radicand.max(0.0).sqrt()).min(1.0);
    let cos_theta = (1.0 - sin_theta * sin_theta).max(0.0).sqrt();
    SpinAngle {
        sin_theta,
        cos_theta,
    }
}

/// Transverse target-spin projection `S_T`, clamped to `[0, 1]`.
///
/// Non-finite intermediate results propagate as NaN; callers sanitize.
pub fn spin_projection(x: f64, q: f64, y: f64, phi_s: f64) -> f64 {
    let angle = spin_angle(x, q, y);
    let sin_phi_s = phi_s.sin();
    if !(angle.cos_theta.is_finite() && sin_phi_s.is_finite()) {
        return f64::NAN;
    }
    let denominator = (1.0 - angle.sin_theta * angle.sin_theta * sin_phi_s * sin_phi_s)
        .max(SPIN_PROJECTION_FLOOR)
        .sqrt();
    (angle.cos_theta / denominator).clamp(0.0, 1.0)
}

/// Replaces a non-finite value by zero, returning whether a replacement happened.
pub fn sanitize(value: f64) -> (f64, bool) {
    if value.is_finite() {
        (value, false)
    } else {
        (0.0, true)
    }
}
