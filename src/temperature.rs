//! Linear mapping between bulb Kelvin and the UI temperature scale.
//!
//! Both directions are pure and unchecked: inputs outside
//! [`KELVIN_MIN`]..=[`KELVIN_MAX`] or [`MIRED_MIN`]..=[`MIRED_MAX`] are
//! extrapolated, not clamped. Use [`Kelvin`](crate::Kelvin) and
//! [`Mired`](crate::Mired) to validate at the boundary.

pub const KELVIN_MIN: i32 = 2700;
pub const KELVIN_MAX: i32 = 6500;
pub const MIRED_MIN: i32 = 140;
pub const MIRED_MAX: i32 = 500;

const KELVIN_SPAN: f64 = (KELVIN_MAX - KELVIN_MIN) as f64;
const MIRED_SPAN: f64 = (MIRED_MAX - MIRED_MIN) as f64;

/// ```
/// use wiz_pilot::kelvin_to_mired;
///
/// assert_eq!(kelvin_to_mired(2700), 500);
/// assert_eq!(kelvin_to_mired(6500), 140);
/// ```
pub fn kelvin_to_mired(kelvin: i32) -> i32 {
    let fraction = (f64::from(kelvin) - f64::from(KELVIN_MIN)) / KELVIN_SPAN;
    (f64::from(MIRED_MIN) + MIRED_SPAN * (1.0 - fraction)).round() as i32
}

/// ```
/// use wiz_pilot::mired_to_kelvin;
///
/// assert_eq!(mired_to_kelvin(140), 6500);
/// assert_eq!(mired_to_kelvin(500), 2700);
/// ```
pub fn mired_to_kelvin(mired: i32) -> i32 {
    let fraction = (f64::from(mired) - f64::from(MIRED_MIN)) / MIRED_SPAN;
    (f64::from(KELVIN_MIN) + KELVIN_SPAN * (1.0 - fraction)).round() as i32
}
