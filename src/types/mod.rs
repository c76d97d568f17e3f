//! Validated value types for pilot parameters.

mod brightness;
mod kelvin;
mod mired;

pub use brightness::Brightness;
pub use kelvin::Kelvin;
pub use mired::Mired;
