//! UI-facing color temperature.

use serde::{Deserialize, Serialize};

use crate::temperature;
use crate::types::Kelvin;

/// Color temperature on the 140-500 scale smart-home front ends use.
///
/// 140 is the coolest setting and maps to 6500K, 500 the warmest and maps
/// to 2700K. The mapping is linear between the two, not a true reciprocal.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(transparent)]
pub struct Mired {
    pub(crate) value: u16,
}

impl Mired {
    pub const MIN: u16 = temperature::MIRED_MIN as u16;
    pub const MAX: u16 = temperature::MIRED_MAX as u16;

    pub fn value(&self) -> u16 {
        self.value
    }

    /// Returns `None` if value is outside the valid range (140-500).
    pub fn create(value: u16) -> Option<Self> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Some(Mired { value })
        } else {
            None
        }
    }

    pub fn to_kelvin(self) -> Kelvin {
        Kelvin {
            kelvin: temperature::mired_to_kelvin(i32::from(self.value)) as u16,
        }
    }
}

impl From<Kelvin> for Mired {
    fn from(kelvin: Kelvin) -> Self {
        kelvin.to_mired()
    }
}
