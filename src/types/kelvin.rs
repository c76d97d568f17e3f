//! Device-native color temperature.

use serde::{Deserialize, Serialize};

use crate::temperature;
use crate::types::Mired;

/// Color temperature in Kelvin, from 2700K (warm) to 6500K (daylight).
///
/// This is the range the temperature mapper is defined over; bulbs that
/// report values outside of it are not representable here and callers
/// should clamp before converting.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(transparent)]
pub struct Kelvin {
    pub(crate) kelvin: u16,
}

impl Kelvin {
    pub const MIN: u16 = temperature::KELVIN_MIN as u16;
    pub const MAX: u16 = temperature::KELVIN_MAX as u16;

    pub fn kelvin(&self) -> u16 {
        self.kelvin
    }

    /// Returns `None` if value is outside the valid range (2700-6500).
    ///
    /// ```
    /// use wiz_pilot::Kelvin;
    ///
    /// assert!(Kelvin::create(2699).is_none());
    /// assert!(Kelvin::create(2700).is_some());
    /// assert!(Kelvin::create(6500).is_some());
    /// assert!(Kelvin::create(6501).is_none());
    /// ```
    pub fn create(kelvin: u16) -> Option<Self> {
        if (Self::MIN..=Self::MAX).contains(&kelvin) {
            Some(Kelvin { kelvin })
        } else {
            None
        }
    }

    pub fn clamped(kelvin: u16) -> Self {
        Kelvin {
            kelvin: kelvin.clamp(Self::MIN, Self::MAX),
        }
    }

    pub fn to_mired(self) -> Mired {
        Mired {
            value: temperature::kelvin_to_mired(i32::from(self.kelvin)) as u16,
        }
    }
}

impl From<Mired> for Kelvin {
    fn from(mired: Mired) -> Self {
        mired.to_kelvin()
    }
}
