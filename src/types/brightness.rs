//! Dimming level accepted by `setPilot`.

use serde::{Deserialize, Serialize};

/// Brightness level from 10 to 100 percent.
///
/// A bulb reporting no `dimming` at all is a switch; that case never reaches
/// this type.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(transparent)]
pub struct Brightness {
    pub(crate) value: u8,
}

impl Default for Brightness {
    fn default() -> Self {
        Brightness { value: Self::MAX }
    }
}

impl Brightness {
    pub const MIN: u8 = 10;
    pub const MAX: u8 = 100;

    pub fn value(&self) -> u8 {
        self.value
    }

    /// Returns None if value is outside valid range (10-100).
    ///
    /// ```
    /// use wiz_pilot::Brightness;
    ///
    /// assert!(Brightness::create(9).is_none());
    /// assert_eq!(Brightness::create(55).unwrap().value(), 55);
    /// ```
    pub fn create(value: u8) -> Option<Self> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Some(Brightness { value })
        } else {
            None
        }
    }
}
