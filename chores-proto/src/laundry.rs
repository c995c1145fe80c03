//! Laundry room reservation types.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::resident::Resident;

/// Half-day window the laundry room can be booked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LaundrySlot {
    /// 05:00 - 12:00.
    Morning,
    /// 15:00 - 23:00.
    Evening,
}

impl LaundrySlot {
    /// Opening hours of the slot, for display.
    #[must_use]
    pub const fn hours(self) -> &'static str {
        match self {
            Self::Morning => "05:00 - 12:00",
            Self::Evening => "15:00 - 23:00",
        }
    }
}

impl std::fmt::Display for LaundrySlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Morning => write!(f, "morning"),
            Self::Evening => write!(f, "evening"),
        }
    }
}

impl std::str::FromStr for LaundrySlot {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "morning" => Ok(Self::Morning),
            "evening" => Ok(Self::Evening),
            other => Err(format!("unknown laundry slot: {other}")),
        }
    }
}

/// A booked laundry slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaundryReservation {
    /// Who booked it.
    pub resident: Resident,
    /// Local calendar date of the booking.
    pub date: NaiveDate,
    /// Morning or evening.
    pub slot: LaundrySlot,
}
