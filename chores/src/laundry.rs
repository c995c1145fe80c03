//! Laundry room booking.
//!
//! Residents book half-day slots. Each resident may hold at most two
//! bookings per ISO week (Monday to Sunday, by the booked date) and at most
//! one of each slot kind per week. Bookings must be for today or a date at
//! most 14 days ahead.

use chrono::{Days, NaiveDate};
use chores_proto::laundry::{LaundryReservation, LaundrySlot};
use chores_proto::resident::Resident;

use crate::calendar::Calendar;

/// Bookings one resident may hold in one week.
pub const MAX_WEEKLY_RESERVATIONS: usize = 2;
/// Bookings of the same slot kind one resident may hold in one week.
pub const MAX_SAME_SLOT_PER_WEEK: usize = 1;
/// How far ahead a booking may be made.
pub const ADVANCE_DAYS_LIMIT: u64 = 14;

/// Error type for booking operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LaundryError {
    /// The date has already passed.
    #[error("{0} is in the past")]
    InPast(NaiveDate),
    /// The date is beyond the booking window.
    #[error("{0} is more than {ADVANCE_DAYS_LIMIT} days ahead")]
    TooFarAhead(NaiveDate),
    /// Someone already holds the slot.
    #[error("{slot} slot on {date} is already booked by {holder}")]
    SlotTaken {
        /// Requested date.
        date: NaiveDate,
        /// Requested slot.
        slot: LaundrySlot,
        /// Current holder.
        holder: String,
    },
    /// The weekly booking limit is reached.
    #[error("weekly limit of {MAX_WEEKLY_RESERVATIONS} bookings reached")]
    WeeklyLimit,
    /// A booking of this slot kind already exists this week.
    #[error("already holding a {0} booking this week")]
    SameSlotLimit(LaundrySlot),
    /// No booking for that date and slot.
    #[error("no booking for the {slot} slot on {date}")]
    NotFound {
        /// Requested date.
        date: NaiveDate,
        /// Requested slot.
        slot: LaundrySlot,
    },
    /// The booking belongs to someone else.
    #[error("booking belongs to {0}")]
    NotOwner(String),
}

/// All laundry bookings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaundryBook {
    reservations: Vec<LaundryReservation>,
}

impl LaundryBook {
    /// Creates an empty book.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads persisted bookings, dropping duplicates of an occupied slot.
    #[must_use]
    pub fn from_reservations(reservations: Vec<LaundryReservation>) -> Self {
        let mut book = Self::new();
        for reservation in reservations {
            if book.holder(reservation.date, reservation.slot).is_some() {
                tracing::warn!(
                    date = %reservation.date,
                    slot = %reservation.slot,
                    "dropping duplicate laundry booking"
                );
                continue;
            }
            book.reservations.push(reservation);
        }
        book.sort();
        book
    }

    /// All bookings by date then slot.
    #[must_use]
    pub fn reservations(&self) -> &[LaundryReservation] {
        &self.reservations
    }

    /// Who holds a slot, if anyone.
    #[must_use]
    pub fn holder(&self, date: NaiveDate, slot: LaundrySlot) -> Option<&Resident> {
        self.reservations
            .iter()
            .find(|r| r.date == date && r.slot == slot)
            .map(|r| &r.resident)
    }

    /// Books a slot for `resident`.
    ///
    /// # Errors
    ///
    /// Returns the first rule the booking breaks: `InPast`, `TooFarAhead`,
    /// `SlotTaken`, `WeeklyLimit`, or `SameSlotLimit`.
    pub fn reserve(
        &mut self,
        resident: &Resident,
        date: NaiveDate,
        slot: LaundrySlot,
        today: NaiveDate,
    ) -> Result<LaundryReservation, LaundryError> {
        if date < today {
            return Err(LaundryError::InPast(date));
        }
        let horizon = today
            .checked_add_days(Days::new(ADVANCE_DAYS_LIMIT))
            .unwrap_or(NaiveDate::MAX);
        if date > horizon {
            return Err(LaundryError::TooFarAhead(date));
        }
        if let Some(holder) = self.holder(date, slot) {
            return Err(LaundryError::SlotTaken {
                date,
                slot,
                holder: holder.to_string(),
            });
        }
        let mine: Vec<_> = self
            .week_of(date)
            .into_iter()
            .filter(|r| &r.resident == resident)
            .collect();
        if mine.len() >= MAX_WEEKLY_RESERVATIONS {
            return Err(LaundryError::WeeklyLimit);
        }
        if mine.iter().filter(|r| r.slot == slot).count() >= MAX_SAME_SLOT_PER_WEEK {
            return Err(LaundryError::SameSlotLimit(slot));
        }

        let reservation = LaundryReservation {
            resident: resident.clone(),
            date,
            slot,
        };
        self.reservations.push(reservation.clone());
        self.sort();
        tracing::info!(resident = %resident, %date, %slot, "laundry slot booked");
        Ok(reservation)
    }

    /// Cancels the requester's own booking.
    ///
    /// # Errors
    ///
    /// Returns `LaundryError::NotFound` if the slot is free or
    /// `LaundryError::NotOwner` if someone else holds it.
    pub fn cancel(
        &mut self,
        requester: &str,
        date: NaiveDate,
        slot: LaundrySlot,
    ) -> Result<LaundryReservation, LaundryError> {
        let index = self
            .reservations
            .iter()
            .position(|r| r.date == date && r.slot == slot)
            .ok_or(LaundryError::NotFound { date, slot })?;
        if !self.reservations[index].resident.matches(requester) {
            return Err(LaundryError::NotOwner(
                self.reservations[index].resident.to_string(),
            ));
        }
        let removed = self.reservations.remove(index);
        tracing::info!(resident = %removed.resident, %date, %slot, "laundry booking cancelled");
        Ok(removed)
    }

    /// Bookings in the Monday-to-Sunday week containing `date`.
    #[must_use]
    pub fn week_of(&self, date: NaiveDate) -> Vec<&LaundryReservation> {
        let monday = Calendar::week_start(date);
        self.reservations
            .iter()
            .filter(|r| Calendar::week_start(r.date) == monday)
            .collect()
    }

    /// How many more bookings `resident` may make in the week of `date`.
    #[must_use]
    pub fn remaining_in_week(&self, resident: &Resident, date: NaiveDate) -> usize {
        let held = self
            .week_of(date)
            .iter()
            .filter(|r| &r.resident == resident)
            .count();
        MAX_WEEKLY_RESERVATIONS.saturating_sub(held)
    }

    fn sort(&mut self) {
        self.reservations
            .sort_by_key(|r| (r.date, matches!(r.slot, LaundrySlot::Evening)));
    }
}
