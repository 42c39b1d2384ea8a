//! Bookable slot computation.
//!
//! A doctor's weekly windows are cut into fixed-length slots; slots whose
//! start collides with a pending or confirmed appointment are removed.
//! Everything here is pure, so the same inputs always give the same slots.

use std::collections::{BTreeSet, HashSet};

use chrono::{Datelike, NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Appointment, AvailabilityWindow};

pub const DEFAULT_SLOT_MINUTES: u32 = 30;

/// One bookable start time and the end it implies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Slot {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

/// Weekday of `date` counted from Sunday = 0, the numbering windows use.
pub fn weekday_index(date: NaiveDate) -> u8 {
    // num_days_from_sunday is always 0..=6
    date.weekday().num_days_from_sunday() as u8
}

/// Cuts every window into `slot_minutes` slots and drops the occupied ones.
///
/// The caller is expected to have narrowed `windows` to one weekday and
/// `booked` to one doctor and date; see [`slots_for_date`].
pub fn generate_slots(
    windows: &[AvailabilityWindow],
    booked: &[Appointment],
    slot_minutes: u32,
) -> Vec<Slot> {
    if slot_minutes == 0 {
        tracing::warn!("slot duration of 0 minutes requested, no slots generated");
        return Vec::new();
    }
    let step = slot_minutes.saturating_mul(60);

    let occupied: HashSet<NaiveTime> = booked
        .iter()
        .filter(|a| a.status.is_occupying())
        .map(|a| a.start_time)
        .collect();

    let mut slots = BTreeSet::new();
    for window in windows {
        if !window.is_valid() {
            tracing::debug!(
                window_id = %window.id,
                day = window.day_of_week,
                start = %window.start_time,
                end = %window.end_time,
                "skipping invalid availability window"
            );
            continue;
        }

        let window_end = window.end_time.num_seconds_from_midnight();
        let mut cursor = window.start_time.num_seconds_from_midnight();
        while let Some(slot_end) = cursor.checked_add(step).filter(|end| *end <= window_end) {
            if let Some(slot) = slot_from_seconds(cursor, slot_end) {
                if !occupied.contains(&slot.start) {
                    slots.insert(slot);
                }
            }
            cursor = slot_end;
        }
    }

    slots.into_iter().collect()
}

/// Slots for one doctor on one calendar date.
///
/// Windows of other doctors or other weekdays, and appointments of other
/// doctors or other dates, are ignored.
pub fn slots_for_date(
    windows: &[AvailabilityWindow],
    booked: &[Appointment],
    doctor_id: Uuid,
    date: NaiveDate,
    slot_minutes: u32,
) -> Vec<Slot> {
    let weekday = weekday_index(date);
    let day_windows: Vec<AvailabilityWindow> = windows
        .iter()
        .filter(|w| w.doctor_id == doctor_id && w.day_of_week == weekday)
        .cloned()
        .collect();
    let day_bookings: Vec<Appointment> = booked
        .iter()
        .filter(|a| a.doctor_id == doctor_id && a.appointment_date == date)
        .cloned()
        .collect();

    generate_slots(&day_windows, &day_bookings, slot_minutes)
}

fn slot_from_seconds(start: u32, end: u32) -> Option<Slot> {
    Some(Slot {
        start: NaiveTime::from_num_seconds_from_midnight_opt(start, 0)?,
        end: NaiveTime::from_num_seconds_from_midnight_opt(end, 0)?,
    })
}
