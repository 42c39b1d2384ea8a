//! Booking flow: slot lookup, booking requests and status changes.
//!
//! Reads go through the [`crate::store`] traits. Every write operation runs
//! inside one SQLite transaction, so a failing step leaves the appointment,
//! and any notification it would have produced, exactly as they were.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::BookingConfig;
use crate::db::DatabaseError;
use crate::lifecycle::{self, TransitionError};
use crate::models::{
    ActorRole, Appointment, AppointmentStatus, Attendee, NewAppointment, Notification,
    ProfileRole,
};
use crate::notifications;
use crate::slots::{self, Slot};
use crate::store::{AppointmentStore, AvailabilityStore, NotificationStore, ProfileStore};

const MAX_NOTES_LEN: usize = 2000;

// ─── Types ────────────────────────────────────────────────────────────────────

#[derive(Error, Debug)]
pub enum BookingError {
    #[error("Store error: {0}")]
    Store(#[from] DatabaseError),

    #[error("{0}")]
    Transition(#[from] TransitionError),

    #[error("Slot at {time} on {date} is not available")]
    SlotUnavailable { date: NaiveDate, time: NaiveTime },

    #[error("Date {date} is outside the booking window {first} to {last}")]
    OutsideBookingWindow {
        date: NaiveDate,
        first: NaiveDate,
        last: NaiveDate,
    },

    #[error("No doctor with id {0}")]
    UnknownDoctor(Uuid),

    #[error("{role} {user_id} may not change appointment {appointment_id}")]
    NotAuthorized {
        role: ActorRole,
        user_id: Uuid,
        appointment_id: Uuid,
    },

    #[error("Invalid booking request: {0}")]
    InvalidRequest(String),
}

impl From<rusqlite::Error> for BookingError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Store(DatabaseError::from(err))
    }
}

/// Who is acting on an appointment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", content = "user_id", rename_all = "snake_case")]
pub enum Actor {
    Patient(Uuid),
    Doctor(Uuid),
    System,
}

impl Actor {
    pub fn role(&self) -> ActorRole {
        match self {
            Self::Patient(_) => ActorRole::Patient,
            Self::Doctor(_) => ActorRole::Doctor,
            Self::System => ActorRole::System,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingRequest {
    pub doctor_id: Uuid,
    pub attendee: Attendee,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingReceipt {
    pub appointment: Appointment,
    pub notification: Notification,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionReceipt {
    pub appointment: Appointment,
    pub notification: Option<Notification>,
}

// ─── Slot lookup ──────────────────────────────────────────────────────────────

/// Free slots for a doctor on a date. A day without windows is an empty list.
pub fn available_slots<S>(
    store: &S,
    doctor_id: &Uuid,
    date: NaiveDate,
    config: &BookingConfig,
) -> Result<Vec<Slot>, BookingError>
where
    S: AvailabilityStore + AppointmentStore + ?Sized,
{
    let windows = store.get_availability(doctor_id, slots::weekday_index(date))?;
    if windows.is_empty() {
        tracing::debug!(%doctor_id, %date, "doctor has no availability on this weekday");
        return Ok(Vec::new());
    }
    let booked = store.get_appointments(doctor_id, &date)?;
    Ok(slots::slots_for_date(
        &windows,
        &booked,
        *doctor_id,
        date,
        config.slot_duration_minutes,
    ))
}

// ─── Booking ──────────────────────────────────────────────────────────────────

/// Creates a `pending` appointment and notifies the doctor.
///
/// `now` bounds the request: the date must fall within the booking horizon
/// and, for today, the slot must not have started yet.
pub fn book_appointment(
    conn: &mut Connection,
    request: &BookingRequest,
    config: &BookingConfig,
    now: NaiveDateTime,
) -> Result<BookingReceipt, BookingError> {
    let tx = conn.transaction()?;
    let receipt = book_with(&*tx, request, config, now)?;
    tx.commit()?;
    tracing::info!(
        appointment_id = %receipt.appointment.id,
        doctor_id = %request.doctor_id,
        date = %request.date,
        start = %request.start_time,
        "appointment requested"
    );
    Ok(receipt)
}

fn book_with<S>(
    store: &S,
    request: &BookingRequest,
    config: &BookingConfig,
    now: NaiveDateTime,
) -> Result<BookingReceipt, BookingError>
where
    S: AvailabilityStore + AppointmentStore + NotificationStore + ProfileStore + ?Sized,
{
    validate_request(request, config, now)?;

    match store.get_profile(&request.doctor_id)? {
        Some(profile) if profile.role == ProfileRole::Doctor => {}
        _ => return Err(BookingError::UnknownDoctor(request.doctor_id)),
    }

    let patient = match &request.attendee {
        Attendee::Patient { id } => match store.get_profile(id)? {
            Some(profile) if profile.role == ProfileRole::Patient => Some(profile),
            _ => {
                return Err(BookingError::InvalidRequest(format!(
                    "no patient with id {id}"
                )))
            }
        },
        Attendee::Guest(_) => None,
    };

    let unavailable = || BookingError::SlotUnavailable {
        date: request.date,
        time: request.start_time,
    };
    let slot = available_slots(store, &request.doctor_id, request.date, config)?
        .into_iter()
        .find(|slot| slot.start == request.start_time)
        .ok_or_else(unavailable)?;

    let new = NewAppointment {
        doctor_id: request.doctor_id,
        attendee: request.attendee.clone(),
        appointment_date: request.date,
        start_time: slot.start,
        end_time: slot.end,
        notes: request.notes.clone(),
    };
    let appointment = store.create_appointment(&new).map_err(|err| {
        if err.is_unique_violation() {
            unavailable()
        } else {
            BookingError::Store(err)
        }
    })?;

    let draft = notifications::booking_requested(&appointment, patient.as_ref());
    let notification = store.insert_notification(&draft)?;

    Ok(BookingReceipt {
        appointment,
        notification,
    })
}

fn validate_request(
    request: &BookingRequest,
    config: &BookingConfig,
    now: NaiveDateTime,
) -> Result<(), BookingError> {
    let first = now.date();
    let last = first + Duration::days(i64::from(config.booking_horizon_days));
    if request.date < first || request.date > last {
        return Err(BookingError::OutsideBookingWindow {
            date: request.date,
            first,
            last,
        });
    }
    if request.date.and_time(request.start_time) <= now {
        return Err(BookingError::SlotUnavailable {
            date: request.date,
            time: request.start_time,
        });
    }

    if let Attendee::Guest(guest) = &request.attendee {
        if guest.first_name.trim().is_empty() || guest.last_name.trim().is_empty() {
            return Err(BookingError::InvalidRequest("guest name is required".into()));
        }
        if !guest.email.contains('@') {
            return Err(BookingError::InvalidRequest(format!(
                "invalid guest email '{}'",
                guest.email
            )));
        }
        if guest.phone.trim().is_empty() {
            return Err(BookingError::InvalidRequest("guest phone is required".into()));
        }
    }

    if let Some(notes) = &request.notes {
        if notes.chars().count() > MAX_NOTES_LEN {
            return Err(BookingError::InvalidRequest(format!(
                "notes too long (max {MAX_NOTES_LEN} chars)"
            )));
        }
    }
    Ok(())
}

// ─── Status changes ───────────────────────────────────────────────────────────

/// Moves an appointment to `target` on behalf of `actor`.
///
/// The actor must be the appointment's own doctor or registered patient.
pub fn transition_appointment(
    conn: &mut Connection,
    appointment_id: &Uuid,
    target: AppointmentStatus,
    actor: Actor,
    reason: Option<&str>,
) -> Result<TransitionReceipt, BookingError> {
    let tx = conn.transaction()?;
    let receipt = transition_with(&*tx, appointment_id, target, actor, reason)?;
    tx.commit()?;
    Ok(receipt)
}

pub fn confirm_appointment(
    conn: &mut Connection,
    appointment_id: &Uuid,
    doctor_id: Uuid,
) -> Result<TransitionReceipt, BookingError> {
    transition_appointment(
        conn,
        appointment_id,
        AppointmentStatus::Confirmed,
        Actor::Doctor(doctor_id),
        None,
    )
}

pub fn reject_appointment(
    conn: &mut Connection,
    appointment_id: &Uuid,
    doctor_id: Uuid,
    reason: Option<&str>,
) -> Result<TransitionReceipt, BookingError> {
    transition_appointment(
        conn,
        appointment_id,
        AppointmentStatus::Rejected,
        Actor::Doctor(doctor_id),
        reason,
    )
}

pub fn cancel_appointment(
    conn: &mut Connection,
    appointment_id: &Uuid,
    actor: Actor,
    reason: Option<&str>,
) -> Result<TransitionReceipt, BookingError> {
    transition_appointment(conn, appointment_id, AppointmentStatus::Canceled, actor, reason)
}

fn transition_with<S>(
    store: &S,
    appointment_id: &Uuid,
    target: AppointmentStatus,
    actor: Actor,
    reason: Option<&str>,
) -> Result<TransitionReceipt, BookingError>
where
    S: AppointmentStore + NotificationStore + ?Sized,
{
    let appointment = store
        .get_appointment(appointment_id)?
        .ok_or_else(|| DatabaseError::NotFound {
            entity_type: "Appointment".into(),
            id: appointment_id.to_string(),
        })?;
    authorize(actor, &appointment)?;

    let outcome = lifecycle::apply(&appointment, target, actor.role(), reason)?;
    store.update_status(
        &appointment.id,
        outcome.appointment.status,
        outcome.appointment.notes.as_deref(),
    )?;
    let notification = outcome
        .notification
        .as_ref()
        .map(|draft| store.insert_notification(draft))
        .transpose()?;

    Ok(TransitionReceipt {
        appointment: outcome.appointment,
        notification,
    })
}

fn authorize(actor: Actor, appointment: &Appointment) -> Result<(), BookingError> {
    let allowed = match actor {
        Actor::Doctor(id) => appointment.doctor_id == id,
        Actor::Patient(id) => appointment.patient_id() == Some(id),
        Actor::System => true,
    };
    if allowed {
        return Ok(());
    }
    let user_id = match actor {
        Actor::Doctor(id) | Actor::Patient(id) => id,
        Actor::System => Uuid::nil(),
    };
    tracing::warn!(
        appointment_id = %appointment.id,
        %user_id,
        role = %actor.role(),
        "actor is not a party to this appointment"
    );
    Err(BookingError::NotAuthorized {
        role: actor.role(),
        user_id,
        appointment_id: appointment.id,
    })
}

/// Completes every confirmed appointment that has ended by `now`.
///
/// Returns the ids that were completed.
pub fn complete_elapsed_appointments(
    conn: &mut Connection,
    now: NaiveDateTime,
) -> Result<Vec<Uuid>, BookingError> {
    let tx = conn.transaction()?;
    let mut completed = Vec::new();
    for appointment in tx.appointments_with_status(AppointmentStatus::Confirmed)? {
        if !lifecycle::is_due_for_completion(&appointment, now) {
            continue;
        }
        let outcome = lifecycle::apply(
            &appointment,
            AppointmentStatus::Completed,
            ActorRole::System,
            None,
        )?;
        tx.update_status(&appointment.id, outcome.appointment.status, None)?;
        completed.push(appointment.id);
    }
    tx.commit()?;
    if !completed.is_empty() {
        tracing::info!(count = completed.len(), "completed elapsed appointments");
    }
    Ok(completed)
}
