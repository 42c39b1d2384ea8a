//! Appointment status machine.
//!
//! Every legal move is a row in [`TRANSITIONS`]; anything not listed,
//! including any move out of a terminal status, is rejected. Applying a
//! transition is pure: it returns the updated appointment and at most one
//! notification draft, and the caller persists both.

use chrono::NaiveDateTime;
use thiserror::Error;

use crate::models::{ActorRole, Appointment, AppointmentStatus, NotificationDraft};
use crate::notifications;

/// Notes written on a rejection when the doctor gives no reason.
pub const DEFAULT_REJECTION_NOTE: &str = "Appointment rejected by doctor";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Invalid transition from {from} to {to} by {actor}")]
    InvalidTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
        actor: ActorRole,
    },
}

/// Who hears about a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Recipient {
    Nobody,
    Patient,
    /// The party that did not act.
    Counterpart,
}

struct Transition {
    from: AppointmentStatus,
    to: AppointmentStatus,
    actors: &'static [ActorRole],
    notify: Recipient,
}

const TRANSITIONS: &[Transition] = &[
    Transition {
        from: AppointmentStatus::Pending,
        to: AppointmentStatus::Confirmed,
        actors: &[ActorRole::Doctor],
        notify: Recipient::Patient,
    },
    Transition {
        from: AppointmentStatus::Pending,
        to: AppointmentStatus::Rejected,
        actors: &[ActorRole::Doctor],
        notify: Recipient::Patient,
    },
    Transition {
        from: AppointmentStatus::Pending,
        to: AppointmentStatus::Canceled,
        actors: &[ActorRole::Patient],
        notify: Recipient::Nobody,
    },
    Transition {
        from: AppointmentStatus::Confirmed,
        to: AppointmentStatus::Canceled,
        actors: &[ActorRole::Patient, ActorRole::Doctor],
        notify: Recipient::Counterpart,
    },
    Transition {
        from: AppointmentStatus::Confirmed,
        to: AppointmentStatus::Completed,
        actors: &[ActorRole::System],
        notify: Recipient::Nobody,
    },
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionOutcome {
    pub appointment: Appointment,
    pub notification: Option<NotificationDraft>,
}

fn find_transition(
    from: AppointmentStatus,
    to: AppointmentStatus,
    actor: ActorRole,
) -> Option<&'static Transition> {
    TRANSITIONS
        .iter()
        .find(|t| t.from == from && t.to == to && t.actors.contains(&actor))
}

/// Statuses `actor` may move an appointment in `status` to.
pub fn allowed_targets(status: AppointmentStatus, actor: ActorRole) -> Vec<AppointmentStatus> {
    TRANSITIONS
        .iter()
        .filter(|t| t.from == status && t.actors.contains(&actor))
        .map(|t| t.to)
        .collect()
}

/// Validates and applies one status change.
///
/// `reason` becomes the appointment notes on rejection (falling back to
/// [`DEFAULT_REJECTION_NOTE`]) and on cancellation when provided.
pub fn apply(
    appointment: &Appointment,
    target: AppointmentStatus,
    actor: ActorRole,
    reason: Option<&str>,
) -> Result<TransitionOutcome, TransitionError> {
    let from = appointment.status;
    let transition = find_transition(from, target, actor).ok_or_else(|| {
        tracing::warn!(
            appointment_id = %appointment.id,
            %from,
            to = %target,
            %actor,
            terminal = from.is_terminal(),
            "rejected appointment status transition"
        );
        TransitionError::InvalidTransition {
            from,
            to: target,
            actor,
        }
    })?;

    let reason = reason.map(str::trim).filter(|r| !r.is_empty());

    let mut updated = appointment.clone();
    updated.status = target;
    match target {
        AppointmentStatus::Rejected => {
            updated.notes = Some(reason.unwrap_or(DEFAULT_REJECTION_NOTE).to_string());
        }
        AppointmentStatus::Canceled => {
            if let Some(reason) = reason {
                updated.notes = Some(reason.to_string());
            }
        }
        _ => {}
    }

    let recipient = match transition.notify {
        Recipient::Nobody => None,
        Recipient::Patient => appointment.patient_id(),
        Recipient::Counterpart => match actor {
            ActorRole::Patient => Some(appointment.doctor_id),
            _ => appointment.patient_id(),
        },
    };
    if transition.notify != Recipient::Nobody && recipient.is_none() {
        tracing::debug!(
            appointment_id = %appointment.id,
            "guest attendee has no account, skipping notification"
        );
    }

    let notification = recipient.map(|user_id| match target {
        AppointmentStatus::Confirmed => notifications::appointment_confirmed(user_id, appointment),
        AppointmentStatus::Rejected => {
            notifications::appointment_rejected(user_id, appointment, reason)
        }
        _ => notifications::appointment_canceled(user_id, appointment, actor),
    });

    tracing::info!(
        appointment_id = %appointment.id,
        %from,
        to = %target,
        %actor,
        notified = notification.is_some(),
        "appointment status changed"
    );

    Ok(TransitionOutcome {
        appointment: updated,
        notification,
    })
}

/// A confirmed appointment whose end has passed is ready to be completed.
pub fn is_due_for_completion(appointment: &Appointment, now: NaiveDateTime) -> bool {
    appointment.status == AppointmentStatus::Confirmed && appointment.ends_at() <= now
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Attendee, GuestContact};
    use chrono::{NaiveDate, NaiveTime};
    use uuid::Uuid;
    use crate::models::AppointmentStatus::*;

    const ALL: [AppointmentStatus; 5] = [Pending, Confirmed, Completed, Canceled, Rejected];
    const ACTORS: [ActorRole; 3] = [ActorRole::Patient, ActorRole::Doctor, ActorRole::System];

    fn appointment(status: AppointmentStatus) -> Appointment {
        Appointment {
            id: Uuid::new_v4(),
            doctor_id: Uuid::new_v4(),
            attendee: Attendee::Patient { id: Uuid::new_v4() },
            appointment_date: NaiveDate::from_ymd_opt(2026, 4, 14).unwrap(),
            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
            status,
            notes: None,
        }
    }

    #[test]
    fn doctor_confirms_pending_and_patient_is_notified() {
        let appt = appointment(Pending);
        let outcome = apply(&appt, Confirmed, ActorRole::Doctor, None).unwrap();

        assert_eq!(outcome.appointment.status, Confirmed);
        let note = outcome.notification.expect("patient should be notified");
        assert_eq!(Some(note.user_id), appt.patient_id());
        assert_eq!(note.title, "Appointment Confirmed");
        assert_eq!(note.related_id, Some(appt.id));
    }

    #[test]
    fn completed_cannot_be_confirmed() {
        let err = apply(&appointment(Completed), Confirmed, ActorRole::Doctor, None).unwrap_err();
        assert_eq!(
            err,
            TransitionError::InvalidTransition {
                from: Completed,
                to: Confirmed,
                actor: ActorRole::Doctor,
            }
        );
    }

    #[test]
    fn rejected_cannot_be_confirmed() {
        assert!(apply(&appointment(Rejected), Confirmed, ActorRole::Doctor, None).is_err());
    }

    #[test]
    fn terminal_statuses_have_no_exits() {
        for from in [Completed, Canceled, Rejected] {
            for to in ALL {
                for actor in ACTORS {
                    assert!(
                        apply(&appointment(from), to, actor, None).is_err(),
                        "{from} -> {to} by {actor} should fail"
                    );
                }
            }
        }
    }

    #[test]
    fn table_is_exactly_the_legal_moves() {
        let mut legal = Vec::new();
        for from in ALL {
            for to in ALL {
                for actor in ACTORS {
                    if apply(&appointment(from), to, actor, None).is_ok() {
                        legal.push((from, to, actor));
                    }
                }
            }
        }
        assert_eq!(
            legal,
            vec![
                (Pending, Confirmed, ActorRole::Doctor),
                (Pending, Canceled, ActorRole::Patient),
                (Pending, Rejected, ActorRole::Doctor),
                (Confirmed, Completed, ActorRole::System),
                (Confirmed, Canceled, ActorRole::Patient),
                (Confirmed, Canceled, ActorRole::Doctor),
            ]
        );
    }

    #[test]
    fn patient_cannot_confirm_own_request() {
        assert!(apply(&appointment(Pending), Confirmed, ActorRole::Patient, None).is_err());
    }

    #[test]
    fn rejection_records_reason_or_default() {
        let appt = appointment(Pending);

        let outcome = apply(&appt, Rejected, ActorRole::Doctor, Some("On leave")).unwrap();
        assert_eq!(outcome.appointment.notes.as_deref(), Some("On leave"));
        let note = outcome.notification.unwrap();
        assert!(note.message.ends_with("Reason: On leave"));

        let outcome = apply(&appt, Rejected, ActorRole::Doctor, None).unwrap();
        assert_eq!(outcome.appointment.notes.as_deref(), Some(DEFAULT_REJECTION_NOTE));
    }

    #[test]
    fn pending_cancel_by_patient_notifies_nobody() {
        let outcome = apply(&appointment(Pending), Canceled, ActorRole::Patient, None).unwrap();
        assert_eq!(outcome.appointment.status, Canceled);
        assert!(outcome.notification.is_none());
    }

    #[test]
    fn confirmed_cancel_notifies_the_other_party() {
        let appt = appointment(Confirmed);

        let by_patient = apply(&appt, Canceled, ActorRole::Patient, None).unwrap();
        assert_eq!(by_patient.notification.unwrap().user_id, appt.doctor_id);

        let by_doctor = apply(&appt, Canceled, ActorRole::Doctor, Some("Emergency")).unwrap();
        assert_eq!(Some(by_doctor.notification.unwrap().user_id), appt.patient_id());
        assert_eq!(by_doctor.appointment.notes.as_deref(), Some("Emergency"));
    }

    #[test]
    fn completion_is_silent() {
        let outcome = apply(&appointment(Confirmed), Completed, ActorRole::System, None).unwrap();
        assert!(outcome.notification.is_none());
    }

    #[test]
    fn guest_attendee_gets_no_notification() {
        let mut appt = appointment(Pending);
        appt.attendee = Attendee::Guest(GuestContact {
            first_name: "Noor".into(),
            last_name: "Haddad".into(),
            email: "noor@example.com".into(),
            phone: "555-0123".into(),
        });
        let outcome = apply(&appt, Confirmed, ActorRole::Doctor, None).unwrap();
        assert_eq!(outcome.appointment.status, Confirmed);
        assert!(outcome.notification.is_none());
    }

    #[test]
    fn apply_does_not_touch_input() {
        let appt = appointment(Pending);
        let _ = apply(&appt, Confirmed, ActorRole::Doctor, None).unwrap();
        assert_eq!(appt.status, Pending);
    }

    #[test]
    fn allowed_targets_follow_table() {
        assert_eq!(allowed_targets(Pending, ActorRole::Doctor), vec![Confirmed, Rejected]);
        assert_eq!(allowed_targets(Pending, ActorRole::Patient), vec![Canceled]);
        assert_eq!(allowed_targets(Confirmed, ActorRole::System), vec![Completed]);
        assert!(allowed_targets(Canceled, ActorRole::Doctor).is_empty());
    }

    #[test]
    fn due_for_completion_needs_confirmed_and_elapsed() {
        let appt = appointment(Confirmed);
        let end = appt.ends_at();
        assert!(is_due_for_completion(&appt, end));
        assert!(!is_due_for_completion(&appt, end - chrono::Duration::minutes(1)));
        assert!(!is_due_for_completion(&appointment(Pending), end));
    }
}
