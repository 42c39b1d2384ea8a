//! Wording of the notifications the booking flow sends.
//!
//! Builders only produce drafts; persisting them is the caller's job.

use chrono::{NaiveDate, NaiveTime};

use crate::models::{
    ActorRole, Appointment, Attendee, NotificationDraft, NotificationType, Profile,
};

fn long_date(date: &NaiveDate) -> String {
    date.format("%b %-d, %Y").to_string()
}

fn short_date(date: &NaiveDate) -> String {
    date.format("%b %d").to_string()
}

fn clock(time: &NaiveTime) -> String {
    time.format("%-I:%M %p").to_string()
}

fn appointment_draft(
    recipient: uuid::Uuid,
    appointment: &Appointment,
    title: &str,
    message: String,
) -> NotificationDraft {
    NotificationDraft {
        user_id: recipient,
        title: title.to_string(),
        message,
        notification_type: NotificationType::Appointment,
        related_id: Some(appointment.id),
    }
}

/// Tells the doctor someone asked for a slot.
///
/// `patient` is the registered patient's profile; it is ignored for guests.
pub fn booking_requested(appointment: &Appointment, patient: Option<&Profile>) -> NotificationDraft {
    let when = format!(
        "{} at {}",
        short_date(&appointment.appointment_date),
        clock(&appointment.start_time)
    );
    let (title, message) = match &appointment.attendee {
        Attendee::Guest(guest) => (
            "New Guest Appointment Request",
            format!("{} (Guest) has requested an appointment on {when}", guest.full_name()),
        ),
        Attendee::Patient { .. } => {
            let name = patient
                .map(Profile::full_name)
                .unwrap_or_else(|| "A patient".to_string());
            (
                "New Appointment Request",
                format!("{name} has requested an appointment on {when}"),
            )
        }
    };
    appointment_draft(appointment.doctor_id, appointment, title, message)
}

pub fn appointment_confirmed(recipient: uuid::Uuid, appointment: &Appointment) -> NotificationDraft {
    let message = format!(
        "Your appointment on {} at {} has been confirmed.",
        long_date(&appointment.appointment_date),
        clock(&appointment.start_time)
    );
    appointment_draft(recipient, appointment, "Appointment Confirmed", message)
}

pub fn appointment_rejected(
    recipient: uuid::Uuid,
    appointment: &Appointment,
    reason: Option<&str>,
) -> NotificationDraft {
    let mut message = format!(
        "Your appointment on {} at {} has been rejected.",
        long_date(&appointment.appointment_date),
        clock(&appointment.start_time)
    );
    if let Some(reason) = reason.filter(|r| !r.trim().is_empty()) {
        message.push_str(&format!(" Reason: {reason}"));
    }
    appointment_draft(recipient, appointment, "Appointment Rejected", message)
}

pub fn appointment_canceled(
    recipient: uuid::Uuid,
    appointment: &Appointment,
    canceled_by: ActorRole,
) -> NotificationDraft {
    let message = format!(
        "Your appointment on {} at {} has been canceled by the {}.",
        long_date(&appointment.appointment_date),
        clock(&appointment.start_time),
        canceled_by.as_str()
    );
    appointment_draft(recipient, appointment, "Appointment Canceled", message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AppointmentStatus, GuestContact, ProfileRole};
    use uuid::Uuid;

    fn appointment(attendee: Attendee) -> Appointment {
        Appointment {
            id: Uuid::new_v4(),
            doctor_id: Uuid::new_v4(),
            attendee,
            appointment_date: NaiveDate::from_ymd_opt(2026, 3, 5).unwrap(),
            start_time: NaiveTime::from_hms_opt(14, 30, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(15, 0, 0).unwrap(),
            status: AppointmentStatus::Pending,
            notes: None,
        }
    }

    #[test]
    fn request_names_registered_patient() {
        let patient = Profile {
            id: Uuid::new_v4(),
            first_name: "Maya".into(),
            last_name: "Okafor".into(),
            role: ProfileRole::Patient,
            specialty: None,
        };
        let appt = appointment(Attendee::Patient { id: patient.id });
        let draft = booking_requested(&appt, Some(&patient));

        assert_eq!(draft.user_id, appt.doctor_id);
        assert_eq!(draft.title, "New Appointment Request");
        assert_eq!(
            draft.message,
            "Maya Okafor has requested an appointment on Mar 05 at 2:30 PM"
        );
        assert_eq!(draft.related_id, Some(appt.id));
    }

    #[test]
    fn request_marks_guests() {
        let appt = appointment(Attendee::Guest(GuestContact {
            first_name: "Jo".into(),
            last_name: "Baker".into(),
            email: "jo@example.com".into(),
            phone: "555-0199".into(),
        }));
        let draft = booking_requested(&appt, None);
        assert_eq!(draft.title, "New Guest Appointment Request");
        assert!(draft.message.starts_with("Jo Baker (Guest) has requested"));
    }

    #[test]
    fn confirmation_wording() {
        let recipient = Uuid::new_v4();
        let appt = appointment(Attendee::Patient { id: recipient });
        let draft = appointment_confirmed(recipient, &appt);
        assert_eq!(
            draft.message,
            "Your appointment on Mar 5, 2026 at 2:30 PM has been confirmed."
        );
        assert_eq!(draft.notification_type, NotificationType::Appointment);
    }

    #[test]
    fn rejection_appends_reason_only_when_given() {
        let recipient = Uuid::new_v4();
        let appt = appointment(Attendee::Patient { id: recipient });

        let plain = appointment_rejected(recipient, &appt, None);
        assert!(plain.message.ends_with("has been rejected."));

        let blank = appointment_rejected(recipient, &appt, Some("  "));
        assert_eq!(blank.message, plain.message);

        let with_reason = appointment_rejected(recipient, &appt, Some("Fully booked"));
        assert!(with_reason.message.ends_with("has been rejected. Reason: Fully booked"));
    }

    #[test]
    fn cancellation_names_who_canceled() {
        let recipient = Uuid::new_v4();
        let appt = appointment(Attendee::Patient { id: Uuid::new_v4() });
        let draft = appointment_canceled(recipient, &appt, ActorRole::Patient);
        assert_eq!(draft.user_id, recipient);
        assert!(draft.message.ends_with("canceled by the patient."));
    }
}
