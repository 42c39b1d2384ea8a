use std::str::FromStr;

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::{format_time, parse_date, parse_time, parse_uuid, DATE_FORMAT};
use crate::db::DatabaseError;
use crate::models::*;

const SELECT_COLUMNS: &str =
    "SELECT id, doctor_id, patient_id, guest_first_name, guest_last_name, guest_email,
            guest_phone, appointment_date, start_time, end_time, status, notes
     FROM appointments";

/// Inserts a `pending` appointment and returns it with its new id.
pub fn create_appointment(
    conn: &Connection,
    new: &NewAppointment,
) -> Result<Appointment, DatabaseError> {
    let appointment = Appointment {
        id: Uuid::new_v4(),
        doctor_id: new.doctor_id,
        attendee: new.attendee.clone(),
        appointment_date: new.appointment_date,
        start_time: new.start_time,
        end_time: new.end_time,
        status: AppointmentStatus::Pending,
        notes: new.notes.clone(),
    };

    let (patient_id, guest) = match &appointment.attendee {
        Attendee::Patient { id } => (Some(id.to_string()), None),
        Attendee::Guest(contact) => (None, Some(contact)),
    };

    conn.execute(
        "INSERT INTO appointments
         (id, doctor_id, patient_id, guest_first_name, guest_last_name, guest_email,
          guest_phone, appointment_date, start_time, end_time, status, notes)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            appointment.id.to_string(),
            appointment.doctor_id.to_string(),
            patient_id,
            guest.map(|g| g.first_name.as_str()),
            guest.map(|g| g.last_name.as_str()),
            guest.map(|g| g.email.as_str()),
            guest.map(|g| g.phone.as_str()),
            appointment.appointment_date.format(DATE_FORMAT).to_string(),
            format_time(&appointment.start_time),
            format_time(&appointment.end_time),
            appointment.status.as_str(),
            appointment.notes,
        ],
    )?;
    Ok(appointment)
}

pub fn get_appointment(conn: &Connection, id: &Uuid) -> Result<Option<Appointment>, DatabaseError> {
    let sql = format!("{SELECT_COLUMNS} WHERE id = ?1");
    let row = conn
        .query_row(&sql, params![id.to_string()], read_row)
        .optional()?;
    row.map(into_appointment).transpose()
}

/// Every appointment a doctor has on a date, whatever its status.
pub fn get_appointments(
    conn: &Connection,
    doctor_id: &Uuid,
    date: &NaiveDate,
) -> Result<Vec<Appointment>, DatabaseError> {
    let sql = format!(
        "{SELECT_COLUMNS} WHERE doctor_id = ?1 AND appointment_date = ?2 ORDER BY start_time"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(
        params![doctor_id.to_string(), date.format(DATE_FORMAT).to_string()],
        read_row,
    )?;
    collect_appointments(rows)
}

pub fn list_doctor_appointments(
    conn: &Connection,
    doctor_id: &Uuid,
) -> Result<Vec<Appointment>, DatabaseError> {
    let sql = format!(
        "{SELECT_COLUMNS} WHERE doctor_id = ?1 ORDER BY appointment_date, start_time"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![doctor_id.to_string()], read_row)?;
    collect_appointments(rows)
}

pub fn list_patient_appointments(
    conn: &Connection,
    patient_id: &Uuid,
) -> Result<Vec<Appointment>, DatabaseError> {
    let sql = format!(
        "{SELECT_COLUMNS} WHERE patient_id = ?1 ORDER BY appointment_date, start_time"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![patient_id.to_string()], read_row)?;
    collect_appointments(rows)
}

pub fn appointments_with_status(
    conn: &Connection,
    status: AppointmentStatus,
) -> Result<Vec<Appointment>, DatabaseError> {
    let sql = format!(
        "{SELECT_COLUMNS} WHERE status = ?1 ORDER BY appointment_date, start_time"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![status.as_str()], read_row)?;
    collect_appointments(rows)
}

/// Sets the status; `notes = None` leaves existing notes untouched.
pub fn update_appointment_status(
    conn: &Connection,
    id: &Uuid,
    status: AppointmentStatus,
    notes: Option<&str>,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE appointments SET status = ?1, notes = COALESCE(?2, notes) WHERE id = ?3",
        params![status.as_str(), notes, id.to_string()],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Appointment".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

struct AppointmentRow {
    id: String,
    doctor_id: String,
    patient_id: Option<String>,
    guest_first_name: Option<String>,
    guest_last_name: Option<String>,
    guest_email: Option<String>,
    guest_phone: Option<String>,
    appointment_date: String,
    start_time: String,
    end_time: String,
    status: String,
    notes: Option<String>,
}

fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<AppointmentRow> {
    Ok(AppointmentRow {
        id: row.get(0)?,
        doctor_id: row.get(1)?,
        patient_id: row.get(2)?,
        guest_first_name: row.get(3)?,
        guest_last_name: row.get(4)?,
        guest_email: row.get(5)?,
        guest_phone: row.get(6)?,
        appointment_date: row.get(7)?,
        start_time: row.get(8)?,
        end_time: row.get(9)?,
        status: row.get(10)?,
        notes: row.get(11)?,
    })
}

fn into_appointment(row: AppointmentRow) -> Result<Appointment, DatabaseError> {
    let attendee = match row.patient_id {
        Some(patient_id) => Attendee::Patient {
            id: parse_uuid(&patient_id)?,
        },
        None => Attendee::Guest(GuestContact {
            first_name: row.guest_first_name.unwrap_or_default(),
            last_name: row.guest_last_name.unwrap_or_default(),
            email: row.guest_email.unwrap_or_default(),
            phone: row.guest_phone.unwrap_or_default(),
        }),
    };

    Ok(Appointment {
        id: parse_uuid(&row.id)?,
        doctor_id: parse_uuid(&row.doctor_id)?,
        attendee,
        appointment_date: parse_date(&row.appointment_date)?,
        start_time: parse_time(&row.start_time)?,
        end_time: parse_time(&row.end_time)?,
        status: AppointmentStatus::from_str(&row.status)?,
        notes: row.notes,
    })
}

fn collect_appointments(
    rows: impl Iterator<Item = rusqlite::Result<AppointmentRow>>,
) -> Result<Vec<Appointment>, DatabaseError> {
    rows.map(|r| into_appointment(r?)).collect()
}
