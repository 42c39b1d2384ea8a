use rusqlite::{params, Connection};
use uuid::Uuid;

use super::{format_time, parse_time, parse_uuid};
use crate::db::DatabaseError;
use crate::models::*;

pub fn insert_availability(
    conn: &Connection,
    window: &AvailabilityWindow,
) -> Result<(), DatabaseError> {
    if window.day_of_week > 6 {
        return Err(DatabaseError::ConstraintViolation(format!(
            "day_of_week must be 0..=6, got {}",
            window.day_of_week
        )));
    }
    conn.execute(
        "INSERT INTO doctor_availability (id, doctor_id, day_of_week, start_time, end_time)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            window.id.to_string(),
            window.doctor_id.to_string(),
            window.day_of_week,
            format_time(&window.start_time),
            format_time(&window.end_time),
        ],
    )?;
    Ok(())
}

/// Windows for one doctor on one weekday, earliest first.
pub fn get_availability(
    conn: &Connection,
    doctor_id: &Uuid,
    day_of_week: u8,
) -> Result<Vec<AvailabilityWindow>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, doctor_id, day_of_week, start_time, end_time
         FROM doctor_availability
         WHERE doctor_id = ?1 AND day_of_week = ?2
         ORDER BY start_time",
    )?;
    let rows = stmt.query_map(params![doctor_id.to_string(), day_of_week], read_row)?;
    collect_windows(rows)
}

/// Every window for a doctor, ordered by weekday then start.
pub fn list_availability(
    conn: &Connection,
    doctor_id: &Uuid,
) -> Result<Vec<AvailabilityWindow>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, doctor_id, day_of_week, start_time, end_time
         FROM doctor_availability
         WHERE doctor_id = ?1
         ORDER BY day_of_week, start_time",
    )?;
    let rows = stmt.query_map(params![doctor_id.to_string()], read_row)?;
    collect_windows(rows)
}

pub fn delete_availability(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "DELETE FROM doctor_availability WHERE id = ?1",
        params![id.to_string()],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "AvailabilityWindow".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

type WindowRow = (String, String, u8, String, String);

fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<WindowRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
    ))
}

fn collect_windows(
    rows: impl Iterator<Item = rusqlite::Result<WindowRow>>,
) -> Result<Vec<AvailabilityWindow>, DatabaseError> {
    let mut windows = Vec::new();
    for row in rows {
        let (id, doctor_id, day_of_week, start_time, end_time) = row?;
        windows.push(AvailabilityWindow {
            id: parse_uuid(&id)?,
            doctor_id: parse_uuid(&doctor_id)?,
            day_of_week,
            start_time: parse_time(&start_time)?,
            end_time: parse_time(&end_time)?,
        });
    }
    Ok(windows)
}
