use std::str::FromStr;

use chrono::{Timelike, Utc};
use rusqlite::{params, Connection};
use uuid::Uuid;

use super::{parse_datetime, parse_uuid, DATETIME_FORMAT};
use crate::db::DatabaseError;
use crate::models::*;

/// Persists a draft as an unread notification stamped with the current time.
pub fn insert_notification(
    conn: &Connection,
    draft: &NotificationDraft,
) -> Result<Notification, DatabaseError> {
    let now = Utc::now().naive_utc();
    let notification = Notification {
        id: Uuid::new_v4(),
        user_id: draft.user_id,
        title: draft.title.clone(),
        message: draft.message.clone(),
        notification_type: draft.notification_type,
        related_id: draft.related_id,
        read: false,
        // Second precision, matching what the column round-trips.
        created_at: now.with_nanosecond(0).unwrap_or(now),
    };

    conn.execute(
        "INSERT INTO notifications
         (id, user_id, title, message, type, related_id, read, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7)",
        params![
            notification.id.to_string(),
            notification.user_id.to_string(),
            notification.title,
            notification.message,
            notification.notification_type.as_str(),
            notification.related_id.map(|id| id.to_string()),
            notification.created_at.format(DATETIME_FORMAT).to_string(),
        ],
    )?;
    Ok(notification)
}

/// A user's notifications, newest first.
pub fn list_notifications(
    conn: &Connection,
    user_id: &Uuid,
) -> Result<Vec<Notification>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, title, message, type, related_id, read, created_at
         FROM notifications
         WHERE user_id = ?1
         ORDER BY created_at DESC, rowid DESC",
    )?;

    let rows = stmt.query_map(params![user_id.to_string()], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, String>(4)?,
            row.get::<_, Option<String>>(5)?,
            row.get::<_, i32>(6)?,
            row.get::<_, String>(7)?,
        ))
    })?;

    let mut notifications = Vec::new();
    for row in rows {
        let (id, user_id, title, message, kind, related_id, read, created_at) = row?;
        notifications.push(Notification {
            id: parse_uuid(&id)?,
            user_id: parse_uuid(&user_id)?,
            title,
            message,
            notification_type: NotificationType::from_str(&kind)?,
            related_id: related_id.as_deref().map(parse_uuid).transpose()?,
            read: read != 0,
            created_at: parse_datetime(&created_at)?,
        });
    }
    Ok(notifications)
}

pub fn mark_notification_read(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE notifications SET read = 1 WHERE id = ?1",
        params![id.to_string()],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Notification".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

/// Marks every unread notification of a user as read; returns how many changed.
pub fn mark_all_notifications_read(
    conn: &Connection,
    user_id: &Uuid,
) -> Result<usize, DatabaseError> {
    let changed = conn.execute(
        "UPDATE notifications SET read = 1 WHERE user_id = ?1 AND read = 0",
        params![user_id.to_string()],
    )?;
    Ok(changed)
}

pub fn unread_count(conn: &Connection, user_id: &Uuid) -> Result<i64, DatabaseError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM notifications WHERE user_id = ?1 AND read = 0",
        params![user_id.to_string()],
        |row| row.get::<_, i64>(0),
    )?;
    Ok(count)
}
