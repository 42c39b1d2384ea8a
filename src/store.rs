//! Collaborator seams for the booking flow.
//!
//! The slot generator and status machine never touch storage; the booking
//! service reaches storage only through these traits. `rusqlite::Connection`
//! implements all of them (and so does a `Transaction`, through deref).

use chrono::NaiveDate;
use rusqlite::Connection;
use uuid::Uuid;

use crate::db::{self, DatabaseError};
use crate::models::{
    Appointment, AppointmentStatus, AvailabilityWindow, NewAppointment, Notification,
    NotificationDraft, Profile,
};

pub trait AvailabilityStore {
    fn get_availability(
        &self,
        doctor_id: &Uuid,
        day_of_week: u8,
    ) -> Result<Vec<AvailabilityWindow>, DatabaseError>;
}

pub trait AppointmentStore {
    fn get_appointments(
        &self,
        doctor_id: &Uuid,
        date: &NaiveDate,
    ) -> Result<Vec<Appointment>, DatabaseError>;

    fn get_appointment(&self, id: &Uuid) -> Result<Option<Appointment>, DatabaseError>;

    fn create_appointment(&self, new: &NewAppointment) -> Result<Appointment, DatabaseError>;

    fn update_status(
        &self,
        id: &Uuid,
        status: AppointmentStatus,
        notes: Option<&str>,
    ) -> Result<(), DatabaseError>;

    fn appointments_with_status(
        &self,
        status: AppointmentStatus,
    ) -> Result<Vec<Appointment>, DatabaseError>;
}

pub trait NotificationStore {
    fn insert_notification(
        &self,
        draft: &NotificationDraft,
    ) -> Result<Notification, DatabaseError>;
}

pub trait ProfileStore {
    fn get_profile(&self, id: &Uuid) -> Result<Option<Profile>, DatabaseError>;
}

impl AvailabilityStore for Connection {
    fn get_availability(
        &self,
        doctor_id: &Uuid,
        day_of_week: u8,
    ) -> Result<Vec<AvailabilityWindow>, DatabaseError> {
        db::get_availability(self, doctor_id, day_of_week)
    }
}

impl AppointmentStore for Connection {
    fn get_appointments(
        &self,
        doctor_id: &Uuid,
        date: &NaiveDate,
    ) -> Result<Vec<Appointment>, DatabaseError> {
        db::get_appointments(self, doctor_id, date)
    }

    fn get_appointment(&self, id: &Uuid) -> Result<Option<Appointment>, DatabaseError> {
        db::get_appointment(self, id)
    }

    fn create_appointment(&self, new: &NewAppointment) -> Result<Appointment, DatabaseError> {
        db::create_appointment(self, new)
    }

    fn update_status(
        &self,
        id: &Uuid,
        status: AppointmentStatus,
        notes: Option<&str>,
    ) -> Result<(), DatabaseError> {
        db::update_appointment_status(self, id, status, notes)
    }

    fn appointments_with_status(
        &self,
        status: AppointmentStatus,
    ) -> Result<Vec<Appointment>, DatabaseError> {
        db::appointments_with_status(self, status)
    }
}

impl NotificationStore for Connection {
    fn insert_notification(
        &self,
        draft: &NotificationDraft,
    ) -> Result<Notification, DatabaseError> {
        db::insert_notification(self, draft)
    }
}

impl ProfileStore for Connection {
    fn get_profile(&self, id: &Uuid) -> Result<Option<Profile>, DatabaseError> {
        db::get_profile(self, id)
    }
}
