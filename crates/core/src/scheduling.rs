//! Scheduling rules.
//!
//! Pure functions over already-loaded appointment state. A slot is taken
//! when a non-cancelled appointment exists for the same doctor, date, and
//! slot; cancelling an appointment returns its slot to the available set.
//! The appointment ledger calls these inside its collection lock so the
//! check and the subsequent write cannot interleave with another booking.

use crate::appointments::Appointment;
use chrono::NaiveDate;
use clinic_types::{AppointmentStatus, TimeSlot};
use uuid::Uuid;

/// The fixed slot list minus every slot occupied by a non-cancelled
/// appointment for the doctor on that date. Order follows the fixed slot
/// list, not booking order.
pub fn available_slots(
    appointments: &[Appointment],
    doctor_id: Uuid,
    date: NaiveDate,
) -> Vec<TimeSlot> {
    TimeSlot::all()
        .filter(|slot| slot_is_free(appointments, doctor_id, date, *slot))
        .collect()
}

/// Whether a single slot is free for the doctor on that date.
pub fn slot_is_free(
    appointments: &[Appointment],
    doctor_id: Uuid,
    date: NaiveDate,
    slot: TimeSlot,
) -> bool {
    !appointments.iter().any(|a| {
        a.doctor_id == doctor_id
            && a.date == date
            && a.time_slot == slot
            && a.status != AppointmentStatus::Cancelled
    })
}
