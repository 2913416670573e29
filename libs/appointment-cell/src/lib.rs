// libs/appointment-cell/src/lib.rs
//
// Scheduling core shared by the patient, doctor and admin portals:
// appointments, doctor availability and bookable slot computation.
pub mod models;
pub mod services;

pub use models::{
    Appointment, AppointmentError, AppointmentFilters, AppointmentStatus, AppointmentView,
    Availability, DoctorSummary, Period, Recurrence, TimeSlot,
};
pub use services::availability::AvailabilityService;
pub use services::booking::{AppointmentService, BookingChannel};
pub use services::doctors::DoctorDirectory;
