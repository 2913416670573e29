pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{Client, ContactPreference, MedicalNote, PatientError};
pub use router::patient_routes;
pub use services::{ClientService, MedicalNoteService};
