pub mod client;
pub mod notes;

pub use client::ClientService;
pub use notes::MedicalNoteService;
