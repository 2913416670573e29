pub mod handlers;
pub mod models;
pub mod router;

pub use router::doctor_routes;
