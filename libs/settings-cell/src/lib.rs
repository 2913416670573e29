pub mod handlers;
pub mod models;
pub mod router;
pub mod service;

pub use models::{Settings, SettingsError};
pub use router::settings_routes;
pub use service::SettingsService;
