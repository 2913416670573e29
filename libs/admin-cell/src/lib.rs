pub mod handlers;
pub mod middleware;
pub mod models;
pub mod router;
pub mod service;

pub use models::{AdminError, AdminStats};
pub use router::admin_routes;
pub use service::DashboardService;
