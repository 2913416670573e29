pub mod handlers;
pub mod models;
pub mod router;
pub mod service;

pub use models::{Faq, FaqError};
pub use router::faq_routes;
pub use service::FaqService;
