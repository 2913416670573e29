pub mod auth;
pub mod error;
pub mod locale;
pub mod permissions;

pub use auth::{AuthUser, Role, User};
pub use error::{AppError, FieldError};
pub use locale::Language;
pub use permissions::Permission;
