pub mod extractor;
pub mod handlers;
pub mod password;
pub mod sessions;
pub mod users;

pub use extractor::{AdminUser, CurrentUser};

/// Name of the HttpOnly cookie carrying the session token.
pub const SESSION_COOKIE: &str = "token";
