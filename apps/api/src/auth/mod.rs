// Registration, login and bearer-token resolution.

pub mod extractor;
pub mod handlers;
pub mod jwt;
pub mod password;

pub use extractor::AuthUser;
