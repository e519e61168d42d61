pub mod auth;
pub mod error;

pub use auth::{Requester, RequesterRole};
pub use error::AppError;
