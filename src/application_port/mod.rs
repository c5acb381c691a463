mod error_kind;
mod relationship_service;
mod user_service;

pub use error_kind::*;
pub use relationship_service::*;
pub use user_service::*;
