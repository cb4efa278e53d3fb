//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - `Deserialize` or plain input DTOs for inserts

pub mod notification;
pub mod oauth_connection;
pub mod offboarding;
pub mod organization;
pub mod session;
pub mod survey;
pub mod template;
pub mod user;
