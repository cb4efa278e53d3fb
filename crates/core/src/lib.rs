//! OffboardPro domain logic.
//!
//! Pure rules and constants with no I/O, shared by the repository layer,
//! the background workers, and the HTTP handlers.

pub mod billing;
pub mod entitlements;
pub mod error;
pub mod hashing;
pub mod offboarding;
pub mod revocation;
pub mod roles;
pub mod survey;
pub mod trial;
pub mod types;
pub mod validation;
