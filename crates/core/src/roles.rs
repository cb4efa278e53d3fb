//! Well-known role name constants.
//!
//! These must match the `CHECK` constraint on `users.role` in
//! `20260301000002_create_users.sql`.

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_HR_MANAGER: &str = "hr_manager";
pub const ROLE_IT_MANAGER: &str = "it_manager";
pub const ROLE_MANAGER: &str = "manager";
pub const ROLE_USER: &str = "user";

/// Roles allowed to author organization templates.
pub const TEMPLATE_AUTHOR_ROLES: &[&str] = &[ROLE_ADMIN, ROLE_HR_MANAGER];

/// Roles allowed to register and revoke individual OAuth connections.
pub const SECURITY_ROLES: &[&str] = &[ROLE_ADMIN, ROLE_IT_MANAGER];
