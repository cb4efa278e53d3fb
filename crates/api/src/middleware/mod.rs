//! Authentication and authorization extractors.
//!
//! - [`auth::AuthUser`] -- the caller identified by a JWT Bearer token.
//! - [`org::OrgMember`] -- an active caller resolved to their organization.
//! - [`rbac::RequireTemplateAuthor`] -- `admin` or `hr_manager`.
//! - [`rbac::RequireSecurityRole`] -- `admin` or `it_manager`.

pub mod auth;
pub mod org;
pub mod rbac;
