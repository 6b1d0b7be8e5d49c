//! Service layer for the dashboard hub: business rules on top of `models`.
//! - Repository traits separate rules from data access; SeaORM and in-memory impls.
//! - Permission checks go through `project::ProjectService`.
//! - Errors are `errors::ServiceError`, mapped to HTTP by the server crate.

pub mod errors;
pub mod auth;
pub mod project;
pub mod portal;
pub mod source;
#[cfg(test)]
pub mod test_support;
