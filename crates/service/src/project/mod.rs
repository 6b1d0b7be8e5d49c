//! Project access: membership, maintainers and per-role permission levels.

pub mod domain;
pub mod repository;
pub mod repo;
pub mod service;

pub use domain::{ProjectDetail, ProjectPermission, UserPermission};
pub use service::ProjectService;
