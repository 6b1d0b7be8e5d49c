//! Dashboard portals: permission-gated CRUD, role visibility and team exclusions.

pub mod domain;
pub mod repository;
pub mod repo;
pub mod service;

pub use service::DashboardPortalService;
