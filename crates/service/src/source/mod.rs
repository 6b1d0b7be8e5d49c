//! Data sources: stored connections, file upload into them and schema introspection.

pub mod client;
pub mod dialect;
pub mod domain;
pub mod repository;
pub mod repo;
pub mod service;
pub mod sql;
pub mod upload;

pub use service::SourceService;
