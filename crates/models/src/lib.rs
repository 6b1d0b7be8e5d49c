pub mod errors;
pub mod db;
pub mod user;
pub mod project;
pub mod rel_user_project;
pub mod role;
pub mod rel_role_user;
pub mod rel_role_project;
pub mod dashboard_portal;
pub mod dashboard;
pub mod rel_role_portal;
pub mod exclude_portal_team;
pub mod source;
pub mod view;

#[cfg(test)]
mod tests;
