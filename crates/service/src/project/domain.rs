use serde::{Deserialize, Serialize};

use models::rel_user_project::ROLE_MAINTAINER;

/// Permission level on one resource kind of a project, totally ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(i16)]
pub enum UserPermission {
    Hidden = 0,
    Read = 1,
    Write = 2,
    Delete = 3,
}

impl UserPermission {
    /// Out-of-range levels clamp into `Hidden..=Delete`.
    pub fn from_level(level: i16) -> Self {
        match level {
            i16::MIN..=0 => UserPermission::Hidden,
            1 => UserPermission::Read,
            2 => UserPermission::Write,
            _ => UserPermission::Delete,
        }
    }

    pub fn level(self) -> i16 { self as i16 }
}

/// Effective permissions of one user inside one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectPermission {
    pub source_permission: UserPermission,
    pub view_permission: UserPermission,
    pub widget_permission: UserPermission,
    pub viz_permission: UserPermission,
    pub schedule_permission: UserPermission,
    pub share_permission: bool,
    pub download_permission: bool,
}

impl Default for ProjectPermission {
    fn default() -> Self {
        Self {
            source_permission: UserPermission::Hidden,
            view_permission: UserPermission::Hidden,
            widget_permission: UserPermission::Hidden,
            viz_permission: UserPermission::Read,
            schedule_permission: UserPermission::Hidden,
            share_permission: false,
            download_permission: false,
        }
    }
}

impl ProjectPermission {
    pub fn maintainer() -> Self {
        Self {
            source_permission: UserPermission::Delete,
            view_permission: UserPermission::Delete,
            widget_permission: UserPermission::Delete,
            viz_permission: UserPermission::Delete,
            schedule_permission: UserPermission::Delete,
            share_permission: true,
            download_permission: true,
        }
    }

    /// Raise every field to at least what `grant` allows.
    pub fn merge(&mut self, grant: &models::rel_role_project::Model) {
        self.source_permission = self.source_permission.max(UserPermission::from_level(grant.source_permission));
        self.view_permission = self.view_permission.max(UserPermission::from_level(grant.view_permission));
        self.widget_permission = self.widget_permission.max(UserPermission::from_level(grant.widget_permission));
        self.viz_permission = self.viz_permission.max(UserPermission::from_level(grant.viz_permission));
        self.schedule_permission = self.schedule_permission.max(UserPermission::from_level(grant.schedule_permission));
        self.share_permission |= grant.share_permission;
        self.download_permission |= grant.download_permission;
    }
}

/// A project together with the caller's membership row, if any.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectDetail {
    pub project: models::project::Model,
    pub membership: Option<i16>,
}

impl ProjectDetail {
    pub fn is_owner(&self, user_id: i64) -> bool { self.project.user_id == user_id }

    pub fn is_member(&self) -> bool { self.membership.is_some() }

    pub fn is_maintainer(&self, user_id: i64) -> bool {
        self.is_owner(user_id) || self.membership == Some(ROLE_MAINTAINER)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProjectCreate {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub visibility: bool,
}
