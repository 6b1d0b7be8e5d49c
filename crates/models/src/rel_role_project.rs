//! Per-role permission levels inside one project.
//!
//! Levels: 0 hidden, 1 read, 2 write, 3 delete.
use sea_orm::{entity::prelude::*, Set, DatabaseConnection};
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;
use crate::{project, role};

pub const MAX_LEVEL: i16 = 3;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "rel_role_project")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub role_id: i64,
    pub project_id: i64,
    pub source_permission: i16,
    pub view_permission: i16,
    pub widget_permission: i16,
    pub viz_permission: i16,
    pub schedule_permission: i16,
    pub share_permission: bool,
    pub download_permission: bool,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { Role, Project }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Role => Entity::belongs_to(role::Entity).from(Column::RoleId).to(role::Column::Id).into(),
            Relation::Project => Entity::belongs_to(project::Entity).from(Column::ProjectId).to(project::Column::Id).into(),
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Levels granted to a role, in column order.
#[derive(Debug, Clone, Copy, Default)]
pub struct Grant {
    pub source: i16,
    pub view: i16,
    pub widget: i16,
    pub viz: i16,
    pub schedule: i16,
    pub share: bool,
    pub download: bool,
}

fn check_level(name: &str, level: i16) -> Result<(), ModelError> {
    if !(0..=MAX_LEVEL).contains(&level) {
        return Err(ModelError::Validation(format!("{name} permission out of range: {level}")));
    }
    Ok(())
}

pub async fn grant(db: &DatabaseConnection, role_id: i64, project_id: i64, g: Grant) -> Result<Model, ModelError> {
    check_level("source", g.source)?;
    check_level("view", g.view)?;
    check_level("widget", g.widget)?;
    check_level("viz", g.viz)?;
    check_level("schedule", g.schedule)?;
    let am = ActiveModel {
        role_id: Set(role_id),
        project_id: Set(project_id),
        source_permission: Set(g.source),
        view_permission: Set(g.view),
        widget_permission: Set(g.widget),
        viz_permission: Set(g.viz),
        schedule_permission: Set(g.schedule),
        share_permission: Set(g.share),
        download_permission: Set(g.download),
        ..Default::default()
    };
    Ok(am.insert(db).await?)
}
