use sea_orm::{entity::prelude::*, Set, DatabaseConnection};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;
use crate::{dashboard_portal, role};

/// A row with `visible = false` hides the portal from members of the role.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "rel_role_portal")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub role_id: i64,
    pub portal_id: i64,
    pub visible: bool,
    pub create_by: i64,
    pub create_time: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { Role, DashboardPortal }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Role => Entity::belongs_to(role::Entity).from(Column::RoleId).to(role::Column::Id).into(),
            Relation::DashboardPortal => Entity::belongs_to(dashboard_portal::Entity)
                .from(Column::PortalId)
                .to(dashboard_portal::Column::Id)
                .into(),
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}

pub fn new_active(role_id: i64, portal_id: i64, visible: bool, create_by: i64) -> ActiveModel {
    ActiveModel {
        role_id: Set(role_id),
        portal_id: Set(portal_id),
        visible: Set(visible),
        create_by: Set(create_by),
        create_time: Set(Utc::now()),
        ..Default::default()
    }
}

pub async fn create(db: &DatabaseConnection, role_id: i64, portal_id: i64, visible: bool, create_by: i64) -> Result<Model, ModelError> {
    Ok(new_active(role_id, portal_id, visible, create_by).insert(db).await?)
}
