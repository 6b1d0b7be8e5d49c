use sea_orm::{entity::prelude::*, Set, DatabaseConnection};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::errors::{self, ModelError};
use crate::dashboard_portal;

/// Folder nodes group dashboards; only type `DASHBOARD` renders.
pub const TYPE_FOLDER: i16 = 0;
pub const TYPE_DASHBOARD: i16 = 1;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "dashboard")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    pub dashboard_portal_id: i64,
    #[sea_orm(column_name = "type")]
    pub dashboard_type: i16,
    #[sea_orm(column_name = "index")]
    pub sort_index: i32,
    pub parent_id: i64,
    #[sea_orm(column_type = "Text", nullable)]
    pub config: Option<String>,
    pub create_by: i64,
    pub create_time: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { DashboardPortal }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::DashboardPortal => Entity::belongs_to(dashboard_portal::Entity)
                .from(Column::DashboardPortalId)
                .to(dashboard_portal::Column::Id)
                .into(),
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}

pub async fn create(db: &DatabaseConnection, portal_id: i64, name: &str, parent_id: i64, sort_index: i32, create_by: i64) -> Result<Model, ModelError> {
    errors::validate_name(name, 255)?;
    let am = ActiveModel {
        name: Set(name.to_string()),
        dashboard_portal_id: Set(portal_id),
        dashboard_type: Set(TYPE_DASHBOARD),
        sort_index: Set(sort_index),
        parent_id: Set(parent_id),
        config: Set(None),
        create_by: Set(create_by),
        create_time: Set(Utc::now()),
        ..Default::default()
    };
    Ok(am.insert(db).await?)
}
