use sea_orm::{entity::prelude::*, Set};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::dashboard_portal;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "exclude_portal_team")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub team_id: i64,
    pub portal_id: i64,
    pub create_by: i64,
    pub create_time: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { DashboardPortal }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::DashboardPortal => Entity::belongs_to(dashboard_portal::Entity)
                .from(Column::PortalId)
                .to(dashboard_portal::Column::Id)
                .into(),
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}

pub fn new_active(portal_id: i64, team_id: i64, create_by: i64) -> ActiveModel {
    ActiveModel {
        team_id: Set(team_id),
        portal_id: Set(portal_id),
        create_by: Set(create_by),
        create_time: Set(Utc::now()),
        ..Default::default()
    }
}
