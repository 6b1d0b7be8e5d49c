//! Create `dashboard_portal` with its child tables:
//! `dashboard`, `rel_role_portal` (role visibility) and `exclude_portal_team`.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(DashboardPortal::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DashboardPortal::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(string_len(DashboardPortal::Name, 255).not_null())
                    .col(ColumnDef::new(DashboardPortal::Description).string_len(1024).null())
                    .col(big_integer(DashboardPortal::ProjectId).not_null())
                    .col(ColumnDef::new(DashboardPortal::Avatar).string_len(255).null())
                    .col(boolean(DashboardPortal::Publish).not_null().default(false))
                    .col(big_integer(DashboardPortal::CreateBy).not_null())
                    .col(timestamp_with_time_zone(DashboardPortal::CreateTime).not_null())
                    .col(ColumnDef::new(DashboardPortal::UpdateBy).big_integer().null())
                    .col(ColumnDef::new(DashboardPortal::UpdateTime).timestamp_with_time_zone().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_dashboard_portal_project")
                            .from(DashboardPortal::Table, DashboardPortal::ProjectId)
                            .to(Project::Table, Project::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Dashboard::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Dashboard::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(string_len(Dashboard::Name, 255).not_null())
                    .col(big_integer(Dashboard::DashboardPortalId).not_null())
                    .col(small_integer(Dashboard::Type).not_null().default(1))
                    .col(integer(Dashboard::Index).not_null().default(0))
                    .col(big_integer(Dashboard::ParentId).not_null().default(0))
                    .col(ColumnDef::new(Dashboard::Config).text().null())
                    .col(big_integer(Dashboard::CreateBy).not_null())
                    .col(timestamp_with_time_zone(Dashboard::CreateTime).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_dashboard_portal")
                            .from(Dashboard::Table, Dashboard::DashboardPortalId)
                            .to(DashboardPortal::Table, DashboardPortal::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(RelRolePortal::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RelRolePortal::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(big_integer(RelRolePortal::RoleId).not_null())
                    .col(big_integer(RelRolePortal::PortalId).not_null())
                    .col(boolean(RelRolePortal::Visible).not_null().default(false))
                    .col(big_integer(RelRolePortal::CreateBy).not_null())
                    .col(timestamp_with_time_zone(RelRolePortal::CreateTime).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_rel_role_portal_role")
                            .from(RelRolePortal::Table, RelRolePortal::RoleId)
                            .to(Role::Table, Role::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_rel_role_portal_portal")
                            .from(RelRolePortal::Table, RelRolePortal::PortalId)
                            .to(DashboardPortal::Table, DashboardPortal::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // team ids are owned by an external directory, no FK
        manager
            .create_table(
                Table::create()
                    .table(ExcludePortalTeam::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ExcludePortalTeam::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(big_integer(ExcludePortalTeam::TeamId).not_null())
                    .col(big_integer(ExcludePortalTeam::PortalId).not_null())
                    .col(big_integer(ExcludePortalTeam::CreateBy).not_null())
                    .col(timestamp_with_time_zone(ExcludePortalTeam::CreateTime).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_exclude_portal_team_portal")
                            .from(ExcludePortalTeam::Table, ExcludePortalTeam::PortalId)
                            .to(DashboardPortal::Table, DashboardPortal::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(ExcludePortalTeam::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(RelRolePortal::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Dashboard::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(DashboardPortal::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum DashboardPortal {
    Table,
    Id,
    Name,
    Description,
    ProjectId,
    Avatar,
    Publish,
    CreateBy,
    CreateTime,
    UpdateBy,
    UpdateTime,
}

#[derive(DeriveIden)]
enum Dashboard {
    Table,
    Id,
    Name,
    DashboardPortalId,
    Type,
    Index,
    ParentId,
    Config,
    CreateBy,
    CreateTime,
}

#[derive(DeriveIden)]
enum RelRolePortal { Table, Id, RoleId, PortalId, Visible, CreateBy, CreateTime }

#[derive(DeriveIden)]
enum ExcludePortalTeam { Table, Id, TeamId, PortalId, CreateBy, CreateTime }

#[derive(DeriveIden)]
enum Project { Table, Id }

#[derive(DeriveIden)]
enum Role { Table, Id }
