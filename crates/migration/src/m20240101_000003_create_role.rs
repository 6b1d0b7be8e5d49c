//! Create `role`, `rel_role_user` and `rel_role_project`.
//!
//! Permission columns hold levels 0 (hidden) ..= 3 (delete).
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Role::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Role::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(string_len(Role::Name, 128).not_null())
                    .col(ColumnDef::new(Role::Description).string_len(512).null())
                    .col(timestamp_with_time_zone(Role::CreatedAt).not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(RelRoleUser::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RelRoleUser::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(big_integer(RelRoleUser::RoleId).not_null())
                    .col(big_integer(RelRoleUser::UserId).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_rel_role_user_role")
                            .from(RelRoleUser::Table, RelRoleUser::RoleId)
                            .to(Role::Table, Role::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_rel_role_user_user")
                            .from(RelRoleUser::Table, RelRoleUser::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(RelRoleProject::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RelRoleProject::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(big_integer(RelRoleProject::RoleId).not_null())
                    .col(big_integer(RelRoleProject::ProjectId).not_null())
                    .col(small_integer(RelRoleProject::SourcePermission).not_null().default(0))
                    .col(small_integer(RelRoleProject::ViewPermission).not_null().default(0))
                    .col(small_integer(RelRoleProject::WidgetPermission).not_null().default(0))
                    .col(small_integer(RelRoleProject::VizPermission).not_null().default(1))
                    .col(small_integer(RelRoleProject::SchedulePermission).not_null().default(0))
                    .col(boolean(RelRoleProject::SharePermission).not_null().default(false))
                    .col(boolean(RelRoleProject::DownloadPermission).not_null().default(false))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_rel_role_project_role")
                            .from(RelRoleProject::Table, RelRoleProject::RoleId)
                            .to(Role::Table, Role::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_rel_role_project_project")
                            .from(RelRoleProject::Table, RelRoleProject::ProjectId)
                            .to(Project::Table, Project::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(RelRoleProject::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(RelRoleUser::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Role::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Role { Table, Id, Name, Description, CreatedAt }

#[derive(DeriveIden)]
enum RelRoleUser { Table, Id, RoleId, UserId }

#[derive(DeriveIden)]
enum RelRoleProject {
    Table,
    Id,
    RoleId,
    ProjectId,
    SourcePermission,
    ViewPermission,
    WidgetPermission,
    VizPermission,
    SchedulePermission,
    SharePermission,
    DownloadPermission,
}

#[derive(DeriveIden)]
enum User { Table, Id }

#[derive(DeriveIden)]
enum Project { Table, Id }
