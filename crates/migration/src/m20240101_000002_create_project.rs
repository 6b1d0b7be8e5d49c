//! Create `project` and `rel_user_project`.
//!
//! A project is owned by one user; other users join as member (0) or maintainer (1).
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Project::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Project::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(string_len(Project::Name, 255).not_null())
                    .col(ColumnDef::new(Project::Description).string_len(1024).null())
                    .col(big_integer(Project::UserId).not_null())
                    .col(boolean(Project::Visibility).not_null().default(false))
                    .col(timestamp_with_time_zone(Project::CreatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_project_user")
                            .from(Project::Table, Project::UserId)
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
                    .table(RelUserProject::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RelUserProject::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(big_integer(RelUserProject::ProjectId).not_null())
                    .col(big_integer(RelUserProject::UserId).not_null())
                    .col(small_integer(RelUserProject::RoleType).not_null().default(0))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_rel_user_project_project")
                            .from(RelUserProject::Table, RelUserProject::ProjectId)
                            .to(Project::Table, Project::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_rel_user_project_user")
                            .from(RelUserProject::Table, RelUserProject::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(RelUserProject::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Project::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Project { Table, Id, Name, Description, UserId, Visibility, CreatedAt }

#[derive(DeriveIden)]
enum RelUserProject { Table, Id, ProjectId, UserId, RoleType }

#[derive(DeriveIden)]
enum User { Table, Id }
