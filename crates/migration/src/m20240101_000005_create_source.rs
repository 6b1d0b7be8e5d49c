//! Create `source` (stored data-source connections) and `view`.
//!
//! `view.source_id` restricts deletion so a source in use cannot be dropped.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Source::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Source::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(string_len(Source::Name, 255).not_null())
                    .col(ColumnDef::new(Source::Description).string_len(1024).null())
                    .col(text(Source::Config).not_null())
                    .col(string_len(Source::Type, 32).not_null())
                    .col(big_integer(Source::ProjectId).not_null())
                    .col(big_integer(Source::CreateBy).not_null())
                    .col(timestamp_with_time_zone(Source::CreateTime).not_null())
                    .col(ColumnDef::new(Source::UpdateBy).big_integer().null())
                    .col(ColumnDef::new(Source::UpdateTime).timestamp_with_time_zone().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_source_project")
                            .from(Source::Table, Source::ProjectId)
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
                    .table(View::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(View::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(string_len(View::Name, 255).not_null())
                    .col(ColumnDef::new(View::Description).string_len(1024).null())
                    .col(big_integer(View::ProjectId).not_null())
                    .col(big_integer(View::SourceId).not_null())
                    .col(ColumnDef::new(View::Sql).text().null())
                    .col(big_integer(View::CreateBy).not_null())
                    .col(timestamp_with_time_zone(View::CreateTime).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_view_source")
                            .from(View::Table, View::SourceId)
                            .to(Source::Table, Source::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(View::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Source::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Source {
    Table,
    Id,
    Name,
    Description,
    Config,
    Type,
    ProjectId,
    CreateBy,
    CreateTime,
    UpdateBy,
    UpdateTime,
}

#[derive(DeriveIden)]
enum View { Table, Id, Name, Description, ProjectId, SourceId, Sql, CreateBy, CreateTime }

#[derive(DeriveIden)]
enum Project { Table, Id }
