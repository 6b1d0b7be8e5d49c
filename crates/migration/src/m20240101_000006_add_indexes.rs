use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Portal names are unique inside a project
        manager
            .create_index(
                Index::create()
                    .name("uniq_portal_project_name")
                    .table(DashboardPortal::Table)
                    .col(DashboardPortal::ProjectId)
                    .col(DashboardPortal::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Source names are unique inside a project
        manager
            .create_index(
                Index::create()
                    .name("uniq_source_project_name")
                    .table(Source::Table)
                    .col(Source::ProjectId)
                    .col(Source::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uniq_exclude_portal_team")
                    .table(ExcludePortalTeam::Table)
                    .col(ExcludePortalTeam::PortalId)
                    .col(ExcludePortalTeam::TeamId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uniq_rel_user_project")
                    .table(RelUserProject::Table)
                    .col(RelUserProject::ProjectId)
                    .col(RelUserProject::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_rel_role_user_user")
                    .table(RelRoleUser::Table)
                    .col(RelRoleUser::UserId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("uniq_portal_project_name").table(DashboardPortal::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("uniq_source_project_name").table(Source::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("uniq_exclude_portal_team").table(ExcludePortalTeam::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("uniq_rel_user_project").table(RelUserProject::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_rel_role_user_user").table(RelRoleUser::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum DashboardPortal { Table, ProjectId, Name }

#[derive(DeriveIden)]
enum Source { Table, ProjectId, Name }

#[derive(DeriveIden)]
enum ExcludePortalTeam { Table, PortalId, TeamId }

#[derive(DeriveIden)]
enum RelUserProject { Table, ProjectId, UserId }

#[derive(DeriveIden)]
enum RelRoleUser { Table, UserId }
