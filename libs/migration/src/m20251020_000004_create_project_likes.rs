use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // A row here is the source of truth for "user likes project"
        manager
            .create_table(
                Table::create()
                    .table(ProjectLikes::Table)
                    .if_not_exists()
                    .col(integer(ProjectLikes::UserId))
                    .col(integer(ProjectLikes::ProjectId))
                    .col(
                        timestamp_with_time_zone(ProjectLikes::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .primary_key(
                        Index::create()
                            .col(ProjectLikes::UserId)
                            .col(ProjectLikes::ProjectId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_project_likes_user")
                            .from(ProjectLikes::Table, ProjectLikes::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_project_likes_project")
                            .from(ProjectLikes::Table, ProjectLikes::ProjectId)
                            .to(Projects::Table, Projects::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_project_likes_project_id")
                    .table(ProjectLikes::Table)
                    .col(ProjectLikes::ProjectId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ProjectLikes::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ProjectLikes {
    Table,
    UserId,
    ProjectId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Projects {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}
