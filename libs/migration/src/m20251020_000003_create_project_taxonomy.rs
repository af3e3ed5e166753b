use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Unique names back the find-or-create upsert
        manager
            .create_table(
                Table::create()
                    .table(Tags::Table)
                    .if_not_exists()
                    .col(pk_auto(Tags::Id))
                    .col(string_uniq(Tags::Name))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Technologies::Table)
                    .if_not_exists()
                    .col(pk_auto(Technologies::Id))
                    .col(string_uniq(Technologies::Name))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ProjectTags::Table)
                    .if_not_exists()
                    .col(integer(ProjectTags::ProjectId))
                    .col(integer(ProjectTags::TagId))
                    .primary_key(
                        Index::create()
                            .col(ProjectTags::ProjectId)
                            .col(ProjectTags::TagId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_project_tags_project")
                            .from(ProjectTags::Table, ProjectTags::ProjectId)
                            .to(Projects::Table, Projects::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_project_tags_tag")
                            .from(ProjectTags::Table, ProjectTags::TagId)
                            .to(Tags::Table, Tags::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ProjectTechnologies::Table)
                    .if_not_exists()
                    .col(integer(ProjectTechnologies::ProjectId))
                    .col(integer(ProjectTechnologies::TechnologyId))
                    .primary_key(
                        Index::create()
                            .col(ProjectTechnologies::ProjectId)
                            .col(ProjectTechnologies::TechnologyId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_project_technologies_project")
                            .from(ProjectTechnologies::Table, ProjectTechnologies::ProjectId)
                            .to(Projects::Table, Projects::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_project_technologies_technology")
                            .from(ProjectTechnologies::Table, ProjectTechnologies::TechnologyId)
                            .to(Technologies::Table, Technologies::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ProjectContributors::Table)
                    .if_not_exists()
                    .col(integer(ProjectContributors::ProjectId))
                    .col(integer(ProjectContributors::UserId))
                    .primary_key(
                        Index::create()
                            .col(ProjectContributors::ProjectId)
                            .col(ProjectContributors::UserId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_project_contributors_project")
                            .from(ProjectContributors::Table, ProjectContributors::ProjectId)
                            .to(Projects::Table, Projects::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_project_contributors_user")
                            .from(ProjectContributors::Table, ProjectContributors::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ProjectContributors::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ProjectTechnologies::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ProjectTags::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Technologies::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Tags::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Tags {
    Table,
    Id,
    Name,
}

#[derive(DeriveIden)]
enum Technologies {
    Table,
    Id,
    Name,
}

#[derive(DeriveIden)]
enum ProjectTags {
    Table,
    ProjectId,
    TagId,
}

#[derive(DeriveIden)]
enum ProjectTechnologies {
    Table,
    ProjectId,
    TechnologyId,
}

#[derive(DeriveIden)]
enum ProjectContributors {
    Table,
    ProjectId,
    UserId,
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
