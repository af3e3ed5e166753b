use sea_orm_migration::sea_query::extension::postgres::Type;
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_type(
                Type::create()
                    .as_enum(ProjectStatus::Enum)
                    .values(ProjectStatus::values())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Projects::Table)
                    .if_not_exists()
                    .col(pk_auto(Projects::Id))
                    .col(string(Projects::Title))
                    .col(text(Projects::Description).default(""))
                    .col(string(Projects::GithubLink).default(""))
                    .col(string(Projects::Image).default(""))
                    .col(string(Projects::LiveUrl).default(""))
                    .col(
                        ColumnDef::new(Projects::Status)
                            .enumeration(ProjectStatus::Enum, ProjectStatus::values())
                            .not_null()
                            .default("draft"),
                    )
                    // Denormalized count of project_likes rows, maintained by like/unlike
                    .col(integer(Projects::Likes).default(0))
                    .col(integer(Projects::Views).default(0))
                    .col(string(Projects::Version).default(""))
                    .col(double(Projects::Cost).default(0.0))
                    .col(string(Projects::Category).default(""))
                    // 0 = public, anything else is restricted
                    .col(integer(Projects::Visibility).default(0))
                    .col(integer(Projects::CreatedBy))
                    .col(
                        timestamp_with_time_zone(Projects::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(Projects::UpdatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_projects_created_by")
                            .from(Projects::Table, Projects::CreatedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_projects_visibility")
                    .table(Projects::Table)
                    .col(Projects::Visibility)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_projects_created_by")
                    .table(Projects::Table)
                    .col(Projects::CreatedBy)
                    .to_owned(),
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared(
                r#"
                CREATE TRIGGER projects_touch_updated_at
                    BEFORE UPDATE ON projects
                    FOR EACH ROW
                    EXECUTE FUNCTION util.touch_updated_at()
                "#,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("DROP TRIGGER IF EXISTS projects_touch_updated_at ON projects")
            .await?;

        manager
            .drop_table(Table::drop().table(Projects::Table).to_owned())
            .await?;

        manager
            .drop_type(Type::drop().name(ProjectStatus::Enum).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Projects {
    Table,
    Id,
    Title,
    Description,
    GithubLink,
    Image,
    LiveUrl,
    Status,
    Likes,
    Views,
    Version,
    Cost,
    Category,
    Visibility,
    CreatedBy,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}

#[derive(DeriveIden, Clone, Copy)]
enum ProjectStatus {
    #[sea_orm(iden = "project_status")]
    Enum,
    #[sea_orm(iden = "draft")]
    Draft,
    #[sea_orm(iden = "in_progress")]
    InProgress,
    #[sea_orm(iden = "completed")]
    Completed,
    #[sea_orm(iden = "archived")]
    Archived,
}

impl ProjectStatus {
    fn values() -> [Self; 4] {
        [Self::Draft, Self::InProgress, Self::Completed, Self::Archived]
    }
}
