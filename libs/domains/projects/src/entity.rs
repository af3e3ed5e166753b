use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

// ===== Users =====

pub mod users {
    use super::*;

    /// Read-only view of the users table; accounts are managed elsewhere.
    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
    #[sea_orm(table_name = "users")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i32,
        pub name: String,
        #[sea_orm(unique)]
        pub username: String,
        #[sea_orm(unique)]
        pub email: String,
        pub created_at: DateTimeWithTimeZone,
        pub updated_at: DateTimeWithTimeZone,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(has_many = "super::project_likes::Entity")]
        Likes,
    }

    impl Related<super::project_likes::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Likes.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}

    impl From<Model> for crate::models::UserSummary {
        fn from(model: Model) -> Self {
            Self {
                id: model.id,
                name: model.name,
                username: model.username,
                email: model.email,
            }
        }
    }
}

// ===== Projects =====

pub mod projects {
    use super::*;
    use crate::models::ProjectStatus;
    use sea_orm::ActiveValue::Set;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
    #[sea_orm(table_name = "projects")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i32,
        pub title: String,
        #[sea_orm(column_type = "Text")]
        pub description: String,
        pub github_link: String,
        pub image: String,
        pub live_url: String,
        pub status: ProjectStatus,
        pub likes: i32,
        pub views: i32,
        pub version: String,
        #[sea_orm(column_type = "Double")]
        pub cost: f64,
        pub category: String,
        pub visibility: i32,
        pub created_by: i32,
        pub created_at: DateTimeWithTimeZone,
        pub updated_at: DateTimeWithTimeZone,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::users::Entity",
            from = "Column::CreatedBy",
            to = "super::users::Column::Id"
        )]
        Creator,
        #[sea_orm(has_many = "super::project_likes::Entity")]
        Likes,
    }

    impl Related<super::users::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Creator.def()
        }
    }

    impl Related<super::project_likes::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Likes.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}

    /// Row only; related entities are attached by the repository
    impl From<Model> for crate::models::Project {
        fn from(model: Model) -> Self {
            Self {
                id: model.id,
                title: model.title,
                description: model.description,
                github_link: model.github_link,
                image: model.image,
                live_url: model.live_url,
                status: model.status,
                likes: model.likes,
                views: model.views,
                version: model.version,
                cost: model.cost,
                category: model.category,
                visibility: model.visibility,
                created_by: model.created_by,
                created_at: model.created_at.into(),
                updated_at: model.updated_at.into(),
                creator: None,
                contributors: Vec::new(),
                tags: Vec::new(),
                technologies: Vec::new(),
            }
        }
    }

    impl From<&crate::models::CreateProject> for ActiveModel {
        fn from(input: &crate::models::CreateProject) -> Self {
            let now = chrono::Utc::now();
            ActiveModel {
                title: Set(input.title.clone()),
                description: Set(input.description.clone()),
                github_link: Set(input.github_link.clone().unwrap_or_default()),
                image: Set(input.image.clone().unwrap_or_default()),
                live_url: Set(input.live_url.clone().unwrap_or_default()),
                status: Set(input.status),
                likes: Set(0),
                views: Set(0),
                version: Set(input.version.clone()),
                cost: Set(input.cost),
                category: Set(input.category.clone()),
                visibility: Set(input.visibility),
                created_by: Set(input.created_by),
                created_at: Set(now.into()),
                updated_at: Set(now.into()),
                ..Default::default()
            }
        }
    }
}

// ===== Tags =====

pub mod tags {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
    #[sea_orm(table_name = "tags")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i32,
        #[sea_orm(unique)]
        pub name: String,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}

    impl From<Model> for crate::models::Tag {
        fn from(model: Model) -> Self {
            Self {
                id: model.id,
                name: model.name,
            }
        }
    }
}

// ===== Technologies =====

pub mod technologies {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
    #[sea_orm(table_name = "technologies")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i32,
        #[sea_orm(unique)]
        pub name: String,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}

    impl From<Model> for crate::models::Technology {
        fn from(model: Model) -> Self {
            Self {
                id: model.id,
                name: model.name,
            }
        }
    }
}

// ===== Join tables =====

pub mod project_tags {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
    #[sea_orm(table_name = "project_tags")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub project_id: i32,
        #[sea_orm(primary_key, auto_increment = false)]
        pub tag_id: i32,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::projects::Entity",
            from = "Column::ProjectId",
            to = "super::projects::Column::Id",
            on_delete = "Cascade"
        )]
        Project,
        #[sea_orm(
            belongs_to = "super::tags::Entity",
            from = "Column::TagId",
            to = "super::tags::Column::Id",
            on_delete = "Cascade"
        )]
        Tag,
    }

    impl ActiveModelBehavior for ActiveModel {}
}

pub mod project_technologies {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
    #[sea_orm(table_name = "project_technologies")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub project_id: i32,
        #[sea_orm(primary_key, auto_increment = false)]
        pub technology_id: i32,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::projects::Entity",
            from = "Column::ProjectId",
            to = "super::projects::Column::Id",
            on_delete = "Cascade"
        )]
        Project,
        #[sea_orm(
            belongs_to = "super::technologies::Entity",
            from = "Column::TechnologyId",
            to = "super::technologies::Column::Id",
            on_delete = "Cascade"
        )]
        Technology,
    }

    impl ActiveModelBehavior for ActiveModel {}
}

pub mod project_contributors {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
    #[sea_orm(table_name = "project_contributors")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub project_id: i32,
        #[sea_orm(primary_key, auto_increment = false)]
        pub user_id: i32,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::projects::Entity",
            from = "Column::ProjectId",
            to = "super::projects::Column::Id",
            on_delete = "Cascade"
        )]
        Project,
        #[sea_orm(
            belongs_to = "super::users::Entity",
            from = "Column::UserId",
            to = "super::users::Column::Id",
            on_delete = "Cascade"
        )]
        User,
    }

    impl ActiveModelBehavior for ActiveModel {}
}

pub mod project_likes {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
    #[sea_orm(table_name = "project_likes")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub user_id: i32,
        #[sea_orm(primary_key, auto_increment = false)]
        pub project_id: i32,
        pub created_at: DateTimeWithTimeZone,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::users::Entity",
            from = "Column::UserId",
            to = "super::users::Column::Id",
            on_delete = "Cascade"
        )]
        User,
        #[sea_orm(
            belongs_to = "super::projects::Entity",
            from = "Column::ProjectId",
            to = "super::projects::Column::Id",
            on_delete = "Cascade"
        )]
        Project,
    }

    impl Related<super::users::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::User.def()
        }
    }

    impl Related<super::projects::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Project.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

pub use project_contributors::Entity as ProjectContributorsEntity;
pub use project_likes::Entity as ProjectLikesEntity;
pub use project_tags::Entity as ProjectTagsEntity;
pub use project_technologies::Entity as ProjectTechnologiesEntity;
pub use projects::Entity as ProjectsEntity;
pub use tags::Entity as TagsEntity;
pub use technologies::Entity as TechnologiesEntity;
pub use users::Entity as UsersEntity;
