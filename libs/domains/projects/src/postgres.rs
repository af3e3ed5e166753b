use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::{Expr, ExprTrait, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Set,
    TransactionTrait,
};
use std::collections::{HashMap, HashSet};

use crate::entity::{
    project_contributors, project_likes, project_tags, project_technologies, projects, tags,
    technologies, users, ProjectContributorsEntity, ProjectLikesEntity, ProjectTagsEntity,
    ProjectTechnologiesEntity, ProjectsEntity, TagsEntity, TechnologiesEntity, UsersEntity,
};
use crate::error::{ProjectError, ProjectResult};
use crate::models::{
    CreateProject, Project, Tag, Technology, UserSummary, PUBLIC_VISIBILITY,
};
use crate::repository::ProjectRepository;

/// PostgreSQL implementation of ProjectRepository
///
/// Listings are ordered by ascending id. Like, unlike and toggle each run in
/// a single transaction; any failure before commit rolls the whole step back.
#[derive(Clone)]
pub struct PgProjectRepository {
    db: DatabaseConnection,
}

impl PgProjectRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn page(
        &self,
        query: Select<ProjectsEntity>,
        limit: u64,
        offset: u64,
    ) -> ProjectResult<Vec<projects::Model>> {
        let rows = query
            .order_by_asc(projects::Column::Id)
            .limit(limit)
            .offset(offset)
            .all(&self.db)
            .await?;
        Ok(rows)
    }
}

#[async_trait]
impl ProjectRepository for PgProjectRepository {
    async fn list_public_projects(&self, limit: u64, offset: u64) -> ProjectResult<Vec<Project>> {
        let query =
            ProjectsEntity::find().filter(projects::Column::Visibility.eq(PUBLIC_VISIBILITY));
        let rows = self.page(query, limit, offset).await?;
        load_relations(&self.db, rows).await
    }

    async fn list_visible_projects_for_user(
        &self,
        user_id: i32,
        limit: u64,
        offset: u64,
    ) -> ProjectResult<Vec<Project>> {
        let query = ProjectsEntity::find().filter(
            Condition::any()
                .add(projects::Column::CreatedBy.eq(user_id))
                .add(projects::Column::Visibility.eq(PUBLIC_VISIBILITY)),
        );
        let rows = self.page(query, limit, offset).await?;
        load_relations(&self.db, rows).await
    }

    async fn list_essential_projects(
        &self,
        limit: u64,
        offset: u64,
    ) -> ProjectResult<Vec<Project>> {
        let rows = self.page(ProjectsEntity::find(), limit, offset).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn get_by_id(&self, id: i32) -> ProjectResult<Project> {
        let row = require_project(&self.db, id).await?;
        let mut loaded = load_relations(&self.db, vec![row]).await?;
        loaded.pop().ok_or(ProjectError::project_not_found(id))
    }

    async fn count(&self) -> ProjectResult<u64> {
        Ok(ProjectsEntity::find().count(&self.db).await?)
    }

    async fn is_liked(&self, user_id: i32, project_id: i32) -> ProjectResult<bool> {
        let like = ProjectLikesEntity::find_by_id((user_id, project_id))
            .one(&self.db)
            .await?;
        Ok(like.is_some())
    }

    #[tracing::instrument(skip(self, input), fields(title = %input.title, created_by = input.created_by))]
    async fn create(&self, input: CreateProject) -> ProjectResult<Project> {
        let txn = self.db.begin().await?;

        require_user(&txn, input.created_by).await?;
        let row = projects::ActiveModel::from(&input).insert(&txn).await?;

        for name in input.unique_tags() {
            let tag = upsert_tag(&txn, &name).await?;
            project_tags::ActiveModel {
                project_id: Set(row.id),
                tag_id: Set(tag.id),
            }
            .insert(&txn)
            .await?;
        }

        for name in input.unique_technologies() {
            let technology = upsert_technology(&txn, &name).await?;
            project_technologies::ActiveModel {
                project_id: Set(row.id),
                technology_id: Set(technology.id),
            }
            .insert(&txn)
            .await?;
        }

        for user_id in input.unique_contributor_ids() {
            require_user(&txn, user_id).await?;
            project_contributors::ActiveModel {
                project_id: Set(row.id),
                user_id: Set(user_id),
            }
            .insert(&txn)
            .await?;
        }

        let project_id = row.id;
        let mut loaded = load_relations(&txn, vec![row]).await?;
        txn.commit().await?;

        tracing::info!(project_id, "Created project");
        loaded.pop().ok_or(ProjectError::project_not_found(project_id))
    }

    #[tracing::instrument(skip(self))]
    async fn like_project(&self, user_id: i32, project_id: i32) -> ProjectResult<bool> {
        let txn = self.db.begin().await?;
        require_user(&txn, user_id).await?;
        require_project(&txn, project_id).await?;

        let changed = insert_like(&txn, user_id, project_id).await?;
        if changed {
            adjust_likes(&txn, project_id, 1).await?;
        }
        txn.commit().await?;

        if changed {
            tracing::info!(user_id, project_id, "Liked project");
        } else {
            tracing::debug!(user_id, project_id, "Project already liked");
        }
        Ok(changed)
    }

    #[tracing::instrument(skip(self))]
    async fn unlike_project(&self, user_id: i32, project_id: i32) -> ProjectResult<bool> {
        let txn = self.db.begin().await?;
        require_user(&txn, user_id).await?;
        require_project(&txn, project_id).await?;

        let changed = delete_like(&txn, user_id, project_id).await?;
        if changed {
            adjust_likes(&txn, project_id, -1).await?;
        }
        txn.commit().await?;

        if changed {
            tracing::info!(user_id, project_id, "Unliked project");
        } else {
            tracing::debug!(user_id, project_id, "Project was not liked");
        }
        Ok(changed)
    }

    #[tracing::instrument(skip(self))]
    async fn toggle_like(&self, user_id: i32, project_id: i32) -> ProjectResult<bool> {
        let txn = self.db.begin().await?;
        require_user(&txn, user_id).await?;
        require_project(&txn, project_id).await?;

        // Try to remove first; if there was nothing to remove, add instead
        let liked = if delete_like(&txn, user_id, project_id).await? {
            adjust_likes(&txn, project_id, -1).await?;
            false
        } else {
            if insert_like(&txn, user_id, project_id).await? {
                adjust_likes(&txn, project_id, 1).await?;
            }
            true
        };
        txn.commit().await?;

        tracing::info!(user_id, project_id, liked, "Toggled project like");
        Ok(liked)
    }

    async fn find_or_create_tag(&self, name: &str) -> ProjectResult<Tag> {
        let txn = self.db.begin().await?;
        let tag = upsert_tag(&txn, name).await?;
        txn.commit().await?;
        Ok(tag.into())
    }

    async fn find_or_create_technology(&self, name: &str) -> ProjectResult<Technology> {
        let txn = self.db.begin().await?;
        let technology = upsert_technology(&txn, name).await?;
        txn.commit().await?;
        Ok(technology.into())
    }
}

async fn require_user<C: ConnectionTrait>(db: &C, id: i32) -> ProjectResult<users::Model> {
    UsersEntity::find_by_id(id)
        .one(db)
        .await?
        .ok_or(ProjectError::user_not_found(id))
}

async fn require_project<C: ConnectionTrait>(db: &C, id: i32) -> ProjectResult<projects::Model> {
    ProjectsEntity::find_by_id(id)
        .one(db)
        .await?
        .ok_or(ProjectError::project_not_found(id))
}

/// Returns whether a like row was inserted
async fn insert_like<C: ConnectionTrait>(db: &C, user_id: i32, project_id: i32) -> ProjectResult<bool> {
    let like = project_likes::ActiveModel {
        user_id: Set(user_id),
        project_id: Set(project_id),
        created_at: Set(Utc::now().into()),
    };

    let inserted = ProjectLikesEntity::insert(like)
        .on_conflict(
            OnConflict::columns([project_likes::Column::UserId, project_likes::Column::ProjectId])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;

    Ok(inserted > 0)
}

/// Returns whether a like row was deleted
async fn delete_like<C: ConnectionTrait>(db: &C, user_id: i32, project_id: i32) -> ProjectResult<bool> {
    let result = ProjectLikesEntity::delete_by_id((user_id, project_id))
        .exec(db)
        .await?;
    Ok(result.rows_affected > 0)
}

/// `likes = likes + delta`, evaluated by the database
async fn adjust_likes<C: ConnectionTrait>(db: &C, project_id: i32, delta: i32) -> ProjectResult<()> {
    ProjectsEntity::update_many()
        .col_expr(
            projects::Column::Likes,
            Expr::col(projects::Column::Likes).add(delta),
        )
        .filter(projects::Column::Id.eq(project_id))
        .exec(db)
        .await?;
    Ok(())
}

/// Insert-if-absent on the unique name, then read the row back
async fn upsert_tag<C: ConnectionTrait>(db: &C, name: &str) -> ProjectResult<tags::Model> {
    TagsEntity::insert(tags::ActiveModel {
        name: Set(name.to_owned()),
        ..Default::default()
    })
    .on_conflict(OnConflict::column(tags::Column::Name).do_nothing().to_owned())
    .exec_without_returning(db)
    .await?;

    TagsEntity::find()
        .filter(tags::Column::Name.eq(name))
        .one(db)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("tag '{name}'")).into())
}

async fn upsert_technology<C: ConnectionTrait>(
    db: &C,
    name: &str,
) -> ProjectResult<technologies::Model> {
    TechnologiesEntity::insert(technologies::ActiveModel {
        name: Set(name.to_owned()),
        ..Default::default()
    })
    .on_conflict(
        OnConflict::column(technologies::Column::Name)
            .do_nothing()
            .to_owned(),
    )
    .exec_without_returning(db)
    .await?;

    TechnologiesEntity::find()
        .filter(technologies::Column::Name.eq(name))
        .one(db)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("technology '{name}'")).into())
}

/// Attach creator, contributors, tags and technologies to `rows`, keeping
/// their order. One query per relation regardless of page size.
async fn load_relations<C: ConnectionTrait>(
    db: &C,
    rows: Vec<projects::Model>,
) -> ProjectResult<Vec<Project>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let project_ids: Vec<i32> = rows.iter().map(|r| r.id).collect();

    let contributor_links = ProjectContributorsEntity::find()
        .filter(project_contributors::Column::ProjectId.is_in(project_ids.clone()))
        .order_by_asc(project_contributors::Column::UserId)
        .all(db)
        .await?;
    let tag_links = ProjectTagsEntity::find()
        .filter(project_tags::Column::ProjectId.is_in(project_ids.clone()))
        .order_by_asc(project_tags::Column::TagId)
        .all(db)
        .await?;
    let technology_links = ProjectTechnologiesEntity::find()
        .filter(project_technologies::Column::ProjectId.is_in(project_ids))
        .order_by_asc(project_technologies::Column::TechnologyId)
        .all(db)
        .await?;

    let user_ids: HashSet<i32> = rows
        .iter()
        .map(|r| r.created_by)
        .chain(contributor_links.iter().map(|l| l.user_id))
        .collect();
    let users: HashMap<i32, UserSummary> = UsersEntity::find()
        .filter(users::Column::Id.is_in(user_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|m| (m.id, m.into()))
        .collect();

    let tag_ids: HashSet<i32> = tag_links.iter().map(|l| l.tag_id).collect();
    let tags: HashMap<i32, Tag> = if tag_ids.is_empty() {
        HashMap::new()
    } else {
        TagsEntity::find()
            .filter(tags::Column::Id.is_in(tag_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|m| (m.id, m.into()))
            .collect()
    };

    let technology_ids: HashSet<i32> = technology_links.iter().map(|l| l.technology_id).collect();
    let technologies: HashMap<i32, Technology> = if technology_ids.is_empty() {
        HashMap::new()
    } else {
        TechnologiesEntity::find()
            .filter(technologies::Column::Id.is_in(technology_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|m| (m.id, m.into()))
            .collect()
    };

    let mut contributors_by_project: HashMap<i32, Vec<UserSummary>> = HashMap::new();
    for link in &contributor_links {
        if let Some(user) = users.get(&link.user_id) {
            contributors_by_project
                .entry(link.project_id)
                .or_default()
                .push(user.clone());
        }
    }

    let mut tags_by_project: HashMap<i32, Vec<Tag>> = HashMap::new();
    for link in &tag_links {
        if let Some(tag) = tags.get(&link.tag_id) {
            tags_by_project
                .entry(link.project_id)
                .or_default()
                .push(tag.clone());
        }
    }

    let mut technologies_by_project: HashMap<i32, Vec<Technology>> = HashMap::new();
    for link in &technology_links {
        if let Some(technology) = technologies.get(&link.technology_id) {
            technologies_by_project
                .entry(link.project_id)
                .or_default()
                .push(technology.clone());
        }
    }

    let projects = rows
        .into_iter()
        .map(|row| {
            let creator = users.get(&row.created_by).cloned();
            let mut project: Project = row.into();
            project.creator = creator;
            project.contributors = contributors_by_project.remove(&project.id).unwrap_or_default();
            project.tags = tags_by_project.remove(&project.id).unwrap_or_default();
            project.technologies = technologies_by_project
                .remove(&project.id)
                .unwrap_or_default();
            project
        })
        .collect();

    Ok(projects)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProjectStatus;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn project_row(id: i32, created_by: i32) -> projects::Model {
        let now = Utc::now().into();
        projects::Model {
            id,
            title: format!("project-{id}"),
            description: String::new(),
            github_link: String::new(),
            image: String::new(),
            live_url: String::new(),
            status: ProjectStatus::InProgress,
            likes: 5,
            views: 12,
            version: "1.0.0".to_string(),
            cost: 0.0,
            category: "iot".to_string(),
            visibility: PUBLIC_VISIBILITY,
            created_by,
            created_at: now,
            updated_at: now,
        }
    }

    fn user_row(id: i32, username: &str) -> users::Model {
        let now = Utc::now().into();
        users::Model {
            id,
            name: username.to_uppercase(),
            username: username.to_string(),
            email: format!("{username}@example.com"),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_list_public_projects_empty_page() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<projects::Model>::new()])
            .into_connection();
        let repo = PgProjectRepository::new(db);

        let projects = repo.list_public_projects(10, 0).await.unwrap();
        assert!(projects.is_empty());
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<projects::Model>::new()])
            .into_connection();
        let repo = PgProjectRepository::new(db);

        let err = repo.get_by_id(404).await.unwrap_err();
        assert!(matches!(
            err,
            ProjectError::NotFound { resource: crate::error::Resource::Project, id: 404 }
        ));
    }

    #[tokio::test]
    async fn test_get_by_id_attaches_relations() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![project_row(1, 7)]])
            .append_query_results([vec![project_contributors::Model {
                project_id: 1,
                user_id: 8,
            }]])
            .append_query_results([vec![project_tags::Model {
                project_id: 1,
                tag_id: 3,
            }]])
            .append_query_results([Vec::<project_technologies::Model>::new()])
            .append_query_results([vec![user_row(7, "ada"), user_row(8, "bob")]])
            .append_query_results([vec![tags::Model {
                id: 3,
                name: "robotics".to_string(),
            }]])
            .into_connection();
        let repo = PgProjectRepository::new(db);

        let project = repo.get_by_id(1).await.unwrap();
        assert_eq!(project.creator.map(|c| c.username), Some("ada".to_string()));
        assert_eq!(project.contributors.len(), 1);
        assert_eq!(project.contributors[0].username, "bob");
        assert_eq!(project.tags[0].name, "robotics");
        assert!(project.technologies.is_empty());
        assert_eq!(project.likes, 5);
    }

    #[tokio::test]
    async fn test_like_unknown_user_stops_before_mutating() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<users::Model>::new()])
            .into_connection();
        let repo = PgProjectRepository::new(db);

        let err = repo.like_project(3, 1).await.unwrap_err();
        assert!(matches!(
            err,
            ProjectError::NotFound { resource: crate::error::Resource::User, id: 3 }
        ));
    }

    #[tokio::test]
    async fn test_unlike_unknown_project_stops_before_mutating() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![user_row(3, "ada")]])
            .append_query_results([Vec::<projects::Model>::new()])
            .into_connection();
        let repo = PgProjectRepository::new(db);

        let err = repo.unlike_project(3, 99).await.unwrap_err();
        assert!(matches!(
            err,
            ProjectError::NotFound { resource: crate::error::Resource::Project, id: 99 }
        ));
    }

    #[tokio::test]
    async fn test_is_liked_reads_join_row() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![project_likes::Model {
                user_id: 3,
                project_id: 1,
                created_at: Utc::now().into(),
            }]])
            .append_query_results([Vec::<project_likes::Model>::new()])
            .into_connection();
        let repo = PgProjectRepository::new(db);

        assert!(repo.is_liked(3, 1).await.unwrap());
        assert!(!repo.is_liked(3, 2).await.unwrap());
    }
}
