use std::sync::Arc;
use validator::Validate;

use crate::config::ProjectsConfig;
use crate::error::ProjectResult;
use crate::models::{CreateProject, EssentialProjectResponse, ProjectResponse};
use crate::presenter;
use crate::repository::ProjectRepository;

/// Entry point for callers: paging rules, validation and response mapping
/// on top of a ProjectRepository
pub struct ProjectService<R: ProjectRepository> {
    repository: Arc<R>,
    config: ProjectsConfig,
}

// Cloning shares the repository, so `R` itself need not be Clone
impl<R: ProjectRepository> Clone for ProjectService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            config: self.config.clone(),
        }
    }
}

impl<R: ProjectRepository> ProjectService<R> {
    pub fn new(repository: R) -> Self {
        Self::with_config(repository, ProjectsConfig::default())
    }

    pub fn with_config(repository: R, config: ProjectsConfig) -> Self {
        Self {
            repository: Arc::new(repository),
            config,
        }
    }

    /// Public projects as response objects, in store order.
    ///
    /// `user` identifies the caller but does not affect the result.
    #[tracing::instrument(skip(self))]
    pub async fn get_all_projects(
        &self,
        limit: u64,
        offset: u64,
        user: &str,
    ) -> ProjectResult<Vec<ProjectResponse>> {
        let limit = self.config.page_limit(limit);
        let projects = self.repository.list_public_projects(limit, offset).await?;

        tracing::debug!(count = projects.len(), "Loaded public projects");
        Ok(projects.into_iter().map(presenter::project_response).collect())
    }

    /// Public projects plus the user's own
    pub async fn list_projects_for_user(
        &self,
        user_id: i32,
        limit: u64,
        offset: u64,
    ) -> ProjectResult<Vec<ProjectResponse>> {
        let limit = self.config.page_limit(limit);
        let projects = self
            .repository
            .list_visible_projects_for_user(user_id, limit, offset)
            .await?;
        Ok(projects.into_iter().map(presenter::project_response).collect())
    }

    pub async fn list_essential_projects(
        &self,
        limit: u64,
        offset: u64,
    ) -> ProjectResult<Vec<EssentialProjectResponse>> {
        let limit = self.config.page_limit(limit);
        let projects = self.repository.list_essential_projects(limit, offset).await?;
        Ok(projects.into_iter().map(presenter::essential_response).collect())
    }

    pub async fn get_project(&self, id: i32) -> ProjectResult<ProjectResponse> {
        let project = self.repository.get_by_id(id).await?;
        Ok(presenter::project_response(project))
    }

    pub async fn count_projects(&self) -> ProjectResult<u64> {
        self.repository.count().await
    }

    /// Validate, then insert with tags, technologies and contributors
    pub async fn create_project(&self, input: CreateProject) -> ProjectResult<ProjectResponse> {
        input.validate()?;

        let project = self.repository.create(input).await?;
        tracing::info!(project_id = project.id, "Project created");
        Ok(presenter::project_response(project))
    }

    pub async fn is_liked(&self, user_id: i32, project_id: i32) -> ProjectResult<bool> {
        self.repository.is_liked(user_id, project_id).await
    }

    /// Returns whether the like was newly recorded
    pub async fn like_project(&self, user_id: i32, project_id: i32) -> ProjectResult<bool> {
        let changed = self.repository.like_project(user_id, project_id).await?;
        if changed {
            tracing::info!(user_id, project_id, "User liked project");
        }
        Ok(changed)
    }

    /// Returns whether an existing like was removed
    pub async fn unlike_project(&self, user_id: i32, project_id: i32) -> ProjectResult<bool> {
        let changed = self.repository.unlike_project(user_id, project_id).await?;
        if changed {
            tracing::info!(user_id, project_id, "User unliked project");
        }
        Ok(changed)
    }

    /// Returns the new like state
    pub async fn toggle_like(&self, user_id: i32, project_id: i32) -> ProjectResult<bool> {
        let liked = self.repository.toggle_like(user_id, project_id).await?;
        tracing::info!(user_id, project_id, liked, "User toggled project like");
        Ok(liked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProjectError;
    use crate::models::{Project, ProjectStatus, UserSummary, PUBLIC_VISIBILITY};
    use crate::repository::MockProjectRepository;
    use chrono::Utc;
    use mockall::predicate::eq;

    fn project(id: i32) -> Project {
        let now = Utc::now();
        Project {
            id,
            title: format!("Project {id}"),
            description: String::new(),
            github_link: String::new(),
            image: String::new(),
            live_url: String::new(),
            status: ProjectStatus::InProgress,
            likes: id,
            views: 0,
            version: String::new(),
            cost: 0.0,
            category: String::new(),
            visibility: PUBLIC_VISIBILITY,
            created_by: 1,
            created_at: now,
            updated_at: now,
            creator: Some(UserSummary {
                id: 1,
                name: "Ada".to_string(),
                username: "ada".to_string(),
                email: "ada@example.com".to_string(),
            }),
            contributors: Vec::new(),
            tags: Vec::new(),
            technologies: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_get_all_projects_empty_page() {
        let mut mock_repo = MockProjectRepository::new();
        mock_repo
            .expect_list_public_projects()
            .returning(|_, _| Ok(Vec::new()));

        let service = ProjectService::new(mock_repo);
        let projects = service.get_all_projects(10, 0, "anyone").await.unwrap();

        assert!(projects.is_empty());
    }

    #[tokio::test]
    async fn test_get_all_projects_preserves_store_order() {
        let mut mock_repo = MockProjectRepository::new();
        mock_repo
            .expect_list_public_projects()
            .with(eq(10), eq(20))
            .returning(|_, _| Ok(vec![project(3), project(1), project(2)]));

        let service = ProjectService::new(mock_repo);
        let projects = service.get_all_projects(10, 20, "ada").await.unwrap();

        let ids: Vec<i32> = projects.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
        assert!(projects.iter().all(|p| p.star_count == 0 && p.favorite_count == 0));
        assert_eq!(projects[0].creator_details.as_ref().unwrap().username, "ada");
    }

    #[tokio::test]
    async fn test_get_all_projects_propagates_store_error() {
        let mut mock_repo = MockProjectRepository::new();
        mock_repo.expect_list_public_projects().returning(|_, _| {
            Err(ProjectError::Store(sea_orm::DbErr::Custom(
                "connection refused".to_string(),
            )))
        });

        let service = ProjectService::new(mock_repo);
        let err = service.get_all_projects(10, 0, "ada").await.unwrap_err();

        assert!(matches!(err, ProjectError::Store(_)));
    }

    #[tokio::test]
    async fn test_page_limit_is_normalised() {
        let mut mock_repo = MockProjectRepository::new();
        mock_repo
            .expect_list_public_projects()
            .with(eq(20), eq(0))
            .times(1)
            .returning(|_, _| Ok(Vec::new()));
        mock_repo
            .expect_list_essential_projects()
            .with(eq(100), eq(5))
            .times(1)
            .returning(|_, _| Ok(Vec::new()));

        let service = ProjectService::new(mock_repo);
        service.get_all_projects(0, 0, "ada").await.unwrap();
        service.list_essential_projects(5000, 5).await.unwrap();
    }

    #[tokio::test]
    async fn test_create_project_rejects_invalid_input_without_store_call() {
        let mut mock_repo = MockProjectRepository::new();
        mock_repo.expect_create().never();

        let service = ProjectService::new(mock_repo);
        let err = service
            .create_project(CreateProject::new("", 1))
            .await
            .unwrap_err();

        assert!(matches!(err, ProjectError::Validation(_)));
    }

    #[tokio::test]
    async fn test_create_project_maps_response() {
        let mut mock_repo = MockProjectRepository::new();
        mock_repo
            .expect_create()
            .withf(|input| input.title == "Project 4")
            .returning(|_| Ok(project(4)));

        let service = ProjectService::new(mock_repo);
        let response = service
            .create_project(CreateProject::new("Project 4", 1))
            .await
            .unwrap();

        assert_eq!(response.id, 4);
    }

    #[tokio::test]
    async fn test_get_project_not_found() {
        let mut mock_repo = MockProjectRepository::new();
        mock_repo
            .expect_get_by_id()
            .with(eq(9))
            .returning(|id| Err(ProjectError::project_not_found(id)));

        let service = ProjectService::new(mock_repo);
        let err = service.get_project(9).await.unwrap_err();

        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_like_delegates_to_store() {
        let mut mock_repo = MockProjectRepository::new();
        mock_repo
            .expect_like_project()
            .with(eq(2), eq(1))
            .returning(|_, _| Ok(true));
        mock_repo
            .expect_unlike_project()
            .with(eq(2), eq(1))
            .returning(|_, _| Ok(false));
        mock_repo
            .expect_toggle_like()
            .with(eq(2), eq(1))
            .returning(|_, _| Ok(true));

        let service = ProjectService::new(mock_repo);
        assert!(service.like_project(2, 1).await.unwrap());
        assert!(!service.unlike_project(2, 1).await.unwrap());
        assert!(service.toggle_like(2, 1).await.unwrap());
    }

    #[tokio::test]
    async fn test_clone_shares_repository_without_clone_bound() {
        let mut mock_repo = MockProjectRepository::new();
        mock_repo.expect_count().times(2).returning(|| Ok(7));

        let service = ProjectService::new(mock_repo);
        let cloned = service.clone();

        assert_eq!(service.count_projects().await.unwrap(), 7);
        assert_eq!(cloned.count_projects().await.unwrap(), 7);
    }
}
