use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::{ProjectError, ProjectResult};
use crate::models::{CreateProject, Project, Tag, Technology, UserSummary};

/// Data access for projects, their related entities and the like relationship.
///
/// Empty result sets are returned as empty vectors, never as errors.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    /// Public projects with creator, contributors, tags and technologies loaded
    async fn list_public_projects(&self, limit: u64, offset: u64) -> ProjectResult<Vec<Project>>;

    /// Projects created by `user_id` plus every public project, fully loaded
    async fn list_visible_projects_for_user(
        &self,
        user_id: i32,
        limit: u64,
        offset: u64,
    ) -> ProjectResult<Vec<Project>>;

    /// All projects, rows only (no related entities)
    async fn list_essential_projects(
        &self,
        limit: u64,
        offset: u64,
    ) -> ProjectResult<Vec<Project>>;

    /// A fully loaded project, or `NotFound`
    async fn get_by_id(&self, id: i32) -> ProjectResult<Project>;

    /// Total number of projects, unfiltered
    async fn count(&self) -> ProjectResult<u64>;

    async fn is_liked(&self, user_id: i32, project_id: i32) -> ProjectResult<bool>;

    /// Insert a project and link its tags, technologies and contributors
    async fn create(&self, input: CreateProject) -> ProjectResult<Project>;

    /// Record a like and bump the counter atomically.
    ///
    /// Returns `false` when the like already existed; nothing changes then.
    async fn like_project(&self, user_id: i32, project_id: i32) -> ProjectResult<bool>;

    /// Remove a like and decrement the counter atomically.
    ///
    /// Returns `false` when there was no like; nothing changes then.
    async fn unlike_project(&self, user_id: i32, project_id: i32) -> ProjectResult<bool>;

    /// Flip the like state in one transaction and return the new state
    async fn toggle_like(&self, user_id: i32, project_id: i32) -> ProjectResult<bool>;

    async fn find_or_create_tag(&self, name: &str) -> ProjectResult<Tag>;

    async fn find_or_create_technology(&self, name: &str) -> ProjectResult<Technology>;
}

#[derive(Debug, Default)]
struct MemoryState {
    users: HashMap<i32, UserSummary>,
    /// Ordered by id, the listing order
    projects: BTreeMap<i32, Project>,
    likes: HashSet<(i32, i32)>,
    tags: Vec<Tag>,
    technologies: Vec<Technology>,
    next_user_id: i32,
    next_project_id: i32,
}

impl MemoryState {
    fn require_user(&self, id: i32) -> ProjectResult<&UserSummary> {
        self.users.get(&id).ok_or(ProjectError::user_not_found(id))
    }

    fn require_project(&mut self, id: i32) -> ProjectResult<&mut Project> {
        self.projects
            .get_mut(&id)
            .ok_or(ProjectError::project_not_found(id))
    }

    fn tag(&mut self, name: &str) -> Tag {
        if let Some(tag) = self.tags.iter().find(|t| t.name == name) {
            return tag.clone();
        }
        let tag = Tag {
            id: self.tags.len() as i32 + 1,
            name: name.to_string(),
        };
        self.tags.push(tag.clone());
        tag
    }

    fn technology(&mut self, name: &str) -> Technology {
        if let Some(tech) = self.technologies.iter().find(|t| t.name == name) {
            return tech.clone();
        }
        let tech = Technology {
            id: self.technologies.len() as i32 + 1,
            name: name.to_string(),
        };
        self.technologies.push(tech.clone());
        tech
    }

    /// Apply a like-state change for an existing user and project.
    /// The counter moves only when the relationship actually changed.
    fn set_liked(&mut self, user_id: i32, project_id: i32, liked: bool) -> ProjectResult<bool> {
        self.require_user(user_id)?;
        self.require_project(project_id)?;

        let changed = if liked {
            self.likes.insert((user_id, project_id))
        } else {
            self.likes.remove(&(user_id, project_id))
        };

        if changed {
            let project = self.require_project(project_id)?;
            project.likes += if liked { 1 } else { -1 };
        }

        Ok(changed)
    }

    fn page(&self, filter: impl Fn(&Project) -> bool, limit: u64, offset: u64) -> Vec<Project> {
        self.projects
            .values()
            .filter(|p| filter(*p))
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect()
    }
}

/// In-memory implementation of ProjectRepository (for development/testing)
///
/// A single lock guards all state, so every operation is atomic.
#[derive(Debug, Default, Clone)]
pub struct InMemoryProjectRepository {
    state: Arc<RwLock<MemoryState>>,
}

impl InMemoryProjectRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a user; accounts are owned by another service in production
    pub async fn add_user(&self, name: &str, username: &str, email: &str) -> UserSummary {
        let mut state = self.state.write().await;
        state.next_user_id += 1;
        let user = UserSummary {
            id: state.next_user_id,
            name: name.to_string(),
            username: username.to_string(),
            email: email.to_string(),
        };
        state.users.insert(user.id, user.clone());
        user
    }

    /// Number of stored like rows for a project
    pub async fn like_rows(&self, project_id: i32) -> usize {
        let state = self.state.read().await;
        state.likes.iter().filter(|(_, p)| *p == project_id).count()
    }
}

#[async_trait]
impl ProjectRepository for InMemoryProjectRepository {
    async fn list_public_projects(&self, limit: u64, offset: u64) -> ProjectResult<Vec<Project>> {
        let state = self.state.read().await;
        Ok(state.page(Project::is_public, limit, offset))
    }

    async fn list_visible_projects_for_user(
        &self,
        user_id: i32,
        limit: u64,
        offset: u64,
    ) -> ProjectResult<Vec<Project>> {
        let state = self.state.read().await;
        Ok(state.page(move |p| p.is_visible_to(user_id), limit, offset))
    }

    async fn list_essential_projects(
        &self,
        limit: u64,
        offset: u64,
    ) -> ProjectResult<Vec<Project>> {
        let state = self.state.read().await;
        let projects = state
            .page(|_| true, limit, offset)
            .into_iter()
            .map(|mut p| {
                p.creator = None;
                p.contributors.clear();
                p.tags.clear();
                p.technologies.clear();
                p
            })
            .collect();
        Ok(projects)
    }

    async fn get_by_id(&self, id: i32) -> ProjectResult<Project> {
        let state = self.state.read().await;
        state
            .projects
            .get(&id)
            .cloned()
            .ok_or(ProjectError::project_not_found(id))
    }

    async fn count(&self) -> ProjectResult<u64> {
        Ok(self.state.read().await.projects.len() as u64)
    }

    async fn is_liked(&self, user_id: i32, project_id: i32) -> ProjectResult<bool> {
        Ok(self.state.read().await.likes.contains(&(user_id, project_id)))
    }

    async fn create(&self, input: CreateProject) -> ProjectResult<Project> {
        let mut state = self.state.write().await;

        let creator = state.require_user(input.created_by)?.clone();
        let contributors = input
            .unique_contributor_ids()
            .into_iter()
            .map(|id| state.require_user(id).cloned())
            .collect::<ProjectResult<Vec<_>>>()?;
        let tags = input.unique_tags().iter().map(|n| state.tag(n)).collect();
        let technologies = input
            .unique_technologies()
            .iter()
            .map(|n| state.technology(n))
            .collect();

        state.next_project_id += 1;
        let now = Utc::now();
        let project = Project {
            id: state.next_project_id,
            title: input.title,
            description: input.description,
            github_link: input.github_link.unwrap_or_default(),
            image: input.image.unwrap_or_default(),
            live_url: input.live_url.unwrap_or_default(),
            status: input.status,
            likes: 0,
            views: 0,
            version: input.version,
            cost: input.cost,
            category: input.category,
            visibility: input.visibility,
            created_by: input.created_by,
            created_at: now,
            updated_at: now,
            creator: Some(creator),
            contributors,
            tags,
            technologies,
        };
        state.projects.insert(project.id, project.clone());

        tracing::info!(project_id = project.id, "Created project");
        Ok(project)
    }

    async fn like_project(&self, user_id: i32, project_id: i32) -> ProjectResult<bool> {
        self.state.write().await.set_liked(user_id, project_id, true)
    }

    async fn unlike_project(&self, user_id: i32, project_id: i32) -> ProjectResult<bool> {
        self.state.write().await.set_liked(user_id, project_id, false)
    }

    async fn toggle_like(&self, user_id: i32, project_id: i32) -> ProjectResult<bool> {
        let mut state = self.state.write().await;
        let liked = !state.likes.contains(&(user_id, project_id));
        state.set_liked(user_id, project_id, liked)?;
        Ok(liked)
    }

    async fn find_or_create_tag(&self, name: &str) -> ProjectResult<Tag> {
        Ok(self.state.write().await.tag(name))
    }

    async fn find_or_create_technology(&self, name: &str) -> ProjectResult<Technology> {
        Ok(self.state.write().await.technology(name))
    }
}
