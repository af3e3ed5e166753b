use chrono::{DateTime, Utc};
use regex::Regex;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use strum::Display;
use utoipa::ToSchema;
use validator::Validate;

/// Visibility value of a publicly listable project. Any other value is restricted.
pub const PUBLIC_VISIBILITY: i32 = 0;

/// Conventional value for a project only its creator can list
pub const PRIVATE_VISIBILITY: i32 = 1;

/// Letters, digits, spaces and the punctuation found in technology names (C++, C#, Node.js)
static TAXONOMY_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9 .+#_/-]*$").unwrap());

fn validate_taxonomy_names(names: &[String]) -> Result<(), validator::ValidationError> {
    for name in names {
        if name.len() > 64 || !TAXONOMY_NAME.is_match(name) {
            let mut error = validator::ValidationError::new("invalid_taxonomy_name");
            error.add_param("value".into(), name);
            return Err(error);
        }
    }
    Ok(())
}

/// Lifecycle of a project
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    Default,
    DeriveActiveEnum,
    EnumIter,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "project_status")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ProjectStatus {
    #[default]
    #[sea_orm(string_value = "draft")]
    Draft,
    #[sea_orm(string_value = "in_progress")]
    InProgress,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "archived")]
    Archived,
}

/// The slice of a user that project views need
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserSummary {
    pub id: i32,
    pub name: String,
    pub username: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Tag {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Technology {
    pub id: i32,
    pub name: String,
}

/// Project with its related entities.
///
/// Listings that skip eager loading leave `creator` as `None` and the
/// collections empty.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Project {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub github_link: String,
    pub image: String,
    pub live_url: String,
    pub status: ProjectStatus,
    /// Number of users liking this project, kept in step with the like rows
    pub likes: i32,
    pub views: i32,
    pub version: String,
    pub cost: f64,
    pub category: String,
    pub visibility: i32,
    pub created_by: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub creator: Option<UserSummary>,
    pub contributors: Vec<UserSummary>,
    pub tags: Vec<Tag>,
    pub technologies: Vec<Technology>,
}

impl Project {
    pub fn is_public(&self) -> bool {
        self.visibility == PUBLIC_VISIBILITY
    }

    /// Whether `user_id` may see this project in a listing
    pub fn is_visible_to(&self, user_id: i32) -> bool {
        self.is_public() || self.created_by == user_id
    }
}

/// Payload for creating a project.
///
/// Tags and technologies are given by name and created on demand;
/// contributors reference existing users.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateProject {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[serde(default)]
    #[validate(length(max = 10000))]
    pub description: String,
    #[validate(url)]
    pub github_link: Option<String>,
    #[validate(url)]
    pub image: Option<String>,
    #[validate(url)]
    pub live_url: Option<String>,
    #[serde(default)]
    pub status: ProjectStatus,
    #[serde(default)]
    #[validate(length(max = 32))]
    pub version: String,
    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub cost: f64,
    #[serde(default)]
    #[validate(length(max = 100))]
    pub category: String,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub visibility: i32,
    pub created_by: i32,
    #[serde(default)]
    pub contributor_ids: Vec<i32>,
    #[serde(default)]
    #[validate(custom(function = "validate_taxonomy_names"))]
    pub tags: Vec<String>,
    #[serde(default)]
    #[validate(custom(function = "validate_taxonomy_names"))]
    pub technologies: Vec<String>,
}

impl CreateProject {
    /// Minimal public draft, the remaining fields at their defaults
    pub fn new(title: impl Into<String>, created_by: i32) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            github_link: None,
            image: None,
            live_url: None,
            status: ProjectStatus::default(),
            version: String::new(),
            cost: 0.0,
            category: String::new(),
            visibility: PUBLIC_VISIBILITY,
            created_by,
            contributor_ids: Vec::new(),
            tags: Vec::new(),
            technologies: Vec::new(),
        }
    }

    /// Tag names with duplicates removed, first occurrence wins
    pub fn unique_tags(&self) -> Vec<String> {
        dedup_preserving_order(self.tags.iter().cloned())
    }

    pub fn unique_technologies(&self) -> Vec<String> {
        dedup_preserving_order(self.technologies.iter().cloned())
    }

    pub fn unique_contributor_ids(&self) -> Vec<i32> {
        dedup_preserving_order(self.contributor_ids.iter().copied())
    }
}

fn dedup_preserving_order<T: Clone + Eq + std::hash::Hash>(items: impl Iterator<Item = T>) -> Vec<T> {
    let mut seen = std::collections::HashSet::new();
    items.filter(|item| seen.insert(item.clone())).collect()
}

/// Summary of the creator embedded in project responses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CreatorDetails {
    pub id: i32,
    pub name: String,
    pub username: String,
    pub email: String,
}

/// Public-facing shape of a project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProjectResponse {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub github_link: String,
    pub image: String,
    pub live_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub status: ProjectStatus,
    pub likes: i32,
    pub view_count: i32,
    pub comment_count: i32,
    pub fork_count: i32,
    pub star_count: i32,
    pub favorite_count: i32,
    pub version: String,
    pub cost: f64,
    pub category: String,
    pub creator_details: Option<CreatorDetails>,
    pub contributors_details: Vec<String>,
    pub tags_details: Vec<String>,
    pub technology_details: Vec<String>,
}

/// Lightweight list-view shape, no related entities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct EssentialProjectResponse {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub image: String,
    pub status: ProjectStatus,
    pub category: String,
    pub likes: i32,
    pub view_count: i32,
    pub created_at: DateTime<Utc>,
}
