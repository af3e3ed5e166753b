//! Projects Domain
//!
//! Data access and presentation for community projects: listings filtered by
//! visibility, likes with a denormalised counter, and tag/technology taxonomy.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │   Service   │  ← Paging rules, validation
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │  Presenter  │  ← Project → response objects
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │ Repository  │  ← Data access (trait + PostgreSQL / in-memory)
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Entity    │  ← sea-orm tables
//! └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use domain_projects::{PgProjectRepository, ProjectService};
//!
//! # async fn run(db: sea_orm::DatabaseConnection) -> domain_projects::ProjectResult<()> {
//! let service = ProjectService::new(PgProjectRepository::new(db));
//! let page = service.get_all_projects(20, 0, "ada").await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod entity;
pub mod error;
pub mod models;
pub mod postgres;
pub mod presenter;
pub mod repository;
pub mod service;

// Re-export commonly used types
pub use config::ProjectsConfig;
pub use error::{ProjectError, ProjectResult, Resource};
pub use models::{
    CreateProject, CreatorDetails, EssentialProjectResponse, Project, ProjectResponse,
    ProjectStatus, Tag, Technology, UserSummary, PRIVATE_VISIBILITY, PUBLIC_VISIBILITY,
};
pub use postgres::PgProjectRepository;
pub use repository::{InMemoryProjectRepository, ProjectRepository};
pub use service::ProjectService;
