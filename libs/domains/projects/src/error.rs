use strum::Display;
use thiserror::Error;

/// Kind of record a lookup failed to find
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Resource {
    User,
    Project,
}

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("{resource} not found: {id}")]
    NotFound { resource: Resource, id: i32 },

    #[error("Invalid input: {0}")]
    Validation(String),

    /// Persistence failure: connectivity, constraint violation, serialization failure
    #[error("Store error: {0}")]
    Store(#[from] sea_orm::DbErr),
}

pub type ProjectResult<T> = Result<T, ProjectError>;

impl ProjectError {
    pub fn user_not_found(id: i32) -> Self {
        Self::NotFound {
            resource: Resource::User,
            id,
        }
    }

    pub fn project_not_found(id: i32) -> Self {
        Self::NotFound {
            resource: Resource::Project,
            id,
        }
    }

    /// Callers map this to a 404; `Store` maps to a 5xx, `Validation` to a 400
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<validator::ValidationErrors> for ProjectError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation(errors.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        assert_eq!(ProjectError::user_not_found(7).to_string(), "User not found: 7");
        assert_eq!(
            ProjectError::project_not_found(3).to_string(),
            "Project not found: 3"
        );
        assert!(ProjectError::project_not_found(3).is_not_found());
    }

    #[test]
    fn test_store_error_from_db_err() {
        let err: ProjectError = sea_orm::DbErr::Custom("connection reset".to_string()).into();
        assert!(matches!(err, ProjectError::Store(_)));
        assert!(!err.is_not_found());
    }
}
