use core_config::{env_parse_or_default, ConfigError, FromEnv};

/// Paging limits applied by the service before hitting the store
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProjectsConfig {
    /// Used when a caller asks for `limit = 0`
    pub default_page_size: u64,
    /// Upper bound on any requested `limit`
    pub max_page_size: u64,
}

impl ProjectsConfig {
    /// Resolve a requested limit against the configured bounds
    pub fn page_limit(&self, requested: u64) -> u64 {
        match requested {
            0 => self.default_page_size,
            n => n.min(self.max_page_size),
        }
    }
}

impl Default for ProjectsConfig {
    fn default() -> Self {
        Self {
            default_page_size: 20,
            max_page_size: 100,
        }
    }
}

impl FromEnv for ProjectsConfig {
    /// - `PROJECTS_DEFAULT_PAGE_SIZE` (default: 20)
    /// - `PROJECTS_MAX_PAGE_SIZE` (default: 100)
    fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            default_page_size: env_parse_or_default("PROJECTS_DEFAULT_PAGE_SIZE", "20")?,
            max_page_size: env_parse_or_default("PROJECTS_MAX_PAGE_SIZE", "100")?,
        };

        if config.max_page_size == 0 || config.default_page_size > config.max_page_size {
            return Err(ConfigError::Invalid(format!(
                "PROJECTS_DEFAULT_PAGE_SIZE ({}) must be between 1 and PROJECTS_MAX_PAGE_SIZE ({})",
                config.default_page_size, config.max_page_size
            )));
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_limit() {
        let config = ProjectsConfig::default();
        assert_eq!(config.page_limit(0), 20);
        assert_eq!(config.page_limit(10), 10);
        assert_eq!(config.page_limit(500), 100);
    }

    #[test]
    fn test_from_env_defaults() {
        temp_env::with_vars_unset(
            ["PROJECTS_DEFAULT_PAGE_SIZE", "PROJECTS_MAX_PAGE_SIZE"],
            || {
                assert_eq!(ProjectsConfig::from_env().unwrap(), ProjectsConfig::default());
            },
        );
    }

    #[test]
    fn test_from_env_custom() {
        temp_env::with_vars(
            [
                ("PROJECTS_DEFAULT_PAGE_SIZE", Some("5")),
                ("PROJECTS_MAX_PAGE_SIZE", Some("25")),
            ],
            || {
                let config = ProjectsConfig::from_env().unwrap();
                assert_eq!(config.default_page_size, 5);
                assert_eq!(config.max_page_size, 25);
            },
        );
    }

    #[test]
    fn test_from_env_rejects_default_above_max() {
        temp_env::with_vars(
            [
                ("PROJECTS_DEFAULT_PAGE_SIZE", Some("50")),
                ("PROJECTS_MAX_PAGE_SIZE", Some("10")),
            ],
            || {
                let err = ProjectsConfig::from_env().unwrap_err();
                assert!(matches!(err, ConfigError::Invalid(_)));
            },
        );
    }

    #[test]
    fn test_from_env_invalid_number() {
        temp_env::with_var("PROJECTS_MAX_PAGE_SIZE", Some("lots"), || {
            let err = ProjectsConfig::from_env().unwrap_err();
            assert!(err.to_string().contains("PROJECTS_MAX_PAGE_SIZE"));
        });
    }
}
