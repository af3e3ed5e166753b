//! Mapping from loaded projects to their public response shapes.
//!
//! Comment, fork, star and favourite counts are not aggregated anywhere yet
//! and are always emitted as zero.

use crate::models::{
    CreatorDetails, EssentialProjectResponse, Project, ProjectResponse, Tag, Technology,
    UserSummary,
};

pub fn project_response(project: Project) -> ProjectResponse {
    ProjectResponse {
        creator_details: creator_details(project.creator.as_ref()),
        contributors_details: contributor_usernames(&project.contributors),
        tags_details: tag_names(&project.tags),
        technology_details: technology_names(&project.technologies),
        id: project.id,
        title: project.title,
        description: project.description,
        github_link: project.github_link,
        image: project.image,
        live_url: project.live_url,
        created_at: project.created_at,
        updated_at: project.updated_at,
        status: project.status,
        likes: project.likes,
        view_count: project.views,
        comment_count: 0,
        fork_count: 0,
        star_count: 0,
        favorite_count: 0,
        version: project.version,
        cost: project.cost,
        category: project.category,
    }
}

pub fn creator_details(creator: Option<&UserSummary>) -> Option<CreatorDetails> {
    creator.map(|user| CreatorDetails {
        id: user.id,
        name: user.name.clone(),
        username: user.username.clone(),
        email: user.email.clone(),
    })
}

pub fn contributor_usernames(contributors: &[UserSummary]) -> Vec<String> {
    contributors.iter().map(|u| u.username.clone()).collect()
}

pub fn tag_names(tags: &[Tag]) -> Vec<String> {
    tags.iter().map(|t| t.name.clone()).collect()
}

pub fn technology_names(technologies: &[Technology]) -> Vec<String> {
    technologies.iter().map(|t| t.name.clone()).collect()
}

/// List-view shape; ignores related entities
pub fn essential_response(project: Project) -> EssentialProjectResponse {
    EssentialProjectResponse {
        id: project.id,
        title: project.title,
        description: project.description,
        image: project.image,
        status: project.status,
        category: project.category,
        likes: project.likes,
        view_count: project.views,
        created_at: project.created_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ProjectStatus, PUBLIC_VISIBILITY};
    use chrono::Utc;

    fn user(id: i32, username: &str) -> UserSummary {
        UserSummary {
            id,
            name: format!("{username} name"),
            username: username.to_string(),
            email: format!("{username}@example.com"),
        }
    }

    fn loaded_project() -> Project {
        let now = Utc::now();
        Project {
            id: 1,
            title: "Line follower".to_string(),
            description: "Arduino robot".to_string(),
            github_link: "https://github.com/example/line-follower".to_string(),
            image: String::new(),
            live_url: String::new(),
            status: ProjectStatus::Completed,
            likes: 4,
            views: 40,
            version: "2.1".to_string(),
            cost: 35.5,
            category: "robotics".to_string(),
            visibility: PUBLIC_VISIBILITY,
            created_by: 7,
            created_at: now,
            updated_at: now,
            creator: Some(user(7, "ada")),
            contributors: vec![user(9, "zed"), user(8, "bob")],
            tags: vec![
                Tag { id: 2, name: "arduino".to_string() },
                Tag { id: 1, name: "robot".to_string() },
            ],
            technologies: vec![Technology { id: 5, name: "C++".to_string() }],
        }
    }

    #[test]
    fn test_project_response_copies_fields() {
        let project = loaded_project();
        let created_at = project.created_at;
        let response = project_response(project);

        assert_eq!(response.id, 1);
        assert_eq!(response.title, "Line follower");
        assert_eq!(response.likes, 4);
        assert_eq!(response.view_count, 40);
        assert_eq!(response.version, "2.1");
        assert_eq!(response.cost, 35.5);
        assert_eq!(response.status, ProjectStatus::Completed);
        assert_eq!(response.created_at, created_at);
    }

    #[test]
    fn test_project_response_unbacked_counters_are_zero() {
        let mut project = loaded_project();
        project.likes = 1000;
        project.views = 1000;
        let response = project_response(project);

        assert_eq!(response.comment_count, 0);
        assert_eq!(response.fork_count, 0);
        assert_eq!(response.star_count, 0);
        assert_eq!(response.favorite_count, 0);
    }

    #[test]
    fn test_project_response_derived_lists_keep_order() {
        let response = project_response(loaded_project());

        let creator = response.creator_details.unwrap();
        assert_eq!(creator.id, 7);
        assert_eq!(creator.username, "ada");
        assert_eq!(response.contributors_details, vec!["zed", "bob"]);
        assert_eq!(response.tags_details, vec!["arduino", "robot"]);
        assert_eq!(response.technology_details, vec!["C++"]);
    }

    #[test]
    fn test_project_response_without_relations() {
        let mut project = loaded_project();
        project.creator = None;
        project.contributors.clear();
        project.tags.clear();
        project.technologies.clear();

        let response = project_response(project);
        assert!(response.creator_details.is_none());
        assert!(response.contributors_details.is_empty());
        assert!(response.tags_details.is_empty());
        assert!(response.technology_details.is_empty());
    }

    #[test]
    fn test_response_json_field_names() {
        let json = serde_json::to_value(project_response(loaded_project())).unwrap();

        for key in [
            "github_link",
            "live_url",
            "view_count",
            "comment_count",
            "fork_count",
            "star_count",
            "favorite_count",
            "creator_details",
            "contributors_details",
            "tags_details",
            "technology_details",
        ] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
        assert_eq!(json["status"], "completed");
    }

    #[test]
    fn test_essential_response() {
        let response = essential_response(loaded_project());
        assert_eq!(response.id, 1);
        assert_eq!(response.view_count, 40);
        assert_eq!(response.category, "robotics");
    }
}
