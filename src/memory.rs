//! In-process store backing `AppState::fake()` and the test suites.
use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    auth::{
        repo::UserRepo,
        repo_types::{Identity, NewUser, User},
    },
    error::StoreError,
    projects::{
        repo::ProjectRepo,
        repo_types::{NewProject, Project},
    },
};

#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<Vec<User>>,
    projects: RwLock<Vec<Project>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepo for MemoryStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.username == username).cloned())
    }

    async fn find_identity(&self, id: Uuid) -> Result<Option<Identity>, StoreError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.id == id).map(Identity::from))
    }

    async fn insert(&self, user: NewUser) -> Result<User, StoreError> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.username == user.username) {
            return Err(StoreError::Duplicate {
                field: "username".into(),
                value: user.username,
            });
        }
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: user.id,
            username: user.username,
            password_hash: user.password_hash,
            name: user.name,
            created_at: now,
            updated_at: now,
        };
        users.push(user.clone());
        Ok(user)
    }
}

#[async_trait]
impl ProjectRepo for MemoryStore {
    async fn insert(&self, project: NewProject) -> Result<Project, StoreError> {
        let owner_exists = self.users.read().await.iter().any(|u| u.id == project.user_id);
        if !owner_exists {
            return Err(StoreError::Constraint(format!(
                "Key (user_id)=({}) is not present in table \"users\".",
                project.user_id
            )));
        }
        let now = OffsetDateTime::now_utc();
        let project = Project {
            id: project.id,
            user_id: project.user_id,
            title: project.title,
            description: project.description,
            technologies: project.technologies,
            link: project.link,
            image_url: project.image_url,
            created_at: now,
            updated_at: now,
        };
        self.projects.write().await.push(project.clone());
        Ok(project)
    }

    async fn list_newest_first(&self) -> Result<Vec<Project>, StoreError> {
        // Reverse insertion order first so equal timestamps still list newest first.
        let mut all: Vec<Project> = self.projects.read().await.iter().rev().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Project>, StoreError> {
        let projects = self.projects.read().await;
        Ok(projects.iter().find(|p| p.id == id).cloned())
    }

    async fn update(&self, project: &Project) -> Result<Option<Project>, StoreError> {
        let mut projects = self.projects.write().await;
        let Some(row) = projects.iter_mut().find(|p| p.id == project.id) else {
            return Ok(None);
        };
        row.title = project.title.clone();
        row.description = project.description.clone();
        row.technologies = project.technologies.clone();
        row.link = project.link.clone();
        row.image_url = project.image_url.clone();
        row.updated_at = OffsetDateTime::now_utc();
        Ok(Some(row.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut projects = self.projects.write().await;
        let before = projects.len();
        projects.retain(|p| p.id != id);
        Ok(projects.len() != before)
    }
}
