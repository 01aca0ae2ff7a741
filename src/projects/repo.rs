use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::StoreError;
use crate::projects::repo_types::{NewProject, Project};

/// Persistence seam for projects. Each call is a single-row write or read;
/// nothing here spans records.
#[async_trait]
pub trait ProjectRepo: Send + Sync {
    async fn insert(&self, project: NewProject) -> Result<Project, StoreError>;
    /// All projects, newest first.
    async fn list_newest_first(&self) -> Result<Vec<Project>, StoreError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Project>, StoreError>;
    /// Writes the mutable fields and bumps `updated_at`. `None` if the row is gone.
    async fn update(&self, project: &Project) -> Result<Option<Project>, StoreError>;
    /// `true` if a row was removed.
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;
}

#[derive(Clone)]
pub struct PgProjectRepo {
    db: PgPool,
}

impl PgProjectRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ProjectRepo for PgProjectRepo {
    async fn insert(&self, project: NewProject) -> Result<Project, StoreError> {
        let row = sqlx::query_as::<_, Project>(
            r#"
            INSERT INTO projects (id, user_id, title, description, technologies, link, image_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, user_id, title, description, technologies, link, image_url,
                      created_at, updated_at
            "#,
        )
        .bind(project.id)
        .bind(project.user_id)
        .bind(&project.title)
        .bind(&project.description)
        .bind(&project.technologies)
        .bind(&project.link)
        .bind(&project.image_url)
        .fetch_one(&self.db)
        .await?;
        Ok(row)
    }

    async fn list_newest_first(&self) -> Result<Vec<Project>, StoreError> {
        let rows = sqlx::query_as::<_, Project>(
            r#"
            SELECT id, user_id, title, description, technologies, link, image_url,
                   created_at, updated_at
            FROM projects
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Project>, StoreError> {
        let row = sqlx::query_as::<_, Project>(
            r#"
            SELECT id, user_id, title, description, technologies, link, image_url,
                   created_at, updated_at
            FROM projects
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn update(&self, project: &Project) -> Result<Option<Project>, StoreError> {
        let row = sqlx::query_as::<_, Project>(
            r#"
            UPDATE projects
               SET title = $2,
                   description = $3,
                   technologies = $4,
                   link = $5,
                   image_url = $6,
                   updated_at = now()
             WHERE id = $1
            RETURNING id, user_id, title, description, technologies, link, image_url,
                      created_at, updated_at
            "#,
        )
        .bind(project.id)
        .bind(&project.title)
        .bind(&project.description)
        .bind(&project.technologies)
        .bind(&project.link)
        .bind(&project.image_url)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let res = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}
