use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::repo_types::Identity,
    error::AppError,
    projects::{
        dto::{CreateProjectRequest, ProjectPatch},
        repo::ProjectRepo,
        repo_types::{NewProject, Project},
    },
};

const PROJECT_NOT_FOUND: &str = "Không tìm thấy dự án.";

#[derive(Debug, Clone, Copy)]
enum OwnerAction {
    Edit,
    Delete,
}

impl OwnerAction {
    fn denied(self) -> AppError {
        match self {
            OwnerAction::Edit => AppError::Forbidden("Bạn không có quyền chỉnh sửa dự án này."),
            OwnerAction::Delete => AppError::Forbidden("Bạn không có quyền xóa dự án này."),
        }
    }
}

/// Rejects anything that is not a UUID before the store is touched.
pub fn parse_project_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::InvalidIdentifier)
}

fn trimmed(s: Option<String>) -> Option<String> {
    s.map(|s| s.trim().to_string())
}

/// Store-level rules for a record about to be written.
fn check_record(title: &str, description: &str) -> Result<(), AppError> {
    let mut problems = Vec::new();
    if title.is_empty() {
        problems.push("Vui lòng nhập tiêu đề dự án".to_string());
    }
    if description.is_empty() {
        problems.push("Vui lòng nhập mô tả dự án".to_string());
    }
    if problems.is_empty() {
        Ok(())
    } else {
        Err(AppError::ValidationFailed(problems))
    }
}

#[instrument(skip(repo, owner, req), fields(owner_id = %owner.id))]
pub async fn create_project(
    repo: &dyn ProjectRepo,
    owner: &Identity,
    req: CreateProjectRequest,
) -> Result<Project, AppError> {
    let (title, description) = match (req.title, req.description) {
        (Some(t), Some(d)) if !t.is_empty() && !d.is_empty() => (t, d),
        _ => {
            return Err(AppError::BadRequest(
                "Tiêu đề và Mô tả dự án là bắt buộc.".into(),
            ))
        }
    };

    let new = NewProject {
        id: Uuid::new_v4(),
        user_id: owner.id,
        title: title.trim().to_string(),
        description,
        technologies: req.technologies.unwrap_or_default(),
        link: trimmed(req.link),
        image_url: trimmed(req.image_url),
    };
    check_record(&new.title, &new.description)?;

    let project = repo.insert(new).await?;
    info!(project_id = %project.id, "project created");
    Ok(project)
}

pub async fn list_projects(repo: &dyn ProjectRepo) -> Result<Vec<Project>, AppError> {
    Ok(repo.list_newest_first().await?)
}

#[instrument(skip(repo))]
pub async fn get_project(repo: &dyn ProjectRepo, raw_id: &str) -> Result<Project, AppError> {
    let id = parse_project_id(raw_id)?;
    repo.find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(PROJECT_NOT_FOUND.into()))
}

/// Loads a project and checks that `requester` owns it.
async fn load_owned(
    repo: &dyn ProjectRepo,
    raw_id: &str,
    requester: &Identity,
    action: OwnerAction,
) -> Result<Project, AppError> {
    let project = get_project(repo, raw_id).await?;
    if project.user_id != requester.id {
        warn!(project_id = %project.id, requester = %requester.id, ?action, "not the owner");
        return Err(action.denied());
    }
    Ok(project)
}

impl ProjectPatch {
    /// Empty title/description count as absent; a present `link`/`imageUrl`
    /// always wins, even when empty or null.
    pub fn apply(self, project: &mut Project) {
        if let Some(title) = self.title.filter(|t| !t.is_empty()) {
            project.title = title.trim().to_string();
        }
        if let Some(description) = self.description.filter(|d| !d.is_empty()) {
            project.description = description;
        }
        if let Some(technologies) = self.technologies {
            project.technologies = technologies;
        }
        if let Some(link) = self.link {
            project.link = trimmed(link);
        }
        if let Some(image_url) = self.image_url {
            project.image_url = trimmed(image_url);
        }
    }
}

#[instrument(skip(repo, requester, patch), fields(requester_id = %requester.id))]
pub async fn update_project(
    repo: &dyn ProjectRepo,
    raw_id: &str,
    requester: &Identity,
    patch: ProjectPatch,
) -> Result<Project, AppError> {
    let mut project = load_owned(repo, raw_id, requester, OwnerAction::Edit).await?;
    patch.apply(&mut project);
    check_record(&project.title, &project.description)?;

    // Deleted between load and write.
    let updated = repo
        .update(&project)
        .await?
        .ok_or_else(|| AppError::NotFound(PROJECT_NOT_FOUND.into()))?;
    info!(project_id = %updated.id, "project updated");
    Ok(updated)
}

#[instrument(skip(repo, requester), fields(requester_id = %requester.id))]
pub async fn delete_project(
    repo: &dyn ProjectRepo,
    raw_id: &str,
    requester: &Identity,
) -> Result<(), AppError> {
    let project = load_owned(repo, raw_id, requester, OwnerAction::Delete).await?;
    if !repo.delete(project.id).await? {
        return Err(AppError::NotFound(PROJECT_NOT_FOUND.into()));
    }
    info!(project_id = %project.id, "project deleted");
    Ok(())
}
