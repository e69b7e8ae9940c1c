use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::db::models::{Project, ProjectUser, Role};
use crate::error::{AppError, Result};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddUsersProject {
    pub project_id: Option<i64>,
    pub users: Vec<UserRole>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRole {
    pub user_id: i64,
    pub role: Role,
}

/// Membership listing for one project: flat (membership id, user id, role)
/// triples.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsersProject {
    pub project_id: i64,
    pub users: Vec<MemberEntry>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberEntry {
    pub id: i64,
    pub user_id: i64,
    pub role: Role,
}

#[derive(Clone)]
pub struct ProjectUserService {
    pool: SqlitePool,
}

impl ProjectUserService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn projects_by_user_id(&self, user_id: i64) -> Result<Vec<Project>> {
        let projects = sqlx::query_as::<_, Project>(
            r#"
            SELECT p.id, p.nom, p.description, p.date_debut, p.date_fin
            FROM project p
            JOIN project_user pu ON pu.project_id = p.id
            WHERE pu.user_id = ?
            ORDER BY p.id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(projects)
    }

    /// Adds the given users to a project. Existing memberships are skipped
    /// with a log line rather than rejected.
    pub async fn add_users_to_project(&self, req: AddUsersProject) -> Result<Vec<ProjectUser>> {
        let project_id = req
            .project_id
            .ok_or_else(|| AppError::Validation("L'ID du projet est requis.".to_string()))?;

        let project_exists = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM project WHERE id = ?")
            .bind(project_id)
            .fetch_one(&self.pool)
            .await?;
        if project_exists == 0 {
            return Err(AppError::Validation(format!(
                "Project not found with ID: {project_id}"
            )));
        }

        let mut added = Vec::new();
        for entry in req.users {
            let user_exists = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM user_app WHERE id = ?")
                .bind(entry.user_id)
                .fetch_one(&self.pool)
                .await?;
            if user_exists == 0 {
                return Err(AppError::Validation(format!(
                    "User not found with ID: {}",
                    entry.user_id
                )));
            }

            let already_member = sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM project_user WHERE project_id = ? AND user_id = ?",
            )
            .bind(project_id)
            .bind(entry.user_id)
            .fetch_one(&self.pool)
            .await?;
            if already_member > 0 {
                tracing::info!(
                    user_id = entry.user_id,
                    project_id,
                    "user is already part of project, skipping"
                );
                continue;
            }

            let id = sqlx::query("INSERT INTO project_user (project_id, user_id, role) VALUES (?, ?, ?)")
                .bind(project_id)
                .bind(entry.user_id)
                .bind(entry.role)
                .execute(&self.pool)
                .await?
                .last_insert_rowid();

            added.push(ProjectUser {
                id,
                project_id,
                user_id: entry.user_id,
                role: entry.role,
            });
        }

        Ok(added)
    }

    pub async fn users_by_project_id(&self, project_id: i64) -> Result<UsersProject> {
        let users = sqlx::query_as::<_, (i64, i64, Role)>(
            "SELECT id, user_id, role FROM project_user WHERE project_id = ? ORDER BY id",
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(|(id, user_id, role)| MemberEntry { id, user_id, role })
        .collect();

        Ok(UsersProject { project_id, users })
    }

    pub async fn delete_by_id(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM project_user WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
