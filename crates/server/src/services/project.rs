use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::db::models::{Project, Task, TypeModif};
use crate::error::{AppError, Result};
use crate::services::historique;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProject {
    pub nom: Option<String>,
    pub description: Option<String>,
    pub date_debut: Option<NaiveDate>,
    pub date_fin: Option<NaiveDate>,
}

/// Update envelope: the fields to apply plus the id of the user making the
/// change, who gets credited in the history log.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectUpdate {
    pub project: ProjectPatch,
    pub user_id: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPatch {
    pub id: Option<i64>,
    pub nom: Option<String>,
    pub description: Option<String>,
    pub date_debut: Option<NaiveDate>,
    pub date_fin: Option<NaiveDate>,
}

/// Project as served to clients, tasks embedded.
#[derive(Debug, Serialize)]
pub struct ProjectWithTasks {
    #[serde(flatten)]
    pub project: Project,
    pub tasks: Vec<Task>,
}

#[derive(Clone)]
pub struct ProjectService {
    pool: SqlitePool,
}

impl ProjectService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn find_all(&self) -> Result<Vec<ProjectWithTasks>> {
        let projects = sqlx::query_as::<_, Project>(
            "SELECT id, nom, description, date_debut, date_fin FROM project ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut out = Vec::with_capacity(projects.len());
        for project in projects {
            let tasks = self.tasks_of(project.id).await?;
            out.push(ProjectWithTasks { project, tasks });
        }
        Ok(out)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<ProjectWithTasks> {
        let project = self.load(id).await?;
        let tasks = self.tasks_of(id).await?;
        Ok(ProjectWithTasks { project, tasks })
    }

    pub async fn create(&self, req: CreateProject) -> Result<Project> {
        let nom = req
            .nom
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| AppError::Validation("Le projet doit avoir un nom".to_string()))?;
        let description = req
            .description
            .filter(|d| !d.trim().is_empty())
            .ok_or_else(|| AppError::Validation("Le projet doit avoir une description".to_string()))?;

        let id = sqlx::query(
            "INSERT INTO project (nom, description, date_debut, date_fin) VALUES (?, ?, ?, ?)",
        )
        .bind(&nom)
        .bind(&description)
        .bind(req.date_debut)
        .bind(req.date_fin)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        Ok(Project {
            id,
            nom,
            description,
            date_debut: req.date_debut,
            date_fin: req.date_fin,
        })
    }

    /// Applies an update, logging one history row for each of nom and
    /// description that actually changes. Dates are overwritten without
    /// logging when present.
    pub async fn update(&self, req: ProjectUpdate) -> Result<Project> {
        let id = req.project.id.ok_or_else(|| {
            AppError::Validation("L'ID du projet est requis pour la mise à jour.".to_string())
        })?;

        let mut existing = sqlx::query_as::<_, Project>(
            "SELECT id, nom, description, date_debut, date_fin FROM project WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::Validation(format!("Le projet avec l'ID {id} n'existe pas.")))?;

        // The acting user must exist before anything is written.
        let user_id = sqlx::query_scalar::<_, i64>("SELECT id FROM user_app WHERE id = ?")
            .bind(req.user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| {
                AppError::Validation(format!("Utilisateur non trouvé avec l'ID: {}", req.user_id))
            })?;

        if let Some(nom) = req.project.nom.as_deref() {
            if !nom.trim().is_empty() && nom != existing.nom {
                historique::record(
                    &self.pool,
                    user_id,
                    Some(id),
                    None,
                    TypeModif::Titre,
                    Some(&existing.nom),
                    nom,
                )
                .await?;
                existing.nom = nom.to_string();
            }
        }

        if let Some(description) = req.project.description.as_deref() {
            if description != existing.description {
                historique::record(
                    &self.pool,
                    user_id,
                    Some(id),
                    None,
                    TypeModif::Description,
                    Some(&existing.description),
                    description,
                )
                .await?;
                existing.description = description.to_string();
            }
        }

        if let Some(date_debut) = req.project.date_debut {
            existing.date_debut = Some(date_debut);
        }
        if let Some(date_fin) = req.project.date_fin {
            existing.date_fin = Some(date_fin);
        }

        sqlx::query(
            "UPDATE project SET nom = ?, description = ?, date_debut = ?, date_fin = ? WHERE id = ?",
        )
        .bind(&existing.nom)
        .bind(&existing.description)
        .bind(existing.date_debut)
        .bind(existing.date_fin)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(existing)
    }

    /// Cascade delete in dependency order: task assignments, tasks,
    /// memberships, then the project, all in one transaction.
    pub async fn delete(&self, id: i64) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "DELETE FROM task_assign WHERE task_id IN (SELECT id FROM task WHERE project_id = ?)",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;
        sqlx::query("DELETE FROM task WHERE project_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM project_user WHERE project_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM project WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn load(&self, id: i64) -> Result<Project> {
        sqlx::query_as::<_, Project>(
            "SELECT id, nom, description, date_debut, date_fin FROM project WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::Validation(format!("Projet non trouvé avec l'ID: {id}")))
    }

    async fn tasks_of(&self, project_id: i64) -> Result<Vec<Task>> {
        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, nom, description, date_fin, date_echeance, priorite, status, project_id
            FROM task WHERE project_id = ? ORDER BY id
            "#,
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(tasks)
    }
}
