use chrono::NaiveDate;
use serde::Deserialize;
use sqlx::SqlitePool;

use crate::db::models::{Priorite, Status, Task, TypeModif};
use crate::error::{AppError, Result};
use crate::services::historique;

/// Wire payload for task creation and update. `user_id` identifies the acting
/// user on updates, for the history log.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPayload {
    pub id: Option<i64>,
    pub nom: Option<String>,
    pub description: Option<String>,
    pub date_fin: Option<NaiveDate>,
    pub date_echeance: Option<NaiveDate>,
    pub priorite: Option<Priorite>,
    pub status: Option<Status>,
    pub project_id: Option<i64>,
    pub user_id: Option<i64>,
}

#[derive(Clone)]
pub struct TaskService {
    pool: SqlitePool,
}

impl TaskService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn find_all(&self) -> Result<Vec<Task>> {
        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, nom, description, date_fin, date_echeance, priorite, status, project_id
            FROM task ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(tasks)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Task> {
        sqlx::query_as::<_, Task>(
            r#"
            SELECT id, nom, description, date_fin, date_echeance, priorite, status, project_id
            FROM task WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::Validation(format!("Tâche non trouvé avec l'ID: {id}")))
    }

    pub async fn create(&self, payload: TaskPayload) -> Result<Task> {
        let nom = payload
            .nom
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| AppError::Validation("Le nom de la tâche est obligatoire.".to_string()))?;
        let description = payload.description.filter(|d| !d.trim().is_empty()).ok_or_else(|| {
            AppError::Validation("La description de la tâche est obligatoire.".to_string())
        })?;
        let project_id = payload.project_id.ok_or_else(|| {
            AppError::Validation("La tâche doit être associée à un projet.".to_string())
        })?;

        let exists = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM project WHERE id = ?")
            .bind(project_id)
            .fetch_one(&self.pool)
            .await?;
        if exists == 0 {
            return Err(AppError::Validation("Le projet spécifié n'existe pas.".to_string()));
        }

        let id = sqlx::query(
            r#"
            INSERT INTO task (nom, description, date_fin, date_echeance, priorite, status, project_id)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&nom)
        .bind(&description)
        .bind(payload.date_fin)
        .bind(payload.date_echeance)
        .bind(payload.priorite)
        .bind(payload.status)
        .bind(project_id)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        Ok(Task {
            id,
            nom,
            description,
            date_fin: payload.date_fin,
            date_echeance: payload.date_echeance,
            priorite: payload.priorite,
            status: payload.status,
            project_id,
        })
    }

    /// Same diff-and-log pattern as project updates for nom/description;
    /// dates, priority, status and project reassignment are applied
    /// unconditionally when present.
    pub async fn update(&self, payload: TaskPayload) -> Result<Task> {
        let id = payload.id.ok_or_else(|| {
            AppError::Validation("L'ID de la tâche est requis pour la mise à jour.".to_string())
        })?;
        let nom = payload
            .nom
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| AppError::Validation("Le nom de la tâche est obligatoire.".to_string()))?;
        let description = payload.description.filter(|d| !d.trim().is_empty()).ok_or_else(|| {
            AppError::Validation("La description de la tâche est obligatoire.".to_string())
        })?;

        let mut existing = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, nom, description, date_fin, date_echeance, priorite, status, project_id
            FROM task WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::Validation(format!("La tâche avec l'ID {id} n'existe pas.")))?;

        let user_id = match payload.user_id {
            Some(user_id) => sqlx::query_scalar::<_, i64>("SELECT id FROM user_app WHERE id = ?")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?
                .ok_or_else(|| {
                    AppError::Validation(format!("Utilisateur non trouvé avec l'ID: {user_id}"))
                })?,
            None => {
                return Err(AppError::Validation(
                    "L'utilisateur effectuant la modification est requis.".to_string(),
                ))
            }
        };

        if nom != existing.nom {
            historique::record(
                &self.pool,
                user_id,
                None,
                Some(id),
                TypeModif::Titre,
                Some(&existing.nom),
                &nom,
            )
            .await?;
            existing.nom = nom;
        }

        if description != existing.description {
            historique::record(
                &self.pool,
                user_id,
                None,
                Some(id),
                TypeModif::Description,
                Some(&existing.description),
                &description,
            )
            .await?;
            existing.description = description;
        }

        if let Some(date_fin) = payload.date_fin {
            existing.date_fin = Some(date_fin);
        }
        if let Some(date_echeance) = payload.date_echeance {
            existing.date_echeance = Some(date_echeance);
        }
        if let Some(priorite) = payload.priorite {
            existing.priorite = Some(priorite);
        }
        if let Some(status) = payload.status {
            existing.status = Some(status);
        }

        if let Some(project_id) = payload.project_id {
            let exists = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM project WHERE id = ?")
                .bind(project_id)
                .fetch_one(&self.pool)
                .await?;
            if exists == 0 {
                return Err(AppError::Validation(
                    "Le projet spécifié pour la mise à jour n'existe pas.".to_string(),
                ));
            }
            existing.project_id = project_id;
        }

        sqlx::query(
            r#"
            UPDATE task
            SET nom = ?, description = ?, date_fin = ?, date_echeance = ?, priorite = ?, status = ?, project_id = ?
            WHERE id = ?
            "#,
        )
        .bind(&existing.nom)
        .bind(&existing.description)
        .bind(existing.date_fin)
        .bind(existing.date_echeance)
        .bind(existing.priorite)
        .bind(existing.status)
        .bind(existing.project_id)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(existing)
    }

    /// Assignments go first, then the task itself.
    pub async fn delete_by_id(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM task_assign WHERE task_id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        sqlx::query("DELETE FROM task WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    fn payload(nom: &str, description: &str, project_id: Option<i64>) -> TaskPayload {
        TaskPayload {
            id: None,
            nom: Some(nom.to_string()),
            description: Some(description.to_string()),
            date_fin: None,
            date_echeance: None,
            priorite: None,
            status: None,
            project_id,
            user_id: None,
        }
    }

    async fn seed(pool: &SqlitePool) -> (i64, i64) {
        let user_id = sqlx::query("INSERT INTO user_app (nom, email, mdp) VALUES ('Alice', 'a@x', 'pass')")
            .execute(pool)
            .await
            .unwrap()
            .last_insert_rowid();
        let project_id = sqlx::query("INSERT INTO project (nom, description) VALUES ('P', 'd')")
            .execute(pool)
            .await
            .unwrap()
            .last_insert_rowid();
        (user_id, project_id)
    }

    #[tokio::test]
    async fn create_requires_an_existing_project() {
        let pool = test_pool().await;
        let service = TaskService::new(pool.clone());

        let err = service.create(payload("T1", "d", None)).await.unwrap_err();
        match err {
            AppError::Validation(msg) => {
                assert_eq!(msg, "La tâche doit être associée à un projet.")
            }
            other => panic!("expected validation error, got {other:?}"),
        }

        let err = service.create(payload("T1", "d", Some(42))).await.unwrap_err();
        match err {
            AppError::Validation(msg) => assert_eq!(msg, "Le projet spécifié n'existe pas."),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn create_attaches_task_to_its_project() {
        let pool = test_pool().await;
        let service = TaskService::new(pool.clone());
        let (_, project_id) = seed(&pool).await;

        let task = service.create(payload("T1", "d", Some(project_id))).await.unwrap();
        assert_eq!(task.project_id, project_id);

        let reloaded = service.find_by_id(task.id).await.unwrap();
        assert_eq!(reloaded.nom, "T1");
        assert_eq!(reloaded.project_id, project_id);
    }

    #[tokio::test]
    async fn update_logs_changed_fields_and_applies_the_rest() {
        let pool = test_pool().await;
        let service = TaskService::new(pool.clone());
        let (user_id, project_id) = seed(&pool).await;

        let task = service.create(payload("Avant", "Desc", Some(project_id))).await.unwrap();

        let updated = service
            .update(TaskPayload {
                id: Some(task.id),
                nom: Some("Après".to_string()),
                description: Some("Desc".to_string()),
                date_fin: None,
                date_echeance: None,
                priorite: Some(Priorite::High),
                status: Some(Status::InProgress),
                project_id: Some(project_id),
                user_id: Some(user_id),
            })
            .await
            .unwrap();

        assert_eq!(updated.nom, "Après");
        assert_eq!(updated.priorite, Some(Priorite::High));
        assert_eq!(updated.status, Some(Status::InProgress));

        // Only the nom changed; one history row, with old/new captured.
        let rows: Vec<(i32, Option<String>, Option<String>)> = sqlx::query_as(
            "SELECT type_m, old_string, new_string FROM historique WHERE task_id = ?",
        )
        .bind(task.id)
        .fetch_all(&pool)
        .await
        .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0], (0, Some("Avant".to_string()), Some("Après".to_string())));
    }

    #[tokio::test]
    async fn update_rejects_reassignment_to_missing_project() {
        let pool = test_pool().await;
        let service = TaskService::new(pool.clone());
        let (user_id, project_id) = seed(&pool).await;

        let task = service.create(payload("T", "d", Some(project_id))).await.unwrap();

        let err = service
            .update(TaskPayload {
                id: Some(task.id),
                nom: Some("T".to_string()),
                description: Some("d".to_string()),
                date_fin: None,
                date_echeance: None,
                priorite: None,
                status: None,
                project_id: Some(404),
                user_id: Some(user_id),
            })
            .await
            .unwrap_err();
        match err {
            AppError::Validation(msg) => {
                assert_eq!(msg, "Le projet spécifié pour la mise à jour n'existe pas.")
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn delete_removes_assignments_first() {
        let pool = test_pool().await;
        let service = TaskService::new(pool.clone());
        let (user_id, project_id) = seed(&pool).await;

        let task = service.create(payload("T", "d", Some(project_id))).await.unwrap();
        sqlx::query("INSERT INTO task_assign (task_id, user_id) VALUES (?, ?)")
            .bind(task.id)
            .bind(user_id)
            .execute(&pool)
            .await
            .unwrap();

        service.delete_by_id(task.id).await.unwrap();

        let assigns: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM task_assign WHERE task_id = ?")
            .bind(task.id)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(assigns, 0);
        assert!(service.find_by_id(task.id).await.is_err());
    }
}
