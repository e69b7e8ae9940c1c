use serde::Serialize;
use sqlx::SqlitePool;

use crate::db::models::{Task, TaskAssign, User};
use crate::error::{AppError, Result};
use crate::services::mailer::DynMailer;

/// Assignment as served to clients, with the assignee's name joined in.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Assigned {
    pub id: i64,
    pub user_id: i64,
    pub task_id: i64,
    pub username: String,
}

#[derive(Clone)]
pub struct TaskAssignService {
    pool: SqlitePool,
    mailer: DynMailer,
}

impl TaskAssignService {
    pub fn new(pool: SqlitePool, mailer: DynMailer) -> Self {
        Self { pool, mailer }
    }

    /// Persists the assignment and sends a best-effort notification to the
    /// assignee. A failed send is logged, never propagated.
    pub async fn create(&self, task_id: i64, user_id: i64) -> Result<TaskAssign> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, nom, description, date_fin, date_echeance, priorite, status, project_id
            FROM task WHERE id = ?
            "#,
        )
        .bind(task_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::Validation(format!("Tâche non trouvé avec l'ID: {task_id}")))?;

        let user = sqlx::query_as::<_, User>("SELECT id, nom, email, mdp FROM user_app WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::Validation(format!("Utilisateur non trouvé avec l'ID: {user_id}")))?;

        let id = sqlx::query("INSERT INTO task_assign (task_id, user_id) VALUES (?, ?)")
            .bind(task_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?
            .last_insert_rowid();

        let subject = format!("Nouvelle tâche assignée: {}", task.nom);
        let body = format!(
            "Bonjour {},\n\nLa tâche \"{}\" vous a été assignée.",
            user.nom, task.nom
        );
        if let Err(err) = self.mailer.send(&user.email, &subject, &body) {
            tracing::warn!(to = %user.email, "échec de l'envoi de la notification: {err}");
        }

        Ok(TaskAssign { id, task_id, user_id })
    }

    pub async fn users_by_task_id(&self, task_id: i64) -> Result<Vec<Assigned>> {
        let assigned = sqlx::query_as::<_, (i64, i64, i64, String)>(
            r#"
            SELECT ta.id, ta.user_id, ta.task_id, u.nom
            FROM task_assign ta
            JOIN user_app u ON u.id = ta.user_id
            WHERE ta.task_id = ?
            ORDER BY ta.id
            "#,
        )
        .bind(task_id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(|(id, user_id, task_id, username)| Assigned {
            id,
            user_id,
            task_id,
            username,
        })
        .collect();
        Ok(assigned)
    }

    pub async fn delete_by_id(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM task_assign WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn delete_by_task_id(&self, task_id: i64) -> Result<()> {
        sqlx::query("DELETE FROM task_assign WHERE task_id = ?")
            .bind(task_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
