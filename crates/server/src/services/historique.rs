use chrono::{NaiveDateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;

use crate::db::models::TypeModif;
use crate::error::Result;

/// History entry as served to clients, with the acting user embedded.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoriqueEntry {
    pub id: i64,
    pub user: ActingUser,
    pub project_id: Option<i64>,
    pub task_id: Option<i64>,
    pub date_m: NaiveDateTime,
    pub type_m: TypeModif,
    pub old_string: Option<String>,
    pub new_string: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ActingUser {
    pub id: i64,
    pub nom: String,
    pub email: String,
}

type EntryRow = (
    i64,
    Option<i64>,
    Option<i64>,
    NaiveDateTime,
    TypeModif,
    Option<String>,
    Option<String>,
    i64,
    String,
    String,
);

/// Appends one history row. Rows are immutable once written; this is the only
/// place that inserts into `historique`.
pub(crate) async fn record(
    pool: &SqlitePool,
    user_id: i64,
    project_id: Option<i64>,
    task_id: Option<i64>,
    type_m: TypeModif,
    old_string: Option<&str>,
    new_string: &str,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO historique (user_id, project_id, task_id, date_m, type_m, old_string, new_string)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(user_id)
    .bind(project_id)
    .bind(task_id)
    .bind(Utc::now().naive_utc())
    .bind(type_m)
    .bind(old_string)
    .bind(new_string)
    .execute(pool)
    .await?;
    Ok(())
}

#[derive(Clone)]
pub struct HistoriqueService {
    pool: SqlitePool,
}

impl HistoriqueService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn find_all_by_project(&self, project_id: i64) -> Result<Vec<HistoriqueEntry>> {
        let rows = sqlx::query_as::<_, EntryRow>(
            r#"
            SELECT h.id, h.project_id, h.task_id, h.date_m, h.type_m, h.old_string, h.new_string,
                   u.id, u.nom, u.email
            FROM historique h
            JOIN user_app u ON u.id = h.user_id
            WHERE h.project_id = ?
            ORDER BY h.id
            "#,
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Self::entry_from_row).collect())
    }

    pub async fn find_all_by_task(&self, task_id: i64) -> Result<Vec<HistoriqueEntry>> {
        let rows = sqlx::query_as::<_, EntryRow>(
            r#"
            SELECT h.id, h.project_id, h.task_id, h.date_m, h.type_m, h.old_string, h.new_string,
                   u.id, u.nom, u.email
            FROM historique h
            JOIN user_app u ON u.id = h.user_id
            WHERE h.task_id = ?
            ORDER BY h.id
            "#,
        )
        .bind(task_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Self::entry_from_row).collect())
    }

    fn entry_from_row(row: EntryRow) -> HistoriqueEntry {
        let (id, project_id, task_id, date_m, type_m, old_string, new_string, user_id, nom, email) =
            row;
        HistoriqueEntry {
            id,
            user: ActingUser {
                id: user_id,
                nom,
                email,
            },
            project_id,
            task_id,
            date_m,
            type_m,
            old_string,
            new_string,
        }
    }
}
