use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// Priorite, Status, Role and TypeModif are persisted as their integer
// discriminants. Never reorder or insert variants; existing rows would
// silently change meaning.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(i32)]
pub enum Priorite {
    Low = 0,
    Medium = 1,
    High = 2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(i32)]
pub enum Status {
    Todo = 0,
    InProgress = 1,
    Done = 2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(i32)]
pub enum Role {
    Admin = 0,
    Member = 1,
    Observer = 2,
}

/// Which field a history entry records a change to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[repr(i32)]
pub enum TypeModif {
    Titre = 0,
    Description = 1,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub nom: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub mdp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: i64,
    pub nom: String,
    pub description: String,
    pub date_debut: Option<NaiveDate>,
    pub date_fin: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: i64,
    pub nom: String,
    pub description: String,
    pub date_fin: Option<NaiveDate>,
    pub date_echeance: Option<NaiveDate>,
    pub priorite: Option<Priorite>,
    pub status: Option<Status>,
    pub project_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ProjectUser {
    pub id: i64,
    pub project_id: i64,
    pub user_id: i64,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TaskAssign {
    pub id: i64,
    pub task_id: i64,
    pub user_id: i64,
}

/// One append-only record of an old/new value pair, written whenever a
/// project or task changes its nom or description.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Historique {
    pub id: i64,
    pub user_id: i64,
    pub project_id: Option<i64>,
    pub task_id: Option<i64>,
    pub date_m: NaiveDateTime,
    pub type_m: TypeModif,
    pub old_string: Option<String>,
    pub new_string: Option<String>,
}
