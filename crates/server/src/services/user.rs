use serde::Deserialize;
use sqlx::SqlitePool;

use crate::db::models::User;
use crate::error::{AppError, Result};

/// Registration payload. Every field is optional on the wire; the service
/// decides which absences are errors.
#[derive(Debug, Deserialize)]
pub struct RegisterUser {
    pub nom: Option<String>,
    pub email: Option<String>,
    pub mdp: Option<String>,
}

#[derive(Clone)]
pub struct UserService {
    pool: SqlitePool,
}

impl UserService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn find_all(&self) -> Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>("SELECT id, nom, email, mdp FROM user_app ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<User> {
        sqlx::query_as::<_, User>("SELECT id, nom, email, mdp FROM user_app WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::Validation(format!("Utilisateur non trouvé avec l'ID: {id}")))
    }

    pub async fn create(&self, user: RegisterUser) -> Result<User> {
        let email = user
            .email
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| AppError::Validation("L'email est obligatoire.".to_string()))?;
        let nom = user
            .nom
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| AppError::Validation("Le nom d'utilisateur est obligatoire.".to_string()))?;
        let mdp = user
            .mdp
            .filter(|m| !m.trim().is_empty())
            .ok_or_else(|| AppError::Validation("Le mot de passe est obligatoire.".to_string()))?;

        if mdp.len() < 4 {
            return Err(AppError::Validation(
                "Le mot de passe doit contenir au moins 4 caractères.".to_string(),
            ));
        }

        let existing = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM user_app WHERE email = ?")
            .bind(&email)
            .fetch_one(&self.pool)
            .await?;
        if existing > 0 {
            return Err(AppError::Validation("Cet email est déjà utilisé.".to_string()));
        }

        let id = sqlx::query("INSERT INTO user_app (nom, email, mdp) VALUES (?, ?, ?)")
            .bind(&nom)
            .bind(&email)
            .bind(&mdp)
            .execute(&self.pool)
            .await?
            .last_insert_rowid();

        Ok(User { id, nom, email, mdp })
    }

    pub async fn login(&self, email: &str, mdp: &str) -> Result<User> {
        let user = sqlx::query_as::<_, User>("SELECT id, nom, email, mdp FROM user_app WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::Auth("Utilisateur non trouvé avec cet email.".to_string()))?;

        // Plain string comparison against the stored value. Passwords are
        // kept unhashed; a pre-existing defect carried over deliberately
        // rather than silently fixed (see DESIGN.md).
        if user.mdp != mdp {
            return Err(AppError::Auth("Mot de passe incorrect.".to_string()));
        }

        Ok(user)
    }

    /// Users joined through the project_user membership table.
    pub async fn find_by_project_id(&self, project_id: i64) -> Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT u.id, u.nom, u.email, u.mdp
            FROM user_app u
            JOIN project_user pu ON pu.user_id = u.id
            WHERE pu.project_id = ?
            ORDER BY u.id
            "#,
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }
}
