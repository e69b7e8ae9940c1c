use std::env;

#[derive(Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub mail_from: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:./data/chantier.db?mode=rwc".to_string()),
            mail_from: env::var("MAIL_FROM")
                .unwrap_or_else(|_| "noreply@chantier.local".to_string()),
        }
    }
}
