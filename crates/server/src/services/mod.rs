pub mod historique;
pub mod mailer;
pub mod project;
pub mod project_user;
pub mod task;
pub mod task_assign;
pub mod user;
