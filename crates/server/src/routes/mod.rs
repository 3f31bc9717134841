pub mod auth;
pub mod export;
pub mod health;
pub mod history;
pub mod notifications;
pub mod projects;
pub mod reports;
pub mod tasks;
pub mod users;
