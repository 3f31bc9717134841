pub mod auth;
pub mod config;
pub mod export;
pub mod notification;
pub mod project;
pub mod report;
pub mod seed;
pub mod task;
