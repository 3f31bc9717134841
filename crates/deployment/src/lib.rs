use std::sync::Arc;

use async_trait::async_trait;
use db::{DBService, DbErr};
use services::services::{
    auth::AuthService,
    config::{Config, ConfigError},
    export::ExportService,
    notification::NotificationService,
    project::ProjectService,
    report::ReportService,
    seed::{SeedError, SeedSummary, seed_if_empty},
    task::TaskService,
};
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Debug, Error)]
pub enum DeploymentError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Seed(#[from] SeedError),
}

/// Everything an HTTP handler needs, behind one cloneable handle.
#[async_trait]
pub trait Deployment: Clone + Send + Sync + 'static {
    async fn new() -> Result<Self, DeploymentError>;

    fn config(&self) -> &Arc<RwLock<Config>>;

    fn db(&self) -> &DBService;

    fn auth(&self) -> &AuthService;

    fn tasks(&self) -> &TaskService;

    fn projects(&self) -> &ProjectService;

    fn notifications(&self) -> &NotificationService;

    fn reports(&self) -> &ReportService;

    fn export(&self) -> &ExportService;

    /// Seeds demo data when the config allows it and the tables are empty.
    async fn seed_demo_data(&self) -> Result<SeedSummary, DeploymentError> {
        if !self.config().read().await.seed_demo_data {
            tracing::debug!("Demo data seeding disabled");
            return Ok(SeedSummary::default());
        }
        Ok(seed_if_empty(&self.db().pool).await?)
    }
}
