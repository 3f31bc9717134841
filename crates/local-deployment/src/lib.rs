use std::sync::Arc;

use async_trait::async_trait;
use db::DBService;
use deployment::{Deployment, DeploymentError};
use secrecy::SecretString;
use services::services::{
    auth::{AuthService, jwt_secret_from_env},
    config::{Config, load_config_from_file, save_config_to_file},
    export::ExportService,
    notification::NotificationService,
    project::ProjectService,
    report::ReportService,
    task::TaskService,
};
use tokio::sync::RwLock;
use utils::assets::{config_path, ensure_asset_dir};

#[derive(Clone)]
pub struct LocalDeployment {
    config: Arc<RwLock<Config>>,
    db: DBService,
    auth: AuthService,
    tasks: TaskService,
    projects: ProjectService,
    notifications: NotificationService,
    reports: ReportService,
    export: ExportService,
}

#[async_trait]
impl Deployment for LocalDeployment {
    async fn new() -> Result<Self, DeploymentError> {
        let config = Self::load_runtime_config().await?;
        let db = DBService::new().await?;
        Ok(Self::from_parts(config, db, &jwt_secret_from_env()))
    }

    fn config(&self) -> &Arc<RwLock<Config>> {
        &self.config
    }

    fn db(&self) -> &DBService {
        &self.db
    }

    fn auth(&self) -> &AuthService {
        &self.auth
    }

    fn tasks(&self) -> &TaskService {
        &self.tasks
    }

    fn projects(&self) -> &ProjectService {
        &self.projects
    }

    fn notifications(&self) -> &NotificationService {
        &self.notifications
    }

    fn reports(&self) -> &ReportService {
        &self.reports
    }

    fn export(&self) -> &ExportService {
        &self.export
    }
}

impl LocalDeployment {
    /// Wires the services around an already opened database.
    pub fn from_parts(config: Config, db: DBService, jwt_secret: &SecretString) -> Self {
        Self {
            config: Arc::new(RwLock::new(config)),
            db,
            auth: AuthService::new(jwt_secret),
            tasks: TaskService::new(),
            projects: ProjectService::new(),
            notifications: NotificationService::new(),
            reports: ReportService::new(),
            export: ExportService::new(),
        }
    }

    /// Reads `config.json` and writes it back normalized, then layers the
    /// environment overrides on top. Overrides are never persisted.
    async fn load_runtime_config() -> Result<Config, DeploymentError> {
        ensure_asset_dir()?;
        let path = config_path();
        let stored = load_config_from_file(&path).await;
        save_config_to_file(&stored, &path).await?;

        let config = stored.with_env_overrides();
        tracing::info!(
            environment = %config.environment,
            seed_demo_data = config.seed_demo_data,
            "Loaded configuration"
        );
        Ok(config)
    }
}
