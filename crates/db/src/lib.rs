use db_migration::Migrator;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use utils::assets::{database_path, ensure_asset_dir};

pub mod entities;
pub mod models;
pub mod types;

pub use sea_orm::{ConnectionTrait, DbErr, TransactionTrait};

pub type DbPool = DatabaseConnection;

const DATABASE_URL_ENV: &str = "DATABASE_URL";

#[derive(Clone)]
pub struct DBService {
    pub pool: DbPool,
}

impl DBService {
    /// Connects to `DATABASE_URL`, or the SQLite file in the asset directory,
    /// and brings the schema up to date.
    pub async fn new() -> Result<DBService, DbErr> {
        Self::connect(&database_url()?).await
    }

    pub async fn connect(database_url: &str) -> Result<DBService, DbErr> {
        let mut options = ConnectOptions::new(database_url.to_string());
        options.sqlx_logging(false);

        let pool = Database::connect(options).await?;
        Migrator::up(&pool, None).await?;
        tracing::debug!(backend = ?pool.get_database_backend(), "Database ready");
        Ok(DBService { pool })
    }
}

fn database_url() -> Result<String, DbErr> {
    if let Ok(url) = std::env::var(DATABASE_URL_ENV)
        && !url.trim().is_empty()
    {
        return Ok(url.trim().to_string());
    }

    ensure_asset_dir().map_err(|err| DbErr::Custom(format!("asset directory: {err}")))?;
    Ok(format!(
        "sqlite://{}?mode=rwc",
        database_path().to_string_lossy()
    ))
}
