mod categories;
mod config;
mod coordinator;
mod db;
mod errors;
mod folders;
mod inflight;
mod models;
mod pages;
mod reconcile;
mod service;
mod store;

pub use crate::categories::{
    all as category_table, category_name, for_entity as category_for_entity, style_for_name, CategorySpec,
    FolderStyle, FALLBACK_STYLE,
};
pub use crate::config::ServiceConfig;
pub use crate::coordinator::ResolutionCoordinator;
pub use crate::db::Database;
pub use crate::errors::{AppError, AppResult};
pub use crate::folders::{merge_duplicate_folders, FolderProvisioner};
pub use crate::inflight::InflightMap;
pub use crate::models::{
    EntityRef, Folder, FolderKey, FolderQuery, LinkedEntityType, NewFolder, NewPage, Page, PageQuery,
    ResolutionKey,
};
pub use crate::pages::{remove_duplicate_pages, PageResolver};
pub use crate::reconcile::CleanupReport;
pub use crate::service::LinkedPageService;
pub use crate::store::{Fault, FaultPlan, MemoryStore, SqliteStore, StoreGateway};

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;

static LOG_GUARD: std::sync::OnceLock<WorkerGuard> = std::sync::OnceLock::new();

pub fn init_tracing(log_dir: &Path, default_filter: &str) -> AppResult<()> {
    std::fs::create_dir_all(log_dir)?;
    let file_appender = tracing_appender::rolling::daily(log_dir, "entity-pages.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let _ = LOG_GUARD.set(guard);

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .json()
        .with_writer(non_blocking)
        .try_init()
        .map_err(|error| AppError::Internal(error.to_string()))
}

pub fn open_service(config: &ServiceConfig) -> AppResult<LinkedPageService> {
    if let Some(log_dir) = &config.log_dir {
        init_tracing(log_dir, &config.log_filter)?;
    }
    LinkedPageService::open(config)
}
