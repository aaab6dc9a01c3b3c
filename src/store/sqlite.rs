use super::StoreGateway;
use crate::db::Database;
use crate::errors::AppResult;
use crate::models::{Folder, FolderQuery, NewFolder, NewPage, Page, PageQuery};
use async_trait::async_trait;
use chrono::Utc;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct SqliteStore {
    db: Arc<Database>,
}

impl SqliteStore {
    pub fn open(path: &Path) -> AppResult<Self> {
        Ok(Self::from_database(Database::new(path)?))
    }

    pub fn in_memory() -> AppResult<Self> {
        Ok(Self::from_database(Database::in_memory()?))
    }

    pub fn from_database(db: Database) -> Self {
        Self { db: Arc::new(db) }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    async fn blocking<T, F>(&self, call: F) -> AppResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Database) -> AppResult<T> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || call(&db)).await?
    }
}

#[async_trait]
impl StoreGateway for SqliteStore {
    async fn list_folders(&self, query: &FolderQuery) -> AppResult<Vec<Folder>> {
        let query = query.clone();
        self.blocking(move |db| db.list_folders(&query)).await
    }

    async fn insert_folder(&self, folder: NewFolder) -> AppResult<Folder> {
        self.blocking(move |db| db.insert_folder(&folder, Utc::now())).await
    }

    async fn delete_folder(&self, folder_id: &str) -> AppResult<bool> {
        let folder_id = folder_id.to_string();
        self.blocking(move |db| db.delete_folder(&folder_id)).await
    }

    async fn list_pages(&self, query: &PageQuery) -> AppResult<Vec<Page>> {
        let query = query.clone();
        self.blocking(move |db| db.list_pages(&query)).await
    }

    async fn insert_page(&self, page: NewPage) -> AppResult<Page> {
        self.blocking(move |db| db.insert_page(&page, Utc::now())).await
    }

    async fn reassign_pages(&self, from_folder_id: &str, to_folder_id: &str) -> AppResult<usize> {
        let from_folder_id = from_folder_id.to_string();
        let to_folder_id = to_folder_id.to_string();
        self.blocking(move |db| db.reassign_pages(&from_folder_id, &to_folder_id))
            .await
    }

    async fn delete_page(&self, page_id: &str) -> AppResult<bool> {
        let page_id = page_id.to_string();
        self.blocking(move |db| db.delete_page(&page_id)).await
    }
}
