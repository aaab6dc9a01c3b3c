mod memory;
mod sqlite;

pub use memory::{Fault, FaultPlan, MemoryStore};
pub use sqlite::SqliteStore;

use crate::errors::AppResult;
use crate::models::{Folder, FolderQuery, NewFolder, NewPage, Page, PageQuery};
use async_trait::async_trait;

#[async_trait]
pub trait StoreGateway: Send + Sync {
    async fn list_folders(&self, query: &FolderQuery) -> AppResult<Vec<Folder>>;

    async fn insert_folder(&self, folder: NewFolder) -> AppResult<Folder>;

    async fn delete_folder(&self, folder_id: &str) -> AppResult<bool>;

    async fn list_pages(&self, query: &PageQuery) -> AppResult<Vec<Page>>;

    async fn insert_page(&self, page: NewPage) -> AppResult<Page>;

    async fn reassign_pages(&self, from_folder_id: &str, to_folder_id: &str) -> AppResult<usize>;

    async fn delete_page(&self, page_id: &str) -> AppResult<bool>;
}
