use super::StoreGateway;
use crate::errors::{AppError, AppResult};
use crate::models::{Folder, FolderQuery, NewFolder, NewPage, Page, PageQuery};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use tokio::time::Duration;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fault {
    Reads,
    FolderInserts,
    PageInserts,
    Reassign,
    FolderDeletes,
    PageDeletes,
}

#[derive(Debug, Default)]
pub struct FaultPlan {
    active: Mutex<HashSet<Fault>>,
}

impl FaultPlan {
    pub fn enable(&self, fault: Fault) {
        self.lock().insert(fault);
    }

    pub fn disable(&self, fault: Fault) {
        self.lock().remove(&fault);
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn check(&self, fault: Fault) -> AppResult<()> {
        if self.lock().contains(&fault) {
            return Err(AppError::Store(format!("injected {:?} failure", fault)));
        }
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<Fault>> {
        self.active.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[derive(Default)]
struct MemoryState {
    folders: Vec<(u64, Folder)>,
    pages: Vec<(u64, Page)>,
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
    next_seq: AtomicU64,
    folder_inserts: AtomicUsize,
    page_inserts: AtomicUsize,
    latency: Option<Duration>,
    faults: FaultPlan,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency: Some(latency),
            ..Self::default()
        }
    }

    pub fn faults(&self) -> &FaultPlan {
        &self.faults
    }

    pub fn folders(&self) -> Vec<Folder> {
        let state = self.lock();
        sorted(&state.folders)
    }

    pub fn pages(&self) -> Vec<Page> {
        let state = self.lock();
        sorted(&state.pages)
    }

    pub fn folder_inserts(&self) -> usize {
        self.folder_inserts.load(Ordering::SeqCst)
    }

    pub fn page_inserts(&self) -> usize {
        self.page_inserts.load(Ordering::SeqCst)
    }

    pub fn seed_folder(&self, folder: Folder) {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        self.lock().folders.push((seq, folder));
    }

    pub fn seed_page(&self, page: Page) {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        self.lock().pages.push((seq, page));
    }

    async fn suspend(&self) {
        match self.latency {
            Some(latency) => tokio::time::sleep(latency).await,
            None => tokio::task::yield_now().await,
        }
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl StoreGateway for MemoryStore {
    async fn list_folders(&self, query: &FolderQuery) -> AppResult<Vec<Folder>> {
        self.suspend().await;
        self.faults.check(Fault::Reads)?;
        let state = self.lock();
        Ok(sorted(&state.folders)
            .into_iter()
            .filter(|folder| folder.team_id == query.team_id && folder.season_id == query.season_id)
            .filter(|folder| query.name.as_ref().map_or(true, |name| &folder.name == name))
            .filter(|folder| !query.root_only || folder.parent_folder_id.is_none())
            .collect())
    }

    async fn insert_folder(&self, folder: NewFolder) -> AppResult<Folder> {
        self.suspend().await;
        self.faults.check(Fault::FolderInserts)?;
        let record = Folder {
            id: Uuid::new_v4().to_string(),
            team_id: folder.team_id,
            season_id: folder.season_id,
            name: folder.name,
            parent_folder_id: folder.parent_folder_id,
            color: folder.color,
            sort_order: folder.sort_order,
            created_by: folder.created_by,
            created_at: Utc::now(),
        };
        self.folder_inserts.fetch_add(1, Ordering::SeqCst);
        self.seed_folder(record.clone());
        Ok(record)
    }

    async fn delete_folder(&self, folder_id: &str) -> AppResult<bool> {
        self.suspend().await;
        self.faults.check(Fault::FolderDeletes)?;
        let mut state = self.lock();
        let before = state.folders.len();
        state.folders.retain(|(_, folder)| folder.id != folder_id);
        Ok(state.folders.len() < before)
    }

    async fn list_pages(&self, query: &PageQuery) -> AppResult<Vec<Page>> {
        self.suspend().await;
        self.faults.check(Fault::Reads)?;
        let state = self.lock();
        Ok(sorted(&state.pages)
            .into_iter()
            .filter(|page| page.team_id == query.team_id && page.season_id == query.season_id)
            .filter(|page| {
                query
                    .folder_id
                    .as_ref()
                    .map_or(true, |folder_id| page.folder_id.as_ref() == Some(folder_id))
            })
            .filter(|page| {
                query.linked_entity.as_ref().map_or(true, |linked| {
                    page.linked_entity_type == Some(linked.entity_type)
                        && page.linked_entity_id.as_ref() == Some(&linked.entity_id)
                })
            })
            .collect())
    }

    async fn insert_page(&self, page: NewPage) -> AppResult<Page> {
        self.suspend().await;
        self.faults.check(Fault::PageInserts)?;
        let now = Utc::now();
        let (linked_entity_type, linked_entity_id) = match page.linked_entity {
            Some(linked) => (Some(linked.entity_type), Some(linked.entity_id)),
            None => (None, None),
        };
        let record = Page {
            id: Uuid::new_v4().to_string(),
            team_id: page.team_id,
            season_id: page.season_id,
            folder_id: page.folder_id,
            title: page.title,
            linked_entity_type,
            linked_entity_id,
            created_by: page.created_by.clone(),
            updated_by: page.created_by,
            created_at: now,
            updated_at: now,
        };
        self.page_inserts.fetch_add(1, Ordering::SeqCst);
        self.seed_page(record.clone());
        Ok(record)
    }

    async fn reassign_pages(&self, from_folder_id: &str, to_folder_id: &str) -> AppResult<usize> {
        self.suspend().await;
        self.faults.check(Fault::Reassign)?;
        let now = Utc::now();
        let mut state = self.lock();
        let mut moved = 0;
        for (_, page) in state.pages.iter_mut() {
            if page.folder_id.as_deref() == Some(from_folder_id) {
                page.folder_id = Some(to_folder_id.to_string());
                page.updated_at = now;
                moved += 1;
            }
        }
        Ok(moved)
    }

    async fn delete_page(&self, page_id: &str) -> AppResult<bool> {
        self.suspend().await;
        self.faults.check(Fault::PageDeletes)?;
        let mut state = self.lock();
        let before = state.pages.len();
        state.pages.retain(|(_, page)| page.id != page_id);
        Ok(state.pages.len() < before)
    }
}

fn sorted<T: Clone + crate::reconcile::Stored>(rows: &[(u64, T)]) -> Vec<T> {
    let mut rows = rows.to_vec();
    rows.sort_by(|(left_seq, left), (right_seq, right)| {
        left.created_at()
            .cmp(&right.created_at())
            .then(left_seq.cmp(right_seq))
    });
    rows.into_iter().map(|(_, row)| row).collect()
}
