use crate::config::ServiceConfig;
use crate::coordinator::ResolutionCoordinator;
use crate::errors::AppResult;
use crate::models::{LinkedEntityType, Page, ResolutionKey};
use crate::pages::PageResolver;
use crate::store::{SqliteStore, StoreGateway};
use std::sync::Arc;

#[derive(Clone)]
pub struct LinkedPageService {
    resolver: Arc<PageResolver>,
    coordinator: Arc<ResolutionCoordinator>,
}

impl LinkedPageService {
    pub fn new(store: Arc<dyn StoreGateway>) -> Self {
        let resolver = Arc::new(PageResolver::new(store));
        let coordinator = Arc::new(ResolutionCoordinator::new(Arc::clone(&resolver)));
        Self { resolver, coordinator }
    }

    pub fn open(config: &ServiceConfig) -> AppResult<Self> {
        let store = SqliteStore::open(&config.database_path)?;
        tracing::info!(path = %config.database_path.to_string_lossy(), "opened linked page store");
        Ok(Self::new(Arc::new(store)))
    }

    pub async fn resolve_page_for_entity(
        &self,
        team_id: &str,
        season_id: &str,
        entity_type: LinkedEntityType,
        entity_id: &str,
    ) -> AppResult<Option<Page>> {
        let key = ResolutionKey::new(team_id, season_id, entity_type, entity_id)?;
        self.resolver.find_linked_page(&key).await
    }

    pub async fn get_or_create_page_for_entity(
        &self,
        team_id: &str,
        season_id: &str,
        entity_type: LinkedEntityType,
        entity_id: &str,
        display_title: &str,
        actor_id: &str,
    ) -> AppResult<Page> {
        let key = ResolutionKey::new(team_id, season_id, entity_type, entity_id)?;
        let actor_id = Some(actor_id.trim()).filter(|value| !value.is_empty());
        self.coordinator.resolve(key, display_title, actor_id).await
    }

    pub fn pending_resolutions(&self) -> usize {
        self.coordinator.pending()
    }

    pub fn is_resolving(&self, key: &ResolutionKey) -> bool {
        self.coordinator.is_resolving(key)
    }
}

#[cfg(test)]
mod tests {
    use super::LinkedPageService;
    use crate::errors::AppError;
    use crate::models::{LinkedEntityType, ResolutionKey};
    use crate::store::{Fault, MemoryStore};
    use std::sync::Arc;

    #[tokio::test]
    async fn task_scenario_creates_folder_and_page_once() {
        let store = Arc::new(MemoryStore::new());
        let service = LinkedPageService::new(store.clone());

        let page = service
            .get_or_create_page_for_entity("T1", "S1", LinkedEntityType::Task, "task-42", "Fix drivetrain", "user-1")
            .await
            .expect("page");

        let folders = store.folders();
        assert_eq!(folders.len(), 1);
        assert_eq!(folders[0].name, "Tasks");
        assert_eq!(folders[0].color, "#10b981");
        assert_eq!(folders[0].sort_order, 2);
        assert_eq!(page.title, "Fix drivetrain");
        assert_eq!(page.folder_id.as_deref(), Some(folders[0].id.as_str()));
        assert_eq!(page.linked_entity_type, Some(LinkedEntityType::Task));
        assert_eq!(page.linked_entity_id.as_deref(), Some("task-42"));

        let again = service
            .get_or_create_page_for_entity("T1", "S1", LinkedEntityType::Task, "task-42", "Fix drivetrain", "user-1")
            .await
            .expect("page again");
        assert_eq!(again.id, page.id);
        assert_eq!(store.folder_inserts(), 1);
        assert_eq!(store.page_inserts(), 1);
    }

    #[tokio::test]
    async fn lookup_reports_missing_then_existing() {
        let store = Arc::new(MemoryStore::new());
        let service = LinkedPageService::new(store.clone());

        let missing = service
            .resolve_page_for_entity("T1", "S1", LinkedEntityType::Event, "event-3")
            .await
            .expect("lookup");
        assert!(missing.is_none());

        let created = service
            .get_or_create_page_for_entity("T1", "S1", LinkedEntityType::Event, "event-3", "Regional", "user-1")
            .await
            .expect("page");
        let found = service
            .resolve_page_for_entity("T1", "S1", LinkedEntityType::Event, "event-3")
            .await
            .expect("lookup")
            .expect("page exists");
        assert_eq!(found.id, created.id);
    }

    #[tokio::test]
    async fn blank_identifiers_are_rejected_before_the_store() {
        let store = Arc::new(MemoryStore::new());
        let service = LinkedPageService::new(store.clone());
        let error = service
            .get_or_create_page_for_entity("T1", "", LinkedEntityType::Event, "event-3", "Regional", "user-1")
            .await
            .expect_err("blank season");
        assert!(matches!(error, AppError::InvalidInput(_)));
        assert!(store.folders().is_empty());
        assert_eq!(service.pending_resolutions(), 0);
    }

    #[tokio::test]
    async fn store_read_failures_reach_both_entry_points() {
        let store = Arc::new(MemoryStore::new());
        store.faults().enable(Fault::Reads);
        let service = LinkedPageService::new(store.clone());
        let key = ResolutionKey::new("T1", "S1", LinkedEntityType::Task, "task-42").expect("key");

        let lookup = service
            .resolve_page_for_entity("T1", "S1", LinkedEntityType::Task, "task-42")
            .await;
        assert_eq!(lookup, Err(AppError::Store("injected Reads failure".to_string())));

        let created = service
            .get_or_create_page_for_entity("T1", "S1", LinkedEntityType::Task, "task-42", "Fix drivetrain", "user-1")
            .await;
        assert_eq!(created, Err(AppError::Store("injected Reads failure".to_string())));
        assert!(!service.is_resolving(&key));
        assert_eq!(service.pending_resolutions(), 0);
        assert!(store.pages().is_empty());

        store.faults().disable(Fault::Reads);
        let page = service
            .get_or_create_page_for_entity("T1", "S1", LinkedEntityType::Task, "task-42", "Fix drivetrain", "user-1")
            .await
            .expect("recovers once reads work");
        assert_eq!(page.linked_entity_id.as_deref(), Some("task-42"));
    }

    #[tokio::test]
    async fn padded_entity_ids_get_their_own_page() {
        let store = Arc::new(MemoryStore::new());
        let service = LinkedPageService::new(store.clone());

        let plain = service
            .get_or_create_page_for_entity("T1", "S1", LinkedEntityType::Task, "task-42", "Fix drivetrain", "user-1")
            .await
            .expect("plain");
        let padded = service
            .get_or_create_page_for_entity("T1", "S1", LinkedEntityType::Task, " task-42", "Fix drivetrain", "user-1")
            .await
            .expect("padded");
        assert_ne!(plain.id, padded.id);
        assert_eq!(padded.linked_entity_id.as_deref(), Some(" task-42"));
        assert_eq!(store.folder_inserts(), 1);
    }

    #[tokio::test]
    async fn blank_actor_is_stored_as_unknown() {
        let store = Arc::new(MemoryStore::new());
        let service = LinkedPageService::new(store);
        let page = service
            .get_or_create_page_for_entity("T1", "S1", LinkedEntityType::ScoutingTeam, "frc1678", "1678", " ")
            .await
            .expect("page");
        assert!(page.created_by.is_none());
    }
}
