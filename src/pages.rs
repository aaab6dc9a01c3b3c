use crate::categories;
use crate::errors::AppResult;
use crate::folders::FolderProvisioner;
use crate::models::{EntityRef, NewPage, Page, PageQuery, ResolutionKey};
use crate::reconcile::{split_oldest, CleanupReport};
use crate::store::StoreGateway;
use std::sync::Arc;

pub struct PageResolver {
    store: Arc<dyn StoreGateway>,
    folders: FolderProvisioner,
}

impl PageResolver {
    pub fn new(store: Arc<dyn StoreGateway>) -> Self {
        Self {
            folders: FolderProvisioner::new(Arc::clone(&store)),
            store,
        }
    }

    pub fn folders(&self) -> &FolderProvisioner {
        &self.folders
    }

    pub async fn find_linked_page(&self, key: &ResolutionKey) -> AppResult<Option<Page>> {
        let pages = self.store.list_pages(&PageQuery::linked(key)).await.map_err(|error| {
            tracing::error!(
                team_id = %key.team_id,
                season_id = %key.season_id,
                entity_type = %key.entity_type,
                entity_id = %key.entity_id,
                error = %error,
                "failed to read linked pages"
            );
            error
        })?;

        let Some((primary, duplicates)) = split_oldest(pages) else {
            return Ok(None);
        };

        if !duplicates.is_empty() {
            tracing::warn!(
                team_id = %key.team_id,
                season_id = %key.season_id,
                entity_type = %key.entity_type,
                entity_id = %key.entity_id,
                page_id = %primary.id,
                duplicates = duplicates.len(),
                "duplicate linked pages found; keeping oldest"
            );
            let report = remove_duplicate_pages(self.store.as_ref(), duplicates).await;
            tracing::info!(
                page_id = %primary.id,
                removed = report.removed,
                failed = report.failed,
                "linked page reconciliation finished"
            );
        }

        Ok(Some(primary))
    }

    pub async fn resolve_or_create_page(
        &self,
        key: &ResolutionKey,
        title: &str,
        actor_id: Option<&str>,
    ) -> AppResult<Page> {
        if let Some(existing) = self.find_linked_page(key).await? {
            return Ok(existing);
        }

        let category = categories::category_name(key.entity_type);
        let folder = self
            .folders
            .get_or_create_category_folder(&key.team_id, &key.season_id, category, actor_id)
            .await
            .map_err(|error| {
                tracing::error!(
                    team_id = %key.team_id,
                    season_id = %key.season_id,
                    entity_type = %key.entity_type,
                    entity_id = %key.entity_id,
                    category,
                    error = %error,
                    "cannot file linked page without its category folder"
                );
                error
            })?;

        let title = match title.trim() {
            "" => key.entity_type.fallback_title().to_string(),
            trimmed => trimmed.to_string(),
        };
        let page = self
            .store
            .insert_page(NewPage {
                team_id: key.team_id.clone(),
                season_id: key.season_id.clone(),
                folder_id: Some(folder.id.clone()),
                title,
                linked_entity: Some(EntityRef {
                    entity_type: key.entity_type,
                    entity_id: key.entity_id.clone(),
                }),
                created_by: actor_id.map(ToString::to_string),
            })
            .await
            .map_err(|error| {
                tracing::error!(
                    team_id = %key.team_id,
                    season_id = %key.season_id,
                    entity_type = %key.entity_type,
                    entity_id = %key.entity_id,
                    folder_id = %folder.id,
                    error = %error,
                    "failed to create linked page"
                );
                error
            })?;

        tracing::info!(
            page_id = %page.id,
            folder_id = %folder.id,
            entity_type = %key.entity_type,
            entity_id = %key.entity_id,
            "created linked page"
        );
        Ok(page)
    }
}

pub async fn remove_duplicate_pages(store: &dyn StoreGateway, duplicates: Vec<Page>) -> CleanupReport {
    let mut report = CleanupReport::default();
    for duplicate in duplicates {
        match store.delete_page(&duplicate.id).await {
            Ok(true) => report.removed += 1,
            Ok(false) => {
                tracing::debug!(page_id = %duplicate.id, "duplicate page already removed");
            }
            Err(error) => {
                tracing::warn!(page_id = %duplicate.id, error = %error, "failed to delete duplicate page");
                report.failed += 1;
            }
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::PageResolver;
    use crate::errors::AppError;
    use crate::models::{LinkedEntityType, Page, ResolutionKey};
    use crate::store::{Fault, MemoryStore};
    use chrono::{Duration, Utc};
    use std::sync::Arc;

    fn key(entity_type: LinkedEntityType, entity_id: &str) -> ResolutionKey {
        ResolutionKey::new("T1", "S1", entity_type, entity_id).expect("key")
    }

    fn linked_page_at(id: &str, entity_id: &str, minutes_ago: i64) -> Page {
        let at = Utc::now() - Duration::minutes(minutes_ago);
        Page {
            id: id.to_string(),
            team_id: "T1".to_string(),
            season_id: "S1".to_string(),
            folder_id: None,
            title: id.to_string(),
            linked_entity_type: Some(LinkedEntityType::Event),
            linked_entity_id: Some(entity_id.to_string()),
            created_by: None,
            updated_by: None,
            created_at: at,
            updated_at: at,
        }
    }

    #[tokio::test]
    async fn creates_page_in_matching_category_folder() {
        let store = Arc::new(MemoryStore::new());
        let resolver = PageResolver::new(store.clone());

        let page = resolver
            .resolve_or_create_page(&key(LinkedEntityType::MentoringSession, "session-9"), "Week 3", Some("mentor-1"))
            .await
            .expect("page");

        let folders = store.folders();
        assert_eq!(folders.len(), 1);
        assert_eq!(folders[0].name, "Mentoring");
        assert_eq!(page.folder_id.as_deref(), Some(folders[0].id.as_str()));
        assert_eq!(page.title, "Week 3");
        assert_eq!(page.linked_entity_type, Some(LinkedEntityType::MentoringSession));
        assert_eq!(page.linked_entity_id.as_deref(), Some("session-9"));
        assert_eq!(page.created_by.as_deref(), Some("mentor-1"));
        assert_eq!(page.updated_by.as_deref(), Some("mentor-1"));
    }

    #[tokio::test]
    async fn existing_page_is_returned_without_touching_folders() {
        let store = Arc::new(MemoryStore::new());
        store.seed_page(linked_page_at("existing", "event-1", 5));
        let resolver = PageResolver::new(store.clone());

        let page = resolver
            .resolve_or_create_page(&key(LinkedEntityType::Event, "event-1"), "Kickoff", None)
            .await
            .expect("page");
        assert_eq!(page.id, "existing");
        assert!(store.folders().is_empty());
        assert_eq!(store.page_inserts(), 0);
    }

    #[tokio::test]
    async fn duplicate_pages_collapse_to_the_earliest() {
        let store = Arc::new(MemoryStore::new());
        store.seed_page(linked_page_at("later", "event-1", 1));
        store.seed_page(linked_page_at("earlier", "event-1", 20));
        store.seed_page(linked_page_at("unrelated", "event-2", 30));
        let resolver = PageResolver::new(store.clone());

        let page = resolver
            .find_linked_page(&key(LinkedEntityType::Event, "event-1"))
            .await
            .expect("lookup")
            .expect("page exists");
        assert_eq!(page.id, "earlier");

        let ids = store.pages().into_iter().map(|page| page.id).collect::<Vec<_>>();
        assert_eq!(ids, vec!["unrelated".to_string(), "earlier".to_string()]);
    }

    #[tokio::test]
    async fn failed_duplicate_delete_still_returns_primary() {
        let store = Arc::new(MemoryStore::new());
        store.seed_page(linked_page_at("later", "event-1", 1));
        store.seed_page(linked_page_at("earlier", "event-1", 20));
        store.faults().enable(Fault::PageDeletes);
        let resolver = PageResolver::new(store.clone());

        let page = resolver
            .find_linked_page(&key(LinkedEntityType::Event, "event-1"))
            .await
            .expect("lookup")
            .expect("page exists");
        assert_eq!(page.id, "earlier");
        assert_eq!(store.pages().len(), 2);
    }

    #[tokio::test]
    async fn lookup_never_creates() {
        let store = Arc::new(MemoryStore::new());
        let resolver = PageResolver::new(store.clone());
        let found = resolver
            .find_linked_page(&key(LinkedEntityType::Task, "task-1"))
            .await
            .expect("lookup");
        assert!(found.is_none());
        assert!(store.pages().is_empty());
        assert!(store.folders().is_empty());
    }

    #[tokio::test]
    async fn folder_failure_aborts_page_creation() {
        let store = Arc::new(MemoryStore::new());
        store.faults().enable(Fault::FolderInserts);
        let resolver = PageResolver::new(store.clone());

        let error = resolver
            .resolve_or_create_page(&key(LinkedEntityType::Task, "task-1"), "Fix drivetrain", None)
            .await
            .expect_err("no folder");
        assert!(matches!(error, AppError::FolderProvision(_)));
        assert_eq!(store.page_inserts(), 0);
    }

    #[tokio::test]
    async fn blank_title_uses_type_fallback() {
        let store = Arc::new(MemoryStore::new());
        let resolver = PageResolver::new(store);
        let page = resolver
            .resolve_or_create_page(&key(LinkedEntityType::ScoutingTeam, "frc254"), "   ", None)
            .await
            .expect("page");
        assert_eq!(page.title, "Scouting notes");
    }
}
