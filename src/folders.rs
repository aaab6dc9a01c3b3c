use crate::categories;
use crate::errors::{AppError, AppResult};
use crate::inflight::InflightMap;
use crate::models::{Folder, FolderKey, NewFolder};
use crate::reconcile::{split_oldest, CleanupReport};
use crate::store::StoreGateway;
use std::sync::Arc;

pub struct FolderProvisioner {
    store: Arc<dyn StoreGateway>,
    inflight: InflightMap<FolderKey, Folder>,
}

impl FolderProvisioner {
    pub fn new(store: Arc<dyn StoreGateway>) -> Self {
        Self {
            store,
            inflight: InflightMap::new("folder_provision"),
        }
    }

    pub async fn get_or_create_category_folder(
        &self,
        team_id: &str,
        season_id: &str,
        category_name: &str,
        actor_id: Option<&str>,
    ) -> AppResult<Folder> {
        let key = FolderKey::new(team_id, season_id, category_name)?;
        let store = Arc::clone(&self.store);
        let actor_id = actor_id.map(ToString::to_string);
        let operation_key = key.clone();

        self.inflight
            .run(key, move || provision(store, operation_key, actor_id))
            .await
            .map_err(|error| match error {
                AppError::FolderProvision(_) => error,
                other => AppError::FolderProvision(other.to_string()),
            })
    }

    pub fn pending(&self) -> usize {
        self.inflight.len()
    }
}

async fn provision(
    store: Arc<dyn StoreGateway>,
    key: FolderKey,
    actor_id: Option<String>,
) -> AppResult<Folder> {
    let existing = store.list_folders(&key.root_query()).await.map_err(|error| {
        tracing::error!(
            team_id = %key.team_id,
            season_id = %key.season_id,
            category = %key.name,
            error = %error,
            "failed to read category folders"
        );
        error
    })?;

    let Some((primary, duplicates)) = split_oldest(existing) else {
        return create_category_folder(store.as_ref(), &key, actor_id).await;
    };

    if !duplicates.is_empty() {
        tracing::warn!(
            team_id = %key.team_id,
            season_id = %key.season_id,
            category = %key.name,
            primary_id = %primary.id,
            duplicates = duplicates.len(),
            "duplicate category folders found; merging into oldest"
        );
        let report = merge_duplicate_folders(store.as_ref(), &primary, duplicates).await;
        tracing::info!(
            folder_id = %primary.id,
            removed = report.removed,
            reparented = report.reparented,
            failed = report.failed,
            "category folder reconciliation finished"
        );
    }

    Ok(primary)
}

async fn create_category_folder(
    store: &dyn StoreGateway,
    key: &FolderKey,
    actor_id: Option<String>,
) -> AppResult<Folder> {
    let style = categories::style_for_name(&key.name);
    let folder = store
        .insert_folder(NewFolder {
            team_id: key.team_id.clone(),
            season_id: key.season_id.clone(),
            name: key.name.clone(),
            parent_folder_id: None,
            color: style.color.to_string(),
            sort_order: style.sort_order,
            created_by: actor_id,
        })
        .await
        .map_err(|error| {
            tracing::error!(
                team_id = %key.team_id,
                season_id = %key.season_id,
                category = %key.name,
                error = %error,
                "failed to create category folder"
            );
            error
        })?;

    tracing::info!(
        folder_id = %folder.id,
        team_id = %folder.team_id,
        season_id = %folder.season_id,
        category = %folder.name,
        "created category folder"
    );
    Ok(folder)
}

pub async fn merge_duplicate_folders(
    store: &dyn StoreGateway,
    primary: &Folder,
    duplicates: Vec<Folder>,
) -> CleanupReport {
    let mut report = CleanupReport::default();

    for duplicate in duplicates {
        match store.reassign_pages(&duplicate.id, &primary.id).await {
            Ok(moved) => report.reparented += moved,
            Err(error) => {
                tracing::warn!(
                    folder_id = %duplicate.id,
                    primary_id = %primary.id,
                    error = %error,
                    "failed to move pages out of duplicate folder; keeping it for a later pass"
                );
                report.failed += 1;
                continue;
            }
        }

        match store.delete_folder(&duplicate.id).await {
            Ok(true) => report.removed += 1,
            Ok(false) => {
                tracing::debug!(folder_id = %duplicate.id, "duplicate folder already removed");
            }
            Err(error) => {
                tracing::warn!(
                    folder_id = %duplicate.id,
                    primary_id = %primary.id,
                    error = %error,
                    "failed to delete duplicate folder"
                );
                report.failed += 1;
            }
        }
    }

    report
}
