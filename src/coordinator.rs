use crate::errors::AppResult;
use crate::inflight::InflightMap;
use crate::models::{Page, ResolutionKey};
use crate::pages::PageResolver;
use std::sync::Arc;

pub struct ResolutionCoordinator {
    resolver: Arc<PageResolver>,
    inflight: InflightMap<ResolutionKey, Page>,
}

impl ResolutionCoordinator {
    pub fn new(resolver: Arc<PageResolver>) -> Self {
        Self {
            resolver,
            inflight: InflightMap::new("page_resolution"),
        }
    }

    pub async fn resolve(
        &self,
        key: ResolutionKey,
        title: &str,
        actor_id: Option<&str>,
    ) -> AppResult<Page> {
        let resolver = Arc::clone(&self.resolver);
        let operation_key = key.clone();
        let title = title.to_string();
        let actor_id = actor_id.map(ToString::to_string);

        let outcome = self
            .inflight
            .run(key.clone(), move || async move {
                resolver
                    .resolve_or_create_page(&operation_key, &title, actor_id.as_deref())
                    .await
            })
            .await;

        if let Err(error) = &outcome {
            tracing::error!(
                team_id = %key.team_id,
                season_id = %key.season_id,
                entity_type = %key.entity_type,
                entity_id = %key.entity_id,
                code = error.code(),
                error = %error,
                "linked page resolution failed"
            );
        }
        outcome
    }

    pub fn pending(&self) -> usize {
        self.inflight.len()
    }

    pub fn is_resolving(&self, key: &ResolutionKey) -> bool {
        self.inflight.contains(key)
    }
}
