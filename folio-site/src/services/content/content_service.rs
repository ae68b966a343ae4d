use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use axum::http::StatusCode;
use folio_core::{FolioError, FolioService, RequestContext, ServiceCapabilities};
use serde_json::Value;

use crate::services::adapters::{ContentAdapter, ContentSchema, WriteMode};
use crate::services::{SiteParams, SiteState};

/// Unordered content: plain lists and singletons.
pub struct ContentService {
    pub adapter: ContentAdapter,
}

impl ContentService {
    pub fn new(state: Arc<SiteState>, schema: ContentSchema) -> Self {
        Self {
            adapter: ContentAdapter::new(state, schema),
        }
    }

    fn collection(&self) -> &'static str {
        self.adapter.schema.collection
    }

    async fn merge_into(&self, id: &str, data: Value) -> Result<Value> {
        let store = &self.adapter.state.store;
        if store.find_by_id(self.collection(), id).await.map_err(FolioError::from)?.is_none() {
            return Err(self.adapter.not_found(id));
        }

        let patch = self
            .adapter
            .prepare(self.adapter.object(data)?, WriteMode::Update)
            .await?;
        store
            .update_one(self.collection(), id, patch)
            .await
            .map_err(FolioError::from)?
            .ok_or_else(|| self.adapter.not_found(id))
    }
}

#[async_trait]
impl FolioService<Value, SiteParams> for ContentService {
    fn capabilities(&self) -> ServiceCapabilities {
        self.adapter.schema.capabilities()
    }

    async fn find(&self, _ctx: &RequestContext, _params: SiteParams) -> Result<Vec<Value>> {
        Ok(self
            .adapter
            .state
            .store
            .find_all(self.collection(), None)
            .await
            .map_err(FolioError::from)?)
    }

    async fn get(&self, _ctx: &RequestContext, id: &str, _params: SiteParams) -> Result<Value> {
        self.adapter
            .state
            .store
            .find_by_id(self.collection(), id)
            .await
            .map_err(FolioError::from)?
            .ok_or_else(|| self.adapter.not_found(id))
    }

    async fn create(&self, ctx: &RequestContext, data: Value, params: SiteParams) -> Result<Value> {
        let store = &self.adapter.state.store;

        if self.adapter.schema.upsert {
            if let Some(existing) = store.find_one(self.collection()).await.map_err(FolioError::from)? {
                let id = existing
                    .get(folio_store::ID_FIELD)
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                tracing::debug!(request_id = %ctx.request_id, collection = self.collection(), %id, "upsert updates existing record");
                let updated = self.merge_into(&id, data).await?;
                params.status.set(StatusCode::OK);
                return Ok(updated);
            }
        }

        let doc = self
            .adapter
            .prepare(self.adapter.object(data)?, WriteMode::Create)
            .await?;
        Ok(store
            .insert_one(self.collection(), doc)
            .await
            .map_err(FolioError::from)?)
    }

    async fn update(&self, _ctx: &RequestContext, id: &str, data: Value, _params: SiteParams) -> Result<Value> {
        self.merge_into(id, data).await
    }

    async fn patch(&self, _ctx: &RequestContext, id: Option<&str>, data: Value, _params: SiteParams) -> Result<Value> {
        let Some(id) = id else {
            return Err(FolioError::bad_request("Patching a whole collection is not supported").into_anyhow());
        };
        self.merge_into(id, data).await
    }

    async fn remove(&self, _ctx: &RequestContext, id: Option<&str>, _params: SiteParams) -> Result<Value> {
        let Some(id) = id else {
            return Err(FolioError::bad_request("An id is required").into_anyhow());
        };
        let removed = self
            .adapter
            .state
            .store
            .delete_by_id(self.collection(), id)
            .await
            .map_err(FolioError::from)?
            .ok_or_else(|| self.adapter.not_found(id))?;
        Ok(self.adapter.deleted(removed))
    }
}
