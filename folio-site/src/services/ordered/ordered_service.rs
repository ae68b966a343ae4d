use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use folio_core::{FolioError, FolioService, RequestContext, ServiceCapabilities};
use folio_store::OrderedCollection;
use serde_json::Value;

use crate::services::adapters::{ContentAdapter, ContentSchema, WriteMode};
use crate::services::{SiteParams, SiteState};
use crate::utils::payload::parse_position;

/// Collections whose records carry a dense `position`.
///
/// Creates with a position shift the records at and after it, updates with a
/// new position move the records in between, and deletes close the gap.
pub struct OrderedService {
    adapter: ContentAdapter,
    ordered: OrderedCollection,
}

impl OrderedService {
    pub fn new(state: Arc<SiteState>, schema: ContentSchema) -> Self {
        let ordered = OrderedCollection::new(Arc::clone(&state.store), schema.collection)
            .with_locks(state.locks.clone());
        Self {
            adapter: ContentAdapter::new(state, schema),
            ordered,
        }
    }

    async fn reposition(&self, id: &str, data: Value) -> Result<Value> {
        // Unknown ids and bad positions fail before anything is uploaded.
        self.ordered.get(id).await.map_err(FolioError::from)?;

        let mut data = self.adapter.object(data)?;
        let position = parse_position(self.ordered.field(), data.remove(self.ordered.field()))?;
        self.ordered.check_move(position).await.map_err(FolioError::from)?;
        let patch = self.adapter.prepare(data, WriteMode::Update).await?;

        Ok(self
            .ordered
            .reposition(id, position, patch)
            .await
            .map_err(FolioError::from)?)
    }
}

#[async_trait]
impl FolioService<Value, SiteParams> for OrderedService {
    fn capabilities(&self) -> ServiceCapabilities {
        self.adapter.schema.capabilities()
    }

    async fn find(&self, _ctx: &RequestContext, _params: SiteParams) -> Result<Vec<Value>> {
        Ok(self.ordered.list().await.map_err(FolioError::from)?)
    }

    async fn get(&self, _ctx: &RequestContext, id: &str, _params: SiteParams) -> Result<Value> {
        Ok(self.ordered.get(id).await.map_err(FolioError::from)?)
    }

    async fn create(&self, _ctx: &RequestContext, data: Value, _params: SiteParams) -> Result<Value> {
        let mut data = self.adapter.object(data)?;
        let position = parse_position(self.ordered.field(), data.remove(self.ordered.field()))?;
        self.ordered.check_insert(position).await.map_err(FolioError::from)?;
        let doc = self.adapter.prepare(data, WriteMode::Create).await?;

        Ok(self
            .ordered
            .insert(doc, position)
            .await
            .map_err(FolioError::from)?)
    }

    async fn update(&self, _ctx: &RequestContext, id: &str, data: Value, _params: SiteParams) -> Result<Value> {
        self.reposition(id, data).await
    }

    async fn patch(&self, _ctx: &RequestContext, id: Option<&str>, data: Value, _params: SiteParams) -> Result<Value> {
        let Some(id) = id else {
            return Err(FolioError::bad_request("Patching a whole collection is not supported").into_anyhow());
        };
        self.reposition(id, data).await
    }

    async fn remove(&self, _ctx: &RequestContext, id: Option<&str>, _params: SiteParams) -> Result<Value> {
        let Some(id) = id else {
            return Err(FolioError::bad_request("An id is required").into_anyhow());
        };
        let removed = self.ordered.delete(id).await.map_err(FolioError::from)?;
        Ok(self.adapter.deleted(removed))
    }
}
