use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use folio_core::{FolioError, FolioService, RequestContext, ServiceCapabilities};
use serde_json::Value;

use crate::services::adapters::{ContentAdapter, WriteMode};
use crate::services::content::content_schemas::FUN_FACTS;
use crate::services::content::ContentService;
use crate::services::{SiteParams, SiteState};

/// Fun facts are created in bulk: `POST {"funFacts": [{number, label}, ..]}`.
/// Everything else behaves like a plain content list.
pub struct FunFactsService {
    content: ContentService,
}

impl FunFactsService {
    pub fn new(state: Arc<SiteState>) -> Self {
        Self {
            content: ContentService::new(state, FUN_FACTS),
        }
    }

    fn adapter(&self) -> &ContentAdapter {
        &self.content.adapter
    }
}

#[async_trait]
impl FolioService<Value, SiteParams> for FunFactsService {
    fn capabilities(&self) -> ServiceCapabilities {
        FUN_FACTS.capabilities()
    }

    async fn find(&self, ctx: &RequestContext, params: SiteParams) -> Result<Vec<Value>> {
        self.content.find(ctx, params).await
    }

    async fn get(&self, ctx: &RequestContext, id: &str, params: SiteParams) -> Result<Value> {
        self.content.get(ctx, id, params).await
    }

    async fn create(&self, _ctx: &RequestContext, data: Value, _params: SiteParams) -> Result<Value> {
        let mut data = self.adapter().object(data)?;
        let items = match data.remove("funFacts") {
            Some(Value::Array(items)) => items,
            Some(_) => {
                return Err(FolioError::bad_request("funFacts must be an array")
                    .with_field_error("funFacts", "must be an array")
                    .into_anyhow())
            }
            None => vec![Value::Object(data)],
        };
        if items.is_empty() {
            return Err(FolioError::bad_request("funFacts must not be empty")
                .with_field_error("funFacts", "must not be empty")
                .into_anyhow());
        }

        // Validate every item before writing any.
        let mut docs = Vec::with_capacity(items.len());
        for item in items {
            let item = self.adapter().object(item)?;
            docs.push(self.adapter().prepare(item, WriteMode::Create).await?);
        }

        let written = self
            .adapter()
            .state
            .store
            .insert_many(FUN_FACTS.collection, docs)
            .await
            .map_err(FolioError::from)?;
        tracing::info!(count = written.len(), "fun facts created");
        Ok(Value::Array(written))
    }

    async fn update(&self, ctx: &RequestContext, id: &str, data: Value, params: SiteParams) -> Result<Value> {
        self.content.update(ctx, id, data, params).await
    }

    async fn patch(&self, ctx: &RequestContext, id: Option<&str>, data: Value, params: SiteParams) -> Result<Value> {
        self.content.patch(ctx, id, data, params).await
    }
}
