use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use folio_core::{FolioError, FolioService, RequestContext, ServiceCapabilities};
use serde_json::{json, Value};

use crate::services::{SiteParams, SiteState};
use crate::utils::validator::validate;

use super::enquiries_schema::CreateEnquiry;
use super::enquiries_shared;

pub const COLLECTION: &str = "enquiries";

/// Contact-form submissions: validated, stored, acknowledged.
pub struct EnquiriesService {
    pub state: Arc<SiteState>,
}

#[async_trait]
impl FolioService<Value, SiteParams> for EnquiriesService {
    fn capabilities(&self) -> ServiceCapabilities {
        enquiries_shared::capabilities()
    }

    async fn find(&self, _ctx: &RequestContext, _params: SiteParams) -> Result<Vec<Value>> {
        Ok(self
            .state
            .store
            .find_all(COLLECTION, None)
            .await
            .map_err(FolioError::from)?)
    }

    async fn create(&self, ctx: &RequestContext, data: Value, _params: SiteParams) -> Result<Value> {
        let enquiry: CreateEnquiry = validate(&data, "Enquiry validation failed")?;

        let mut doc = serde_json::to_value(&enquiry)?;
        doc["createdAt"] = Value::String(Utc::now().to_rfc3339());

        self.state
            .store
            .insert_one(COLLECTION, doc)
            .await
            .map_err(FolioError::from)?;

        tracing::info!(request_id = %ctx.request_id, "enquiry stored");
        Ok(json!({ "message": "Enquiry submitted successfully" }))
    }
}
