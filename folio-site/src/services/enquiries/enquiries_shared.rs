use std::sync::Arc;

use folio_core::{FolioApp, ServiceCapabilities, ServiceMethodKind};
use serde_json::Value;

use crate::services::SiteParams;

pub const PATH: &str = "/api/enquiries";

pub fn capabilities() -> ServiceCapabilities {
    ServiceCapabilities::from_methods(vec![ServiceMethodKind::Create, ServiceMethodKind::Find])
}

pub fn register_hooks(app: &FolioApp<Value, SiteParams>) -> anyhow::Result<()> {
    app.service(PATH.trim_start_matches('/'))?.hooks(|h| {
        h.before_create(Arc::new(super::enquiries_hooks::NormalizeEnquiry));
    });
    Ok(())
}
