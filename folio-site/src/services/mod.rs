use std::sync::Arc;

use folio_axum::AxumApp;
use serde_json::Value;

pub mod adapters;
pub mod content;
pub mod enquiries;
pub mod fun_facts;
pub mod ordered;
pub mod types;

pub use types::{SiteParams, SiteState};

use content::content_schemas::{CONTENT, ORDERED};
use content::ContentService;
use enquiries::EnquiriesService;
use fun_facts::FunFactsService;
use ordered::OrderedService;

/// Mount every content service under `/api`.
pub fn configure(
    ax: AxumApp<Value, SiteParams>,
    state: Arc<SiteState>,
) -> anyhow::Result<AxumApp<Value, SiteParams>> {
    let mut ax = ax;

    for schema in ORDERED {
        let path = format!("/api/{}", schema.collection);
        ax = ax.use_service(&path, Arc::new(OrderedService::new(Arc::clone(&state), *schema)));
    }

    for schema in CONTENT {
        let path = format!("/api/{}", schema.collection);
        let service = Arc::new(ContentService::new(Arc::clone(&state), *schema));
        ax = if schema.singleton {
            ax.use_singleton(&path, service)
        } else {
            ax.use_service(&path, service)
        };
    }

    ax = ax
        .use_service("/api/fun-facts", Arc::new(FunFactsService::new(Arc::clone(&state))))
        .use_service(enquiries::enquiries_shared::PATH, Arc::new(EnquiriesService { state }));
    enquiries::enquiries_shared::register_hooks(&ax.app)?;

    Ok(ax)
}
