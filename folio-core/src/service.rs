use anyhow::Result;
use async_trait::async_trait;

use crate::context::RequestContext;
use crate::errors::FolioError;

/// The standard service methods: find, get, create, update, patch, remove.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceMethodKind {
    Find,
    Get,
    Create,
    Update,
    Patch,
    Remove,
}

impl ServiceMethodKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceMethodKind::Find => "find",
            ServiceMethodKind::Get => "get",
            ServiceMethodKind::Create => "create",
            ServiceMethodKind::Update => "update",
            ServiceMethodKind::Patch => "patch",
            ServiceMethodKind::Remove => "remove",
        }
    }
}

/// Which methods a service exposes to transports.
///
/// The HTTP adapter answers 405 for anything not listed here.
#[derive(Debug, Clone)]
pub struct ServiceCapabilities {
    pub allowed_methods: Vec<ServiceMethodKind>,
}

impl ServiceCapabilities {
    pub fn standard_crud() -> Self {
        use ServiceMethodKind::*;
        Self {
            allowed_methods: vec![Find, Get, Create, Update, Patch, Remove],
        }
    }

    pub fn from_methods(methods: Vec<ServiceMethodKind>) -> Self {
        Self {
            allowed_methods: methods,
        }
    }

    pub fn allows(&self, method: ServiceMethodKind) -> bool {
        self.allowed_methods.contains(&method)
    }

    pub fn without(mut self, method: ServiceMethodKind) -> Self {
        self.allowed_methods.retain(|m| *m != method);
        self
    }
}

/// A content service.
///
/// - `find`   → list all records of the block
/// - `get`    → fetch one by id
/// - `create` → create one
/// - `update` → replace one
/// - `patch`  → partial update
/// - `remove` → delete one
///
/// Every method defaults to a `NotImplemented` error, so a service only
/// overrides what it supports.
#[async_trait]
pub trait FolioService<R, P = ()>: Send + Sync
where
    R: Send + 'static,
    P: Send + 'static,
{
    fn capabilities(&self) -> ServiceCapabilities {
        ServiceCapabilities::standard_crud()
    }

    async fn find(&self, _ctx: &RequestContext, _params: P) -> Result<Vec<R>> {
        Err(FolioError::not_implemented("Method not implemented: find").into_anyhow())
    }

    async fn get(&self, _ctx: &RequestContext, _id: &str, _params: P) -> Result<R> {
        Err(FolioError::not_implemented("Method not implemented: get").into_anyhow())
    }

    async fn create(&self, _ctx: &RequestContext, _data: R, _params: P) -> Result<R> {
        Err(FolioError::not_implemented("Method not implemented: create").into_anyhow())
    }

    async fn update(&self, _ctx: &RequestContext, _id: &str, _data: R, _params: P) -> Result<R> {
        Err(FolioError::not_implemented("Method not implemented: update").into_anyhow())
    }

    async fn patch(
        &self,
        _ctx: &RequestContext,
        _id: Option<&str>,
        _data: R,
        _params: P,
    ) -> Result<R> {
        Err(FolioError::not_implemented("Method not implemented: patch").into_anyhow())
    }

    async fn remove(&self, _ctx: &RequestContext, _id: Option<&str>, _params: P) -> Result<R> {
        Err(FolioError::not_implemented("Method not implemented: remove").into_anyhow())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    struct FindOnly;

    #[async_trait]
    impl FolioService<String> for FindOnly {
        fn capabilities(&self) -> ServiceCapabilities {
            ServiceCapabilities::from_methods(vec![ServiceMethodKind::Find])
        }

        async fn find(&self, _ctx: &RequestContext, _params: ()) -> Result<Vec<String>> {
            Ok(vec!["a".into()])
        }
    }

    #[tokio::test]
    async fn unimplemented_methods_report_not_implemented() {
        let svc = FindOnly;
        let ctx = RequestContext::internal();

        assert_eq!(svc.find(&ctx, ()).await.unwrap(), vec!["a".to_string()]);

        let err = svc.get(&ctx, "1", ()).await.unwrap_err();
        let folio = FolioError::from_anyhow(&err).unwrap();
        assert_eq!(folio.kind, ErrorKind::NotImplemented);
    }

    #[test]
    fn capabilities_can_drop_methods() {
        let caps = ServiceCapabilities::standard_crud().without(ServiceMethodKind::Update);
        assert!(caps.allows(ServiceMethodKind::Patch));
        assert!(!caps.allows(ServiceMethodKind::Update));
    }
}
