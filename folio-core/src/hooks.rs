use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::config::ConfigSnapshot;
use crate::context::RequestContext;
use crate::service::ServiceMethodKind;

/// What a service call produced.
#[derive(Debug, Clone)]
pub enum HookResult<R> {
    One(R),
    Many(Vec<R>),
}

/// State threaded through one service call.
///
/// Before hooks may rewrite `data` and `params`; after hooks may rewrite
/// `result`; error hooks see `error` and can clear it to recover.
#[derive(Debug)]
pub struct HookContext<R, P> {
    pub ctx: RequestContext,
    pub service: String,
    pub method: ServiceMethodKind,
    pub params: P,
    pub id: Option<String>,
    pub data: Option<R>,
    pub result: Option<HookResult<R>>,
    pub error: Option<anyhow::Error>,
    pub config: ConfigSnapshot,
}

impl<R, P> HookContext<R, P> {
    pub fn new(
        ctx: RequestContext,
        service: impl Into<String>,
        method: ServiceMethodKind,
        params: P,
        config: ConfigSnapshot,
    ) -> Self {
        Self {
            ctx,
            service: service.into(),
            method,
            params,
            id: None,
            data: None,
            result: None,
            error: None,
            config,
        }
    }
}

#[async_trait]
pub trait BeforeHook<R, P>: Send + Sync {
    async fn run(&self, ctx: &mut HookContext<R, P>) -> Result<()>;
}

#[async_trait]
pub trait AfterHook<R, P>: Send + Sync {
    async fn run(&self, ctx: &mut HookContext<R, P>) -> Result<()>;
}

#[async_trait]
pub trait ErrorHook<R, P>: Send + Sync {
    async fn run(&self, ctx: &mut HookContext<R, P>) -> Result<()>;
}

/// Hook registrations for one scope (the whole app, or one service).
pub struct ServiceHooks<R, P> {
    pub before_all: Vec<Arc<dyn BeforeHook<R, P>>>,
    pub before_by_method: HashMap<ServiceMethodKind, Vec<Arc<dyn BeforeHook<R, P>>>>,
    pub after_all: Vec<Arc<dyn AfterHook<R, P>>>,
    pub after_by_method: HashMap<ServiceMethodKind, Vec<Arc<dyn AfterHook<R, P>>>>,
    pub error_all: Vec<Arc<dyn ErrorHook<R, P>>>,
    pub error_by_method: HashMap<ServiceMethodKind, Vec<Arc<dyn ErrorHook<R, P>>>>,
}

impl<R, P> Default for ServiceHooks<R, P> {
    fn default() -> Self {
        Self {
            before_all: Vec::new(),
            before_by_method: HashMap::new(),
            after_all: Vec::new(),
            after_by_method: HashMap::new(),
            error_all: Vec::new(),
            error_by_method: HashMap::new(),
        }
    }
}

impl<R, P> ServiceHooks<R, P> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn before_all(&mut self, hook: Arc<dyn BeforeHook<R, P>>) -> &mut Self {
        self.before_all.push(hook);
        self
    }

    pub fn before(&mut self, method: ServiceMethodKind, hook: Arc<dyn BeforeHook<R, P>>) -> &mut Self {
        self.before_by_method.entry(method).or_default().push(hook);
        self
    }

    pub fn before_create(&mut self, hook: Arc<dyn BeforeHook<R, P>>) -> &mut Self {
        self.before(ServiceMethodKind::Create, hook)
    }

    pub fn after_all(&mut self, hook: Arc<dyn AfterHook<R, P>>) -> &mut Self {
        self.after_all.push(hook);
        self
    }

    pub fn after(&mut self, method: ServiceMethodKind, hook: Arc<dyn AfterHook<R, P>>) -> &mut Self {
        self.after_by_method.entry(method).or_default().push(hook);
        self
    }

    pub fn error_all(&mut self, hook: Arc<dyn ErrorHook<R, P>>) -> &mut Self {
        self.error_all.push(hook);
        self
    }

    pub fn error(&mut self, method: ServiceMethodKind, hook: Arc<dyn ErrorHook<R, P>>) -> &mut Self {
        self.error_by_method.entry(method).or_default().push(hook);
        self
    }
}

/// `*_all` hooks first, then the ones registered for `method`.
pub(crate) fn collect_method_hooks<H: ?Sized>(
    all: &[Arc<H>],
    by_method: &HashMap<ServiceMethodKind, Vec<Arc<H>>>,
    method: ServiceMethodKind,
) -> Vec<Arc<H>> {
    let mut out: Vec<Arc<H>> = all.to_vec();
    if let Some(v) = by_method.get(&method) {
        out.extend(v.iter().cloned());
    }
    out
}
