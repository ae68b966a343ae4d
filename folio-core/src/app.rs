use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use parking_lot::RwLock;

use crate::config::{ConfigSnapshot, FolioConfig};
use crate::context::RequestContext;
use crate::errors::FolioError;
use crate::hooks::{
    collect_method_hooks, AfterHook, BeforeHook, ErrorHook, HookContext, HookResult, ServiceHooks,
};
use crate::service::{FolioService, ServiceCapabilities, ServiceMethodKind};

struct FolioAppInner<R, P> {
    services: RwLock<HashMap<String, Arc<dyn FolioService<R, P>>>>,
    global_hooks: RwLock<ServiceHooks<R, P>>,
    service_hooks: RwLock<HashMap<String, ServiceHooks<R, P>>>,
    config: RwLock<FolioConfig>,
}

/// Application container: service registry, app-wide and per-service
/// hooks, and string configuration. Cheap to clone.
pub struct FolioApp<R, P = ()> {
    inner: Arc<FolioAppInner<R, P>>,
}

type HooksForMethod<R, P> = (
    Vec<Arc<dyn BeforeHook<R, P>>>,
    Vec<Arc<dyn AfterHook<R, P>>>,
    Vec<Arc<dyn ErrorHook<R, P>>>,
);

impl<R, P> Clone for FolioApp<R, P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R, P> Default for FolioApp<R, P>
where
    R: Send + 'static,
    P: Send + Clone + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<R, P> FolioApp<R, P>
where
    R: Send + 'static,
    P: Send + Clone + 'static,
{
    pub fn new() -> Self {
        Self {
            inner: Arc::new(FolioAppInner {
                services: RwLock::new(HashMap::new()),
                global_hooks: RwLock::new(ServiceHooks::new()),
                service_hooks: RwLock::new(HashMap::new()),
                config: RwLock::new(FolioConfig::new()),
            }),
        }
    }

    pub fn register_service<S>(&self, name: S, service: Arc<dyn FolioService<R, P>>)
    where
        S: Into<String>,
    {
        let name = name.into();
        tracing::debug!(service = %name, "service registered");
        self.inner.services.write().insert(name, service);
    }

    /// App-wide hooks, run before the service's own hooks.
    pub fn hooks<F>(&self, f: F)
    where
        F: FnOnce(&mut ServiceHooks<R, P>),
    {
        let mut g = self.inner.global_hooks.write();
        f(&mut g);
    }

    fn configure_service_hooks<F>(&self, service: &str, f: F)
    where
        F: FnOnce(&mut ServiceHooks<R, P>),
    {
        let mut map = self.inner.service_hooks.write();
        f(map.entry(service.to_string()).or_default());
    }

    pub fn service(&self, name: &str) -> Result<ServiceHandle<R, P>> {
        let service = self
            .inner
            .services
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| FolioError::not_found(format!("Service not found: {name}")).into_anyhow())?;

        Ok(ServiceHandle {
            app: self.clone(),
            name: name.to_string(),
            service,
        })
    }

    pub fn set<K, V>(&self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.inner.config.write().set(key, value);
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.inner.config.read().get(key).map(|v| v.to_string())
    }

    pub fn apply_env_overrides<I>(&self, prefix: &str, vars: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.inner.config.write().apply_env_overrides(prefix, vars);
    }

    pub fn config_snapshot(&self) -> ConfigSnapshot {
        self.inner.config.read().snapshot()
    }
}

/// A named service plus the app it belongs to.
///
/// Calls made through the handle run the full hook pipeline.
pub struct ServiceHandle<R, P> {
    app: FolioApp<R, P>,
    name: String,
    service: Arc<dyn FolioService<R, P>>,
}

impl<R, P> ServiceHandle<R, P>
where
    R: Send + 'static,
    P: Send + Clone + 'static,
{
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn hooks<F>(self, f: F) -> Self
    where
        F: FnOnce(&mut ServiceHooks<R, P>),
    {
        self.app.configure_service_hooks(&self.name, f);
        self
    }

    pub fn capabilities(&self) -> ServiceCapabilities {
        self.service.capabilities()
    }

    pub fn inner(&self) -> &Arc<dyn FolioService<R, P>> {
        &self.service
    }

    /// Global first, then service.
    fn collect_hooks_for_method(&self, method: ServiceMethodKind) -> HooksForMethod<R, P> {
        let g = self.app.inner.global_hooks.read();
        let map = self.app.inner.service_hooks.read();

        let mut before = collect_method_hooks(&g.before_all, &g.before_by_method, method);
        let mut after = collect_method_hooks(&g.after_all, &g.after_by_method, method);
        let mut error = collect_method_hooks(&g.error_all, &g.error_by_method, method);

        if let Some(h) = map.get(&self.name) {
            before.extend(collect_method_hooks(&h.before_all, &h.before_by_method, method));
            after.extend(collect_method_hooks(&h.after_all, &h.after_by_method, method));
            error.extend(collect_method_hooks(&h.error_all, &h.error_by_method, method));
        }

        (before, after, error)
    }

    fn context(&self, ctx: RequestContext, method: ServiceMethodKind, params: P) -> HookContext<R, P> {
        HookContext::new(ctx, self.name.clone(), method, params, self.app.config_snapshot())
    }

    /// Dispatch to the service method named by `ctx.method`.
    async fn invoke(&self, ctx: &mut HookContext<R, P>) -> Result<()> {
        let svc = &self.service;
        let params = ctx.params.clone();
        let id = ctx.id.clone();

        let result = match ctx.method {
            ServiceMethodKind::Find => HookResult::Many(svc.find(&ctx.ctx, params).await?),
            ServiceMethodKind::Get => {
                let id = require_id(id.as_deref(), "get")?;
                HookResult::One(svc.get(&ctx.ctx, id, params).await?)
            }
            ServiceMethodKind::Create => {
                let data = take_data(ctx, "create")?;
                HookResult::One(svc.create(&ctx.ctx, data, params).await?)
            }
            ServiceMethodKind::Update => {
                let id = require_id(id.as_deref(), "update")?;
                let data = take_data(ctx, "update")?;
                HookResult::One(svc.update(&ctx.ctx, id, data, params).await?)
            }
            ServiceMethodKind::Patch => {
                let data = take_data(ctx, "patch")?;
                HookResult::One(svc.patch(&ctx.ctx, id.as_deref(), data, params).await?)
            }
            ServiceMethodKind::Remove => {
                HookResult::One(svc.remove(&ctx.ctx, id.as_deref(), params).await?)
            }
        };

        ctx.result = Some(result);
        Ok(())
    }

    /// before → service → after (reverse order); error hooks on failure.
    async fn run_pipeline(&self, mut ctx: HookContext<R, P>) -> Result<HookContext<R, P>> {
        let method = ctx.method;
        if !self.service.capabilities().allows(method) {
            return Err(FolioError::method_not_allowed(format!(
                "Method `{}` is not allowed on `{}`",
                method.as_str(),
                self.name
            ))
            .into_anyhow());
        }

        let (before, after, error) = self.collect_hooks_for_method(method);

        let res: Result<()> = async {
            for h in &before {
                h.run(&mut ctx).await?;
            }
            self.invoke(&mut ctx).await?;
            for h in after.iter().rev() {
                h.run(&mut ctx).await?;
            }
            Ok(())
        }
        .await;

        if let Err(e) = res {
            ctx.error = Some(e);

            for h in &error {
                if let Err(hook_err) = h.run(&mut ctx).await {
                    tracing::warn!(
                        service = %self.name,
                        method = method.as_str(),
                        error = %hook_err,
                        "error hook failed"
                    );
                }
            }

            if let Some(err) = ctx.error.take() {
                return Err(err);
            }
        }

        Ok(ctx)
    }

    pub async fn find(&self, ctx: RequestContext, params: P) -> Result<Vec<R>> {
        let ctx = self.context(ctx, ServiceMethodKind::Find, params);
        let ctx = self.run_pipeline(ctx).await?;

        match ctx.result {
            Some(HookResult::Many(v)) => Ok(v),
            Some(HookResult::One(v)) => Ok(vec![v]),
            None => Ok(vec![]),
        }
    }

    pub async fn get(&self, ctx: RequestContext, id: &str, params: P) -> Result<R> {
        let mut ctx = self.context(ctx, ServiceMethodKind::Get, params);
        ctx.id = Some(id.to_string());
        one(self.run_pipeline(ctx).await?, "get")
    }

    pub async fn create(&self, ctx: RequestContext, data: R, params: P) -> Result<R> {
        let mut ctx = self.context(ctx, ServiceMethodKind::Create, params);
        ctx.data = Some(data);
        one(self.run_pipeline(ctx).await?, "create")
    }

    pub async fn update(&self, ctx: RequestContext, id: &str, data: R, params: P) -> Result<R> {
        let mut ctx = self.context(ctx, ServiceMethodKind::Update, params);
        ctx.id = Some(id.to_string());
        ctx.data = Some(data);
        one(self.run_pipeline(ctx).await?, "update")
    }

    pub async fn patch(&self, ctx: RequestContext, id: Option<&str>, data: R, params: P) -> Result<R> {
        let mut ctx = self.context(ctx, ServiceMethodKind::Patch, params);
        ctx.id = id.map(str::to_string);
        ctx.data = Some(data);
        one(self.run_pipeline(ctx).await?, "patch")
    }

    pub async fn remove(&self, ctx: RequestContext, id: Option<&str>, params: P) -> Result<R> {
        let mut ctx = self.context(ctx, ServiceMethodKind::Remove, params);
        ctx.id = id.map(str::to_string);
        one(self.run_pipeline(ctx).await?, "remove")
    }
}

fn require_id<'a>(id: Option<&'a str>, method: &str) -> Result<&'a str> {
    id.ok_or_else(|| FolioError::bad_request(format!("{method}() requires an id")).into_anyhow())
}

fn take_data<R, P>(ctx: &mut HookContext<R, P>, method: &str) -> Result<R> {
    ctx.data
        .take()
        .ok_or_else(|| FolioError::bad_request(format!("{method}() requires data")).into_anyhow())
}

fn one<R, P>(ctx: HookContext<R, P>, method: &str) -> Result<R> {
    match ctx.result {
        Some(HookResult::One(v)) => Ok(v),
        Some(HookResult::Many(_)) => Err(FolioError::general_error(format!(
            "{method}() produced many results unexpectedly"
        ))
        .into_anyhow()),
        None => Err(FolioError::general_error(format!("{method}() produced no result")).into_anyhow()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    type Log = Arc<Mutex<Vec<String>>>;

    struct Echo;

    #[async_trait]
    impl FolioService<String> for Echo {
        async fn find(&self, _ctx: &RequestContext, _params: ()) -> Result<Vec<String>> {
            Ok(vec!["one".into(), "two".into()])
        }

        async fn create(&self, _ctx: &RequestContext, data: String, _params: ()) -> Result<String> {
            if data == "boom" {
                return Err(FolioError::bad_request("boom").into_anyhow());
            }
            Ok(format!("created:{data}"))
        }
    }

    struct Record(&'static str, Log);

    #[async_trait]
    impl BeforeHook<String, ()> for Record {
        async fn run(&self, _ctx: &mut HookContext<String, ()>) -> Result<()> {
            self.1.lock().push(self.0.to_string());
            Ok(())
        }
    }

    #[async_trait]
    impl AfterHook<String, ()> for Record {
        async fn run(&self, _ctx: &mut HookContext<String, ()>) -> Result<()> {
            self.1.lock().push(self.0.to_string());
            Ok(())
        }
    }

    struct Upper;

    #[async_trait]
    impl BeforeHook<String, ()> for Upper {
        async fn run(&self, ctx: &mut HookContext<String, ()>) -> Result<()> {
            if let Some(d) = ctx.data.as_mut() {
                *d = d.to_uppercase();
            }
            Ok(())
        }
    }

    struct Recover;

    #[async_trait]
    impl ErrorHook<String, ()> for Recover {
        async fn run(&self, ctx: &mut HookContext<String, ()>) -> Result<()> {
            ctx.error = None;
            ctx.result = Some(HookResult::One("recovered".into()));
            Ok(())
        }
    }

    fn app() -> FolioApp<String> {
        let app = FolioApp::new();
        app.register_service("echo", Arc::new(Echo));
        app
    }

    #[tokio::test]
    async fn hooks_run_global_then_service_and_after_in_reverse() {
        let app = app();
        let log: Log = Arc::new(Mutex::new(Vec::new()));

        app.hooks(|h| {
            h.before_all(Arc::new(Record("global-before", log.clone())));
            h.after_all(Arc::new(Record("global-after", log.clone())));
        });
        let svc = app.service("echo").unwrap().hooks(|h| {
            h.before_create(Arc::new(Record("svc-before", log.clone())));
            h.after(ServiceMethodKind::Create, Arc::new(Record("svc-after", log.clone())));
            h.before_create(Arc::new(Upper));
        });

        let out = svc
            .create(RequestContext::internal(), "hi".into(), ())
            .await
            .unwrap();

        assert_eq!(out, "created:HI");
        assert_eq!(
            *log.lock(),
            vec!["global-before", "svc-before", "svc-after", "global-after"]
        );
    }

    #[tokio::test]
    async fn error_hooks_can_recover() {
        let app = app();
        let svc = app
            .service("echo")
            .unwrap()
            .hooks(|h| {
                h.error(ServiceMethodKind::Create, Arc::new(Recover));
            });

        let out = svc
            .create(RequestContext::internal(), "boom".into(), ())
            .await
            .unwrap();
        assert_eq!(out, "recovered");
    }

    #[tokio::test]
    async fn errors_propagate_without_recovery() {
        let svc = app().service("echo").unwrap();

        let err = svc
            .create(RequestContext::internal(), "boom".into(), ())
            .await
            .unwrap_err();
        assert_eq!(FolioError::from_anyhow(&err).unwrap().kind, ErrorKind::BadRequest);

        let err = svc
            .get(RequestContext::internal(), "1", ())
            .await
            .unwrap_err();
        assert_eq!(
            FolioError::from_anyhow(&err).unwrap().kind,
            ErrorKind::NotImplemented
        );
    }

    #[tokio::test]
    async fn unknown_service_is_not_found() {
        let err = app().service("nope").err().unwrap();
        assert_eq!(FolioError::from_anyhow(&err).unwrap().kind, ErrorKind::NotFound);
    }

    #[test]
    fn config_is_shared_between_clones() {
        let app = app();
        let clone = app.clone();
        clone.set("http.port", "5000");
        assert_eq!(app.get("http.port").as_deref(), Some("5000"));
        assert_eq!(app.config_snapshot().get_u64("http.port"), Some(5000));
    }
}
