use std::path::Path;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::handler::Handler;
use axum::routing::get;
use axum::Router;
use folio_core::{FolioApp, FolioService};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::net::{TcpListener, ToSocketAddrs};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::middlewares::{MultipartConfig, MultipartToJson};
use crate::params::FromRestParams;
use crate::rest::{self, Mount};

pub struct AxumApp<R, P = ()>
where
    R: Send + Sync + 'static,
    P: Send + Sync + Clone + 'static,
{
    pub app: Arc<FolioApp<R, P>>,
    pub router: Router<()>,
}

impl<R, P> Clone for AxumApp<R, P>
where
    R: Send + Sync + 'static,
    P: Send + Sync + Clone + 'static,
{
    fn clone(&self) -> Self {
        Self {
            app: Arc::clone(&self.app),
            router: self.router.clone(),
        }
    }
}

impl<R, P> AxumApp<R, P>
where
    R: Send + Sync + 'static,
    P: Send + Sync + Clone + 'static,
{
    pub fn new(app: FolioApp<R, P>) -> Self {
        Self {
            app: Arc::new(app),
            router: Router::new(),
        }
    }

    pub fn use_get<H, T>(mut self, path: &str, handler: H) -> Self
    where
        H: Handler<T, ()> + Clone + Send + Sync + 'static,
        T: 'static,
    {
        self.router = self.router.route(path, get(handler));
        self
    }

    /// Plain GET endpoint outside the service pipeline (`/health` and the like).
    pub fn service<H, T>(self, path: &str, handler: H) -> Self
    where
        H: Handler<T, ()> + Clone + Send + Sync + 'static,
        T: 'static,
    {
        self.use_get(path, handler)
    }

    /// Register `service` under `path` (minus the leading slash) and mount its REST routes.
    pub fn use_service(self, path: &str, service: Arc<dyn FolioService<R, P>>) -> Self
    where
        R: Serialize + DeserializeOwned,
        P: FromRestParams,
    {
        self.mount(path, service, Mount::Collection)
    }

    /// Like [`use_service`](Self::use_service), but `GET /` answers the one record.
    pub fn use_singleton(self, path: &str, service: Arc<dyn FolioService<R, P>>) -> Self
    where
        R: Serialize + DeserializeOwned,
        P: FromRestParams,
    {
        self.mount(path, service, Mount::Singleton)
    }

    fn mount(mut self, path: &str, service: Arc<dyn FolioService<R, P>>, mount: Mount) -> Self
    where
        R: Serialize + DeserializeOwned,
        P: FromRestParams,
    {
        let name = path.trim_start_matches('/');
        self.app.register_service(name, service);

        let router = rest::service_router(Arc::new(name.to_string()), Arc::clone(&self.app), mount);
        self.router = self.router.nest(path, router);
        self
    }

    /// Serve files below `dir` at `path`.
    pub fn use_static(mut self, path: &str, dir: impl AsRef<Path>) -> Self {
        self.router = self
            .router
            .nest_service(path, ServeDir::new(dir.as_ref()));
        self
    }

    /// Stage multipart file parts for every route mounted so far.
    pub fn use_multipart(mut self, config: MultipartConfig) -> Self {
        self.router = self.router.layer(MultipartToJson::new(config));
        self
    }

    /// The router with the shared outer stack: tracing, permissive CORS
    /// and the JSON body limit.
    pub fn into_router(self, body_limit: usize) -> Router<()> {
        self.router
            .layer(DefaultBodyLimit::max(body_limit))
            .layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            )
            .layer(TraceLayer::new_for_http())
    }

    pub async fn listen<A>(self, addr: A, body_limit: usize) -> anyhow::Result<()>
    where
        A: ToSocketAddrs,
    {
        let listener = TcpListener::bind(addr).await?;
        tracing::info!(addr = ?listener.local_addr()?, "listening");
        axum::serve(listener, self.into_router(body_limit)).await?;
        Ok(())
    }
}

pub fn axum<R, P>(app: FolioApp<R, P>) -> AxumApp<R, P>
where
    R: Send + Sync + 'static,
    P: Send + Sync + Clone + 'static,
{
    AxumApp::new(app)
}
