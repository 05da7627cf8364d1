//! The orchestrator: attach weighted roots, register a database handle and
//! middleware, then `listen` to compose and serve everything.

use crate::db::DbHandle;
use crate::error::BootError;
use crate::models::{check_duplicates, load_models};
use crate::module::{Model, ModelModule, ModuleRegistry, RouteModule};
use crate::walker::discover_routers;
use crate::weight::Weight;
use axum::extract::Request;
use axum::response::IntoResponse;
use axum::routing::Route;
use axum::Router;
use std::collections::{BTreeMap, HashMap};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower::{Layer, Service};
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;

/// Orchestrator options. Logging is configured here explicitly; there is no
/// process-wide environment switch.
#[derive(Clone, Debug)]
pub struct Options {
    /// Maximum directory depth walked below `apis`.
    pub api_read_depth: usize,
    /// Request body cap mounted in the body-parsing slot.
    pub body_limit: usize,
    /// When set, installs a fmt subscriber at this level. Ignored if a
    /// subscriber is already installed.
    pub log_level: Option<LevelFilter>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            api_read_depth: 7,
            body_limit: 2 * 1024 * 1024,
            log_level: None,
        }
    }
}

struct RouterLayer {
    weight: Weight,
    routers: BTreeMap<PathBuf, Router>,
}

struct ModelLayer {
    weight: Weight,
    models: HashMap<String, Arc<dyn Model>>,
}

type MiddlewareFn = Box<dyn FnOnce(Router) -> Router + Send>;

/// Application bootstrap. Roots attach while configuring; a single `listen`
/// (or `build`) drains the layers into a running server.
pub struct Mares {
    name: String,
    version: String,
    options: Options,
    registry: ModuleRegistry,
    router_layers: Vec<RouterLayer>,
    model_layers: Vec<ModelLayer>,
    middleware: Vec<MiddlewareFn>,
    db: Option<DbHandle>,
}

/// An unnamed application: `untitled` v`0.0.1`.
impl Default for Mares {
    fn default() -> Self {
        Self::new("untitled", "0.0.1")
    }
}

impl Mares {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self::with_options(name, version, Options::default())
    }

    pub fn with_options(
        name: impl Into<String>,
        version: impl Into<String>,
        options: Options,
    ) -> Self {
        if let Some(level) = options.log_level {
            let _ = tracing_subscriber::fmt().with_max_level(level).try_init();
        }
        Self {
            name: name.into(),
            version: version.into(),
            options,
            registry: ModuleRegistry::new(),
            router_layers: Vec::new(),
            model_layers: Vec::new(),
            middleware: Vec::new(),
            db: None,
        }
    }

    pub fn register_route_module(
        &mut self,
        name: impl Into<String>,
        module: impl RouteModule + 'static,
    ) -> &mut Self {
        self.registry.register_route_module(name, module);
        self
    }

    pub fn register_model_module(
        &mut self,
        name: impl Into<String>,
        module: impl ModelModule + 'static,
    ) -> &mut Self {
        self.registry.register_model_module(name, module);
        self
    }

    /// Register the main database handle. Must precede any `attach` that
    /// should load models, and `listen`.
    pub fn add_main_db(&mut self, db: DbHandle) -> &mut Self {
        self.db = Some(db);
        self
    }

    pub fn db(&self) -> Option<&DbHandle> {
        self.db.as_ref()
    }

    /// Append a global middleware layer. Layers run in registration order,
    /// after body limiting and request tracing and before any router.
    pub fn middleware<L>(&mut self, layer: L) -> &mut Self
    where
        L: Layer<Route> + Clone + Send + Sync + 'static,
        L::Service: Service<Request> + Clone + Send + Sync + 'static,
        <L::Service as Service<Request>>::Response: IntoResponse + 'static,
        <L::Service as Service<Request>>::Error: Into<Infallible> + 'static,
        <L::Service as Service<Request>>::Future: Send + 'static,
    {
        self.middleware.push(Box::new(move |router| router.layer(layer)));
        self
    }

    /// Attach one root at `weight`: discover its routers and, when a database
    /// handle is registered, load its models.
    ///
    /// A weight already claimed by an earlier root is fatal for the whole
    /// root; neither layer changes. `attach` takes `&mut self`, so the
    /// concurrent-attach races of loosely typed renditions cannot occur here.
    pub async fn attach(
        &mut self,
        root: impl AsRef<Path>,
        weight: impl Into<Weight>,
    ) -> Result<(), BootError> {
        let root = root.as_ref();
        let weight = weight.into();

        let routers = discover_routers(root, self.options.api_read_depth, &self.registry)?;
        if self.router_layers.iter().any(|l| l.weight == weight) {
            return Err(BootError::DuplicateWeight(weight));
        }

        let models = match &self.db {
            Some(db) => load_models(root, &self.registry, db).await?,
            None => HashMap::new(),
        };

        tracing::debug!(
            root = %root.display(),
            %weight,
            routers = routers.len(),
            models = models.len(),
            "attached root"
        );
        self.router_layers.push(RouterLayer { weight, routers });
        self.model_layers.push(ModelLayer { weight, models });
        Ok(())
    }

    /// Everything `listen` does short of binding: duplicate validation,
    /// fire-and-forget schema sync, the database diagnostic await, and router
    /// composition. Public so tests and embedders can drive the composed
    /// router directly.
    pub async fn build(self) -> Result<Router, BootError> {
        self.prepare_db().await?;
        let (app, _mounted) = self.compose();
        Ok(app)
    }

    /// Validate, sync, compose, bind, and serve. Consumes the orchestrator;
    /// no root can attach once the server is up.
    pub async fn listen(self, port: u16) -> Result<ServerHandle, BootError> {
        self.prepare_db().await?;

        let name = self.name.clone();
        let version = self.version.clone();
        let (app, mounted) = self.compose();

        let listener = TcpListener::bind(("0.0.0.0", port)).await?;
        let addr = listener.local_addr()?;
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
        });

        tracing::info!(count = mounted, "api routers mounted");
        tracing::info!("{} v{} running on port {}", name, version, addr.port());
        Ok(ServerHandle {
            addr,
            shutdown: Some(shutdown_tx),
            task,
        })
    }

    /// Duplicate validation, schema sync, and the diagnostic await. Skipped
    /// entirely when no database handle is registered.
    async fn prepare_db(&self) -> Result<(), BootError> {
        let Some(db) = &self.db else { return Ok(()) };

        let layers = self.model_layers_desc();
        check_duplicates(layers.iter().map(|l| &l.models))?;

        for layer in &layers {
            for model in layer.models.values() {
                // Fire and forget: the listener binds without waiting for
                // schema reconciliation to finish.
                let model = Arc::clone(model);
                tokio::spawn(async move {
                    if let Err(err) = model.sync().await {
                        tracing::warn!(model = model.name(), %err, "schema sync failed");
                    }
                });
            }
        }

        db.get().await?;
        match db.info() {
            Some(info) => tracing::info!(
                host = %info.host,
                port = %info.port,
                database = info.database_name.as_deref().unwrap_or(""),
                "database connected"
            ),
            None => tracing::info!("database connected"),
        }
        Ok(())
    }

    fn model_layers_desc(&self) -> Vec<&ModelLayer> {
        let mut layers: Vec<&ModelLayer> = self.model_layers.iter().collect();
        layers.sort_by(|a, b| b.weight.cmp(&a.weight));
        layers
    }

    /// Assemble the fixed mount order. Requests flow body limit, trace, user
    /// middleware in registration order, routers by descending weight, and
    /// CORS on the final fall-through.
    fn compose(self) -> (Router, usize) {
        let Mares {
            options,
            mut router_layers,
            middleware,
            ..
        } = self;

        // Lowest-precedence end of the chain: CORS answers whatever falls
        // through every router, then a plain 404.
        let mut app = Router::new().layer(CorsLayer::permissive());
        let mut mounted = 0usize;

        // Mount by ascending weight so the highest weight ends up outermost
        // and sees requests first; unmatched requests fall through inward.
        router_layers.sort_by_key(|l| l.weight);
        for layer in router_layers {
            let weight = layer.weight;
            for (path, router) in layer.routers {
                tracing::debug!(entry = %path.display(), %weight, "mounting router");
                app = router.fallback_service(app);
                mounted += 1;
            }
        }

        // Applying user middleware in reverse registration order leaves the
        // first-registered layer outermost, so execution order matches
        // registration order.
        for mw in middleware.into_iter().rev() {
            app = mw(app);
        }
        app = app.layer(TraceLayer::new_for_http());
        app = app.layer(RequestBodyLimitLayer::new(options.body_limit));
        (app, mounted)
    }
}

/// Handle to the running server. Dropping it triggers graceful shutdown.
pub struct ServerHandle {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<std::io::Result<()>>,
}

impl ServerHandle {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Signal graceful shutdown and wait for the server task to drain.
    pub async fn shutdown(mut self) -> Result<(), BootError> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        let served = self.task.await.map_err(std::io::Error::other)?;
        served?;
        Ok(())
    }

    /// Run until the server exits on its own.
    pub async fn join(self) -> Result<(), BootError> {
        let served = self.task.await.map_err(std::io::Error::other)?;
        served?;
        Ok(())
    }
}
