//! Declared module interfaces and the explicit registry.
//!
//! Attachment roots name modules in their manifests; the registry maps those
//! names to implementations registered up front. Router capability is a trait
//! bound checked when the module is registered, not a runtime type test at
//! discovery time.

use async_trait::async_trait;
use axum::Router;
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Arc;

/// A set of routes contributed by one route entry.
pub trait RouteModule: Send + Sync {
    /// Build the router mounted for this module.
    fn routes(&self) -> Router;
}

/// Any `Fn() -> Router` closure is a route module.
impl<F> RouteModule for F
where
    F: Fn() -> Router + Send + Sync,
{
    fn routes(&self) -> Router {
        self()
    }
}

/// A named, schema-syncable unit of persistence, bound to a pool at build
/// time.
#[async_trait]
pub trait Model: Send + Sync {
    /// Stable model name. Must be unique across every attached layer.
    fn name(&self) -> &str;

    /// Reconcile the model's schema with the backing store.
    async fn sync(&self) -> Result<(), sqlx::Error>;
}

/// Factory for a [`Model`], invoked with the live pool during `attach`.
#[async_trait]
pub trait ModelModule: Send + Sync {
    async fn build(&self, pool: &PgPool) -> Result<Arc<dyn Model>, sqlx::Error>;
}

/// Explicit module registry: manifest name to implementation.
#[derive(Default)]
pub struct ModuleRegistry {
    routes: HashMap<String, Arc<dyn RouteModule>>,
    models: HashMap<String, Arc<dyn ModelModule>>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_route_module(
        &mut self,
        name: impl Into<String>,
        module: impl RouteModule + 'static,
    ) {
        self.routes.insert(name.into(), Arc::new(module));
    }

    pub fn register_model_module(
        &mut self,
        name: impl Into<String>,
        module: impl ModelModule + 'static,
    ) {
        self.models.insert(name.into(), Arc::new(module));
    }

    pub fn route_module(&self, name: &str) -> Option<&Arc<dyn RouteModule>> {
        self.routes.get(name)
    }

    pub fn model_module(&self, name: &str) -> Option<&Arc<dyn ModelModule>> {
        self.models.get(name)
    }
}
