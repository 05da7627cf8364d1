//! Example consumer: registers a route module and a model module, attaches
//! the bundled `modules/shop` root, and serves.
//!
//! Run from this directory (`modules/shop` is resolved relative to the
//! working directory): `cargo run`

use async_trait::async_trait;
use axum::routing::get;
use axum::{Json, Router};
use mares::{DbHandle, Mares, Model, ModelModule, RouteModule};
use sqlx::PgPool;
use std::sync::Arc;

struct CatalogRoutes;

impl RouteModule for CatalogRoutes {
    fn routes(&self) -> Router {
        Router::new()
            .route("/catalog", get(list_catalog))
            .route("/catalog/featured", get(featured))
    }
}

async fn list_catalog() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "items": [] }))
}

async fn featured() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "items": [], "curated": true }))
}

struct Products {
    pool: PgPool,
}

#[async_trait]
impl Model for Products {
    fn name(&self) -> &str {
        "products"
    }

    async fn sync(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS products (
                id BIGSERIAL PRIMARY KEY,
                name TEXT NOT NULL,
                price_cents BIGINT NOT NULL DEFAULT 0
            )",
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

struct ProductsModule;

#[async_trait]
impl ModelModule for ProductsModule {
    async fn build(&self, pool: &PgPool) -> Result<Arc<dyn Model>, sqlx::Error> {
        Ok(Arc::new(Products { pool: pool.clone() }))
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("mares=debug")),
        )
        .init();

    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "postgres://localhost/mares".into());

    let mut app = Mares::new("example-consumer", env!("CARGO_PKG_VERSION"));
    app.register_route_module("catalog", CatalogRoutes);
    app.register_model_module("products", ProductsModule);
    app.add_main_db(DbHandle::connect(&database_url));
    app.attach("modules/shop", 0).await?;

    let server = app.listen(3000).await?;
    tracing::info!("serving on http://127.0.0.1:{}", server.addr().port());
    server.join().await?;
    Ok(())
}
