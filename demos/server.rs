//! Demo server: composes two weighted roots read from env, with an explicit
//! log level instead of any environment-driven logging switch.
//!
//! Env: DATABASE_URL, MARES_ROOT (default example_consumer/modules/shop),
//! MARES_WEIGHT (default 0), PORT (default 3000).

use async_trait::async_trait;
use axum::routing::get;
use axum::Router;
use mares::{DbHandle, Mares, Model, ModelModule, Options, Weight};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::level_filters::LevelFilter;

struct Products {
    pool: PgPool,
}

#[async_trait]
impl Model for Products {
    fn name(&self) -> &str {
        "products"
    }

    async fn sync(&self) -> Result<(), sqlx::Error> {
        sqlx::query("CREATE TABLE IF NOT EXISTS products (id BIGSERIAL PRIMARY KEY, name TEXT NOT NULL)")
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

    let options = Options {
        log_level: Some(LevelFilter::DEBUG),
        ..Options::default()
    };
    let mut app = Mares::with_options("demo-server", env!("CARGO_PKG_VERSION"), options);

    app.register_route_module("catalog", || {
        Router::new().route("/catalog", get(|| async { "[]" }))
    });
    app.register_route_module("status", || {
        Router::new().route("/status", get(|| async { "ok" }))
    });
    app.register_model_module("products", ProductsModule);

    if let Ok(database_url) = std::env::var("DATABASE_URL") {
        app.add_main_db(DbHandle::connect(database_url));
    }

    let root =
        std::env::var("MARES_ROOT").unwrap_or_else(|_| "example_consumer/modules/shop".into());
    let weight = match std::env::var("MARES_WEIGHT") {
        Ok(raw) => Weight::parse(&raw)?,
        Err(_) => Weight::default(),
    };
    app.attach(&root, weight).await?;

    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3000);
    let server = app.listen(port).await?;
    server.join().await?;
    Ok(())
}
