//! mares: convention-driven application bootstrap for axum and PostgreSQL.
//!
//! Attachment roots contribute routers (route entries discovered under
//! `apis/`) and models (named by `models/sqlx/index.json`), layered by a
//! numeric weight and composed into a single running server. Higher weights
//! mount first and unmatched requests fall through to lower weights.

pub mod app;
pub mod db;
pub mod dburl;
pub mod error;
pub mod models;
pub mod module;
pub mod walker;
pub mod weight;

pub use app::{Mares, Options, ServerHandle};
pub use db::DbHandle;
pub use dburl::{parse_db_url, DbUrl};
pub use error::BootError;
pub use models::{check_duplicates, load_models, MODEL_INDEX};
pub use module::{Model, ModelModule, ModuleRegistry, RouteModule};
pub use walker::{discover_routers, ROUTE_ENTRY};
pub use weight::Weight;
