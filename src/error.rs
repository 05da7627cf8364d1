//! Typed startup errors. Every variant is fatal to the boot sequence; none
//! are retried, and a failure before bind leaves no listener behind.

use crate::weight::Weight;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BootError {
    #[error("weight must be a non-negative integer, got '{0}'")]
    InvalidWeight(String),
    #[error("duplicate weight: {0}")]
    DuplicateWeight(Weight),
    #[error("duplicate models: {}", .0.join(", "))]
    DuplicateModels(Vec<String>),
    #[error("route entry {}: {source}", .path.display())]
    RouteLoad {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("model index {}: {source}", .path.display())]
    ModelLoad {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("no registered {kind} module named '{name}'")]
    UnknownModule { kind: &'static str, name: String },
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

impl BootError {
    /// Offending names carried by a `DuplicateModels` error, if that is what
    /// this is.
    pub fn duplicate_model_names(&self) -> Option<&[String]> {
        match self {
            BootError::DuplicateModels(names) => Some(names),
            _ => None,
        }
    }
}
