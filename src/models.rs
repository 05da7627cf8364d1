//! Model loading from the `models/sqlx/index.json` entry point, and the
//! cross-layer duplicate-name check.

use crate::db::DbHandle;
use crate::error::BootError;
use crate::module::{Model, ModuleRegistry};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Relative path of the model index below an attachment root.
pub const MODEL_INDEX: &str = "models/sqlx/index.json";

/// Load the models named by `root`'s index, keyed by each model's
/// self-reported name (the index entry only selects which factory runs).
///
/// A missing index means the root contributes no models. The handle is
/// awaited here so factories receive a live pool; repeated awaits return the
/// memoized pool.
pub async fn load_models(
    root: &Path,
    registry: &ModuleRegistry,
    db: &DbHandle,
) -> Result<HashMap<String, Arc<dyn Model>>, BootError> {
    let index_path = root.join(MODEL_INDEX);
    let mut models: HashMap<String, Arc<dyn Model>> = HashMap::new();
    if !index_path.is_file() {
        return Ok(models);
    }
    let raw = fs::read_to_string(&index_path).map_err(|source| BootError::ModelLoad {
        path: index_path.clone(),
        source: source.into(),
    })?;
    let names: Vec<String> = serde_json::from_str(&raw).map_err(|source| BootError::ModelLoad {
        path: index_path.clone(),
        source: source.into(),
    })?;

    let pool = db.get().await?;
    for name in names {
        let module = registry
            .model_module(&name)
            .ok_or_else(|| BootError::UnknownModule {
                kind: "model",
                name: name.clone(),
            })?;
        let model = module.build(pool).await?;
        tracing::debug!(module = %name, model = model.name(), "model built");
        models.insert(model.name().to_string(), model);
    }
    Ok(models)
}

/// Fail with every duplicated model name across `layers`, or succeed
/// silently. Callers pass layers in the same descending-weight order that
/// mounting later uses, so detection and mounting stay consistent.
pub fn check_duplicates<'a, I>(layers: I) -> Result<(), BootError>
where
    I: IntoIterator<Item = &'a HashMap<String, Arc<dyn Model>>>,
{
    let mut seen: HashSet<&str> = HashSet::new();
    let mut duplicated: BTreeSet<String> = BTreeSet::new();
    for layer in layers {
        for name in layer.keys() {
            if !seen.insert(name.as_str()) {
                duplicated.insert(name.clone());
            }
        }
    }
    if duplicated.is_empty() {
        Ok(())
    } else {
        Err(BootError::DuplicateModels(
            duplicated.into_iter().collect(),
        ))
    }
}
