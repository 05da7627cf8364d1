//! Model loading and the cross-layer duplicate check.

mod support;

use mares::{check_duplicates, load_models, BootError, Model, ModuleRegistry};
use std::collections::HashMap;
use std::sync::Arc;
use support::{lazy_db, model_index, StubModelModule};
use tempfile::TempDir;

#[tokio::test]
async fn missing_index_contributes_no_models() {
    let root = TempDir::new().unwrap();
    let registry = ModuleRegistry::new();

    let models = load_models(root.path(), &registry, &lazy_db()).await.unwrap();
    assert!(models.is_empty());
}

#[tokio::test]
async fn models_are_keyed_by_self_reported_name() {
    let root = TempDir::new().unwrap();
    model_index(root.path(), &["user_module"]);
    let mut registry = ModuleRegistry::new();
    let (module, _synced) = StubModelModule::new("users");
    registry.register_model_module("user_module", module);

    let models = load_models(root.path(), &registry, &lazy_db()).await.unwrap();
    assert!(models.contains_key("users"));
    assert!(!models.contains_key("user_module"));
}

#[tokio::test]
async fn unknown_model_module_is_fatal() {
    let root = TempDir::new().unwrap();
    model_index(root.path(), &["ghost"]);
    let registry = ModuleRegistry::new();

    let err = load_models(root.path(), &registry, &lazy_db())
        .await
        .err()
        .unwrap();
    assert!(matches!(
        err,
        BootError::UnknownModule { kind: "model", ref name } if name == "ghost"
    ));
}

#[tokio::test]
async fn malformed_index_is_fatal() {
    let root = TempDir::new().unwrap();
    support::write_file(&root.path().join(mares::MODEL_INDEX), "[ oops");
    let registry = ModuleRegistry::new();

    let err = load_models(root.path(), &registry, &lazy_db())
        .await
        .err()
        .unwrap();
    assert!(matches!(err, BootError::ModelLoad { .. }));
}

#[tokio::test]
async fn db_handle_awaits_are_memoized() {
    let db = lazy_db();
    let first = db.get().await.unwrap() as *const _;
    let clone = db.clone();
    let second = clone.get().await.unwrap() as *const _;
    assert_eq!(first, second);
}

fn layer_of(names: &[&'static str]) -> HashMap<String, Arc<dyn Model>> {
    let mut layer: HashMap<String, Arc<dyn Model>> = HashMap::new();
    for &name in names {
        layer.insert(
            name.to_string(),
            Arc::new(support::StubModel {
                name,
                synced: Default::default(),
            }),
        );
    }
    layer
}

#[test]
fn duplicate_names_are_aggregated_across_layers() {
    let layers = [layer_of(&["a", "b"]), layer_of(&["b", "c"])];
    let err = check_duplicates(layers.iter()).unwrap_err();
    assert_eq!(err.duplicate_model_names(), Some(&["b".to_string()][..]));

    let layers = [layer_of(&["a"]), layer_of(&["b"]), layer_of(&["c"])];
    assert!(check_duplicates(layers.iter()).is_ok());
}
