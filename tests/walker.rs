//! Route discovery: depth bounds, skip rules, and fatal entries.

mod support;

use mares::{discover_routers, BootError, ModuleRegistry};
use support::{route_entry, static_route, write_file};
use tempfile::TempDir;

fn registry_with(names: &[&str]) -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    for name in names {
        registry.register_route_module(*name, static_route("/probe", "probe"));
    }
    registry
}

#[test]
fn missing_apis_dir_yields_empty_mapping() {
    let root = TempDir::new().unwrap();
    let registry = registry_with(&["a"]);

    let routers = discover_routers(root.path(), 7, &registry).unwrap();
    assert!(routers.is_empty());
}

#[test]
fn max_depth_one_excludes_entries_two_levels_down() {
    let root = TempDir::new().unwrap();
    let apis = root.path().join("apis");
    route_entry(&apis, "a");
    route_entry(&apis.join("one"), "b");
    route_entry(&apis.join("one").join("two"), "c");
    let registry = registry_with(&["a", "b", "c"]);

    let shallow = discover_routers(root.path(), 1, &registry).unwrap();
    assert_eq!(shallow.len(), 2);

    let deep = discover_routers(root.path(), 7, &registry).unwrap();
    assert_eq!(deep.len(), 3);
}

#[test]
fn default_depth_reaches_seven_levels_but_not_eight() {
    let root = TempDir::new().unwrap();
    let mut dir = root.path().join("apis");
    for level in 1..=8 {
        dir = dir.join(format!("d{}", level));
        if level == 7 || level == 8 {
            route_entry(&dir, "a");
        }
    }
    let registry = registry_with(&["a"]);

    let routers = discover_routers(root.path(), 7, &registry).unwrap();
    assert_eq!(routers.len(), 1);
    let only = routers.keys().next().unwrap();
    assert!(only.to_string_lossy().contains("d7"));
    assert!(!only.to_string_lossy().contains("d8"));
}

#[test]
fn entries_naming_unregistered_modules_are_skipped() {
    let root = TempDir::new().unwrap();
    route_entry(&root.path().join("apis"), "nobody-registered-this");
    let registry = registry_with(&["a"]);

    let routers = discover_routers(root.path(), 7, &registry).unwrap();
    assert!(routers.is_empty());
}

#[test]
fn files_with_other_names_are_ignored() {
    let root = TempDir::new().unwrap();
    let apis = root.path().join("apis");
    write_file(&apis.join("README.md"), "docs");
    write_file(&apis.join("routes.json"), r#"{ "module": "a" }"#);
    let registry = registry_with(&["a"]);

    let routers = discover_routers(root.path(), 7, &registry).unwrap();
    assert!(routers.is_empty());
}

#[test]
fn malformed_entry_is_fatal() {
    let root = TempDir::new().unwrap();
    write_file(&root.path().join("apis").join("weld.json"), "{ not json");
    let registry = registry_with(&["a"]);

    let err = discover_routers(root.path(), 7, &registry).unwrap_err();
    assert!(matches!(err, BootError::RouteLoad { .. }));
}

#[cfg(unix)]
#[test]
fn unreadable_entry_is_fatal_and_names_the_path() {
    let root = TempDir::new().unwrap();
    let apis = root.path().join("apis");
    std::fs::create_dir_all(&apis).unwrap();
    std::os::unix::fs::symlink(root.path().join("missing"), apis.join("weld.json")).unwrap();
    let registry = registry_with(&["a"]);

    let err = discover_routers(root.path(), 7, &registry).unwrap_err();
    assert!(matches!(
        err,
        BootError::RouteLoad { ref path, .. } if path.ends_with("weld.json")
    ));
}
