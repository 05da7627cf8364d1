//! Bounded recursive discovery of route entries under `<root>/apis`.

use crate::error::BootError;
use crate::module::ModuleRegistry;
use axum::Router;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Reserved file name marking a route entry.
pub const ROUTE_ENTRY: &str = "weld.json";

#[derive(Deserialize)]
struct RouteEntry {
    module: String,
}

/// Walk `root/apis` and collect one router per discovered entry, keyed by the
/// entry's absolute path.
///
/// Depth convention: `apis` itself is level 0 and a directory is descended
/// into only while its level is at most `max_depth`, so `max_depth = 1` picks
/// up entries in `apis` and its direct children but nothing deeper.
///
/// Entries naming an unregistered module are skipped; an unreadable or
/// malformed entry is fatal. A missing `apis` directory yields an empty map.
pub fn discover_routers(
    root: &Path,
    max_depth: usize,
    registry: &ModuleRegistry,
) -> Result<BTreeMap<PathBuf, Router>, BootError> {
    let apis = root.join("apis");
    let mut routers = BTreeMap::new();
    if !apis.is_dir() {
        return Ok(routers);
    }
    walk(&apis, 0, max_depth, registry, &mut routers)?;
    Ok(routers)
}

fn walk(
    dir: &Path,
    depth: usize,
    max_depth: usize,
    registry: &ModuleRegistry,
    routers: &mut BTreeMap<PathBuf, Router>,
) -> Result<(), BootError> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_dir() {
            if depth + 1 <= max_depth {
                walk(&path, depth + 1, max_depth, registry, routers)?;
            } else {
                tracing::debug!(dir = %path.display(), max_depth, "depth bound reached, not descending");
            }
        } else if entry.file_name() == ROUTE_ENTRY {
            let raw = fs::read_to_string(&path).map_err(|source| BootError::RouteLoad {
                path: path.clone(),
                source: source.into(),
            })?;
            let parsed: RouteEntry = serde_json::from_str(&raw).map_err(|source| {
                BootError::RouteLoad {
                    path: path.clone(),
                    source: source.into(),
                }
            })?;
            match registry.route_module(&parsed.module) {
                Some(module) => {
                    let abs = path.canonicalize().unwrap_or(path);
                    routers.insert(abs, module.routes());
                }
                // Not a registered router; skipped the same way a non-router
                // export would be.
                None => tracing::debug!(
                    module = %parsed.module,
                    path = %path.display(),
                    "skipping entry for unregistered route module"
                ),
            }
        }
        // files with any other name are ignored
    }
    Ok(())
}
