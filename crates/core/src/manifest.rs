//! go.mod reading
//!
//! Only the `module` directive is read. Requirements are never resolved.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;

pub const GO_MOD_FILE: &str = "go.mod";

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// The parts of a go.mod file the analyzer cares about
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoModule {
    /// Path to the go.mod file
    pub path: PathBuf,
    /// Module path, e.g. `example.com/app`
    pub module: String,
}

fn module_directive() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?m)^\s*module\s+(?:"([^"]*)"|`([^`]*)`|([^\s/][^\s]*))"#)
            .expect("module directive pattern is valid")
    })
}

/// Extract the module path from go.mod contents
pub fn parse_module_path(contents: &str) -> Option<String> {
    let caps = module_directive().captures(contents)?;
    let module = caps
        .get(1)
        .or_else(|| caps.get(2))
        .or_else(|| caps.get(3))?
        .as_str()
        .trim();

    if module.is_empty() {
        None
    } else {
        Some(module.to_string())
    }
}

/// Read `<project_root>/go.mod`.
///
/// Returns `Ok(None)` when the file does not exist or declares no module.
pub fn read_go_mod(project_root: &Path) -> Result<Option<GoModule>, ManifestError> {
    let path = project_root.join(GO_MOD_FILE);
    if !path.is_file() {
        return Ok(None);
    }

    let contents = fs::read_to_string(&path).map_err(|source| ManifestError::Read {
        path: path.clone(),
        source,
    })?;

    Ok(parse_module_path(&contents).map(|module| GoModule {
        path,
        module,
    }))
}

/// Module root for `project_root`, empty when it cannot be determined.
///
/// A go.mod that exists but cannot be read is logged and treated as absent.
pub fn module_root(project_root: &Path) -> String {
    match read_go_mod(project_root) {
        Ok(Some(module)) => {
            tracing::debug!(module = %module.module, path = %module.path.display(), "found go.mod");
            module.module
        }
        Ok(None) => {
            tracing::debug!(root = %project_root.display(), "no go.mod module path found");
            String::new()
        }
        Err(e) => {
            tracing::warn!(error = %e, "ignoring unreadable go.mod");
            String::new()
        }
    }
}
