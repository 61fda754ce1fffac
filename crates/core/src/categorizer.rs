use crate::models::PackageCategory;

/// Namespace used for internal packages when no go.mod module path is found
pub const DEFAULT_LEGACY_PREFIX: &str = "xiaoiron.com/admin";

/// Categorizes Go import paths as stdlib, third-party or internal
#[derive(Debug, Clone)]
pub struct PackageClassifier {
    /// Module path from go.mod, may be empty
    module_root: String,
    /// Fallback namespace used only when `module_root` is empty
    legacy_prefix: String,
}

impl PackageClassifier {
    pub fn new(module_root: impl Into<String>, legacy_prefix: impl Into<String>) -> Self {
        Self {
            module_root: module_root.into(),
            legacy_prefix: legacy_prefix.into(),
        }
    }

    pub fn module_root(&self) -> &str {
        &self.module_root
    }

    /// Prefix that marks a package as internal: the module root, or the
    /// legacy prefix when the module root is empty
    pub fn internal_prefix(&self) -> &str {
        if self.module_root.is_empty() {
            &self.legacy_prefix
        } else {
            &self.module_root
        }
    }

    /// Categorize an import path
    pub fn classify(&self, import_path: &str) -> PackageCategory {
        // 1. Stdlib paths have no domain in their first segment
        let first_segment = import_path.split('/').next().unwrap_or(import_path);
        if !first_segment.contains('.') {
            return PackageCategory::Standard;
        }

        // 2/3. Under the module root (or the legacy namespace)
        if self.is_internal(import_path) {
            return PackageCategory::Internal;
        }

        // 4. Anything else is somebody else's module
        PackageCategory::ThirdParty
    }

    /// Whether `import_path` lives under the internal prefix
    pub fn is_internal(&self, import_path: &str) -> bool {
        has_path_prefix(import_path, self.internal_prefix())
    }

    /// Directory of an internal package relative to the project root.
    ///
    /// Returns `None` for non-internal paths and an empty string for the
    /// module root itself.
    pub fn internal_relative_path<'a>(&self, import_path: &'a str) -> Option<&'a str> {
        if self.classify(import_path) != PackageCategory::Internal {
            return None;
        }
        let rest = &import_path[self.internal_prefix().len()..];
        Some(rest.strip_prefix('/').unwrap_or(rest))
    }
}

/// Segment-respecting prefix test: `foo/bar` matches `foo/bar` and
/// `foo/bar/baz` but not `foo/bar2`. An empty prefix matches nothing.
pub fn has_path_prefix(path: &str, prefix: &str) -> bool {
    if prefix.is_empty() {
        return false;
    }
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}
