use crate::categorizer::DEFAULT_LEGACY_PREFIX;
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Optional per-project configuration file, looked up in the project root
pub const CONFIG_FILE_NAME: &str = "godeps.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to build glob pattern: {0}")]
    GlobError(#[from] globset::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Invalid config file {}: {source}", path.display())]
    TomlError {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// What to do when a file discovered during deep traversal fails to parse.
/// The entry file always aborts the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseErrorPolicy {
    #[default]
    Abort,
    /// Record the file as skipped, log a warning, keep going
    Skip,
}

/// Configuration for one analysis run
#[derive(Debug, Clone)]
pub struct AnalyzeConfig {
    /// Directory that internal import paths are resolved against
    pub project_root: PathBuf,
    /// Module path override; read from go.mod when `None`
    pub module_root: Option<String>,
    /// Internal namespace used when no module path is known
    pub legacy_prefix: String,
    /// Expand internal packages into their files
    pub deep: bool,
    /// Extra glob patterns for files to leave out of deep traversal
    pub ignore_patterns: Vec<String>,
    pub parse_error_policy: ParseErrorPolicy,
    /// Number of threads (1 = sequential, 0 = auto)
    pub threads: usize,
}

impl Default for AnalyzeConfig {
    fn default() -> Self {
        Self {
            project_root: PathBuf::from("."),
            module_root: None,
            legacy_prefix: DEFAULT_LEGACY_PREFIX.to_string(),
            deep: false,
            ignore_patterns: vec![],
            parse_error_policy: ParseErrorPolicy::Abort,
            threads: 1,
        }
    }
}

impl AnalyzeConfig {
    pub fn new(project_root: PathBuf) -> Self {
        Self {
            project_root,
            ..Default::default()
        }
    }

    pub fn with_module_root(mut self, module_root: impl Into<String>) -> Self {
        self.module_root = Some(module_root.into());
        self
    }

    pub fn with_legacy_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.legacy_prefix = prefix.into();
        self
    }

    pub fn with_deep(mut self, deep: bool) -> Self {
        self.deep = deep;
        self
    }

    pub fn with_ignore_patterns(mut self, patterns: Vec<String>) -> Self {
        self.ignore_patterns = patterns;
        self
    }

    pub fn with_parse_error_policy(mut self, policy: ParseErrorPolicy) -> Self {
        self.parse_error_policy = policy;
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Overlay values from a config file. Fields already set explicitly by
    /// the caller should be applied after this.
    pub fn merge_file(mut self, file: &FileConfig) -> Self {
        if let Some(ref prefix) = file.legacy_prefix {
            self.legacy_prefix = prefix.clone();
        }
        if let Some(ref module_root) = file.module_root {
            self.module_root = Some(module_root.clone());
        }
        if let Some(deep) = file.deep {
            self.deep = deep;
        }
        if !file.ignore.is_empty() {
            self.ignore_patterns.extend(file.ignore.iter().cloned());
        }
        if let Some(true) = file.skip_unparsable {
            self.parse_error_policy = ParseErrorPolicy::Skip;
        }
        if let Some(threads) = file.threads {
            self.threads = threads;
        }
        self
    }
}

/// Contents of `godeps.toml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub module_root: Option<String>,
    pub legacy_prefix: Option<String>,
    pub deep: Option<bool>,
    pub ignore: Vec<String>,
    pub skip_unparsable: Option<bool>,
    pub threads: Option<usize>,
}

impl FileConfig {
    pub fn from_toml_str(contents: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|source| ConfigError::TomlError {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load an explicit config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents, path)
    }

    /// Load `<project_root>/godeps.toml` if it exists
    pub fn discover(project_root: &Path) -> Result<Option<Self>, ConfigError> {
        let path = project_root.join(CONFIG_FILE_NAME);
        if !path.is_file() {
            return Ok(None);
        }
        Self::load(&path).map(Some)
    }
}

/// Project root for a working directory: the directory itself, or its parent
/// when the tool is run from a `scripts` directory
pub fn project_root_for(cwd: &Path) -> PathBuf {
    match (cwd.file_name(), cwd.parent()) {
        (Some(name), Some(parent)) if name == "scripts" => parent.to_path_buf(),
        _ => cwd.to_path_buf(),
    }
}

/// Filter for files picked up while expanding an internal package
pub struct SourceFilter {
    custom_globs: GlobSet,
}

impl SourceFilter {
    pub fn new(config: &AnalyzeConfig) -> Result<Self, ConfigError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &config.ignore_patterns {
            builder.add(Glob::new(pattern)?);
        }
        Ok(Self {
            custom_globs: builder.build()?,
        })
    }

    /// Check if a path matches one of the user's ignore patterns
    pub fn should_ignore(&self, path: &Path) -> bool {
        let path_str = path.to_string_lossy();
        if self.custom_globs.is_match(&*path_str) {
            return true;
        }

        // Bare file-name patterns such as `*_gen.go`
        path.file_name()
            .is_some_and(|name| self.custom_globs.is_match(Path::new(name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AnalyzeConfig::default();
        assert_eq!(config.project_root, PathBuf::from("."));
        assert_eq!(config.legacy_prefix, DEFAULT_LEGACY_PREFIX);
        assert!(!config.deep);
        assert_eq!(config.threads, 1);
        assert_eq!(config.parse_error_policy, ParseErrorPolicy::Abort);
    }

    #[test]
    fn test_config_builder() {
        let config = AnalyzeConfig::new(PathBuf::from("/test"))
            .with_module_root("example.com/app")
            .with_deep(true)
            .with_ignore_patterns(vec!["*_gen.go".to_string()])
            .with_parse_error_policy(ParseErrorPolicy::Skip)
            .with_threads(4);

        assert_eq!(config.project_root, PathBuf::from("/test"));
        assert_eq!(config.module_root.as_deref(), Some("example.com/app"));
        assert!(config.deep);
        assert_eq!(config.ignore_patterns.len(), 1);
        assert_eq!(config.parse_error_policy, ParseErrorPolicy::Skip);
        assert_eq!(config.threads, 4);
    }

    #[test]
    fn test_file_config_merge() {
        let file = FileConfig::from_toml_str(
            "legacy_prefix = \"corp.example/legacy\"\nignore = [\"*_mock.go\"]\nskip_unparsable = true\nthreads = 0\n",
            Path::new("godeps.toml"),
        )
        .unwrap();

        let config = AnalyzeConfig::new(PathBuf::from("/p"))
            .with_ignore_patterns(vec!["*_gen.go".to_string()])
            .merge_file(&file);

        assert_eq!(config.legacy_prefix, "corp.example/legacy");
        assert_eq!(config.ignore_patterns, vec!["*_gen.go", "*_mock.go"]);
        assert_eq!(config.parse_error_policy, ParseErrorPolicy::Skip);
        assert_eq!(config.threads, 0);
        assert!(!config.deep);
    }

    #[test]
    fn test_file_config_rejects_unknown_keys() {
        let err = FileConfig::from_toml_str("colour = true\n", Path::new("godeps.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::TomlError { .. }));
    }

    #[test]
    fn test_file_config_discover() {
        let dir = TempDir::new().unwrap();
        assert!(FileConfig::discover(dir.path()).unwrap().is_none());

        fs::write(dir.path().join(CONFIG_FILE_NAME), "deep = true\n").unwrap();
        let file = FileConfig::discover(dir.path()).unwrap().unwrap();
        assert_eq!(file.deep, Some(true));
    }

    #[test]
    fn test_project_root_for_scripts_dir() {
        assert_eq!(
            project_root_for(Path::new("/repo/scripts")),
            PathBuf::from("/repo")
        );
        assert_eq!(project_root_for(Path::new("/repo")), PathBuf::from("/repo"));
        assert_eq!(project_root_for(Path::new("/")), PathBuf::from("/"));
    }

    #[test]
    fn test_source_filter() {
        let config = AnalyzeConfig::default()
            .with_ignore_patterns(vec!["*_gen.go".to_string(), "**/mocks/**".to_string()]);
        let filter = SourceFilter::new(&config).unwrap();

        assert!(filter.should_ignore(Path::new("/repo/pkg/models_gen.go")));
        assert!(filter.should_ignore(Path::new("/repo/pkg/mocks/store.go")));
        assert!(!filter.should_ignore(Path::new("/repo/pkg/models.go")));
    }

    #[test]
    fn test_invalid_glob() {
        let config = AnalyzeConfig::default().with_ignore_patterns(vec!["a[".to_string()]);
        assert!(SourceFilter::new(&config).is_err());
    }
}
