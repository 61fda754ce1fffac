//! Dependency traversal engine
//!
//! Extracts the imports of an entry file, classifies each one once, and in
//! deep mode expands internal packages into their non-test source files.
//! Import paths and file paths are tracked in two separate visited sets, so
//! every package is classified (and its directory listed) at most once and
//! every file is parsed at most once, cycles included.

use crate::categorizer::PackageClassifier;
use crate::config::{AnalyzeConfig, ConfigError, ParseErrorPolicy, SourceFilter};
use crate::manifest;
use crate::models::{
    AnalysisMetadata, AnalysisResult, AnalysisStats, ClassifiedPackages, PackageCategory,
    SkippedFile,
};
use crate::parsers::{create_parser, parse_file, ImportParser, ParserError};
use rayon::prelude::*;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum AnalyzeError {
    #[error(transparent)]
    Parse(#[from] ParserError),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Thread pool error: {0}")]
    ThreadPool(String),
}

/// Mutable state of one run
#[derive(Default)]
struct TraversalState {
    visited_imports: HashSet<String>,
    visited_files: HashSet<PathBuf>,
    packages: ClassifiedPackages,
    files: Vec<PathBuf>,
    skipped: Vec<SkippedFile>,
    stats: AnalysisStats,
}

impl TraversalState {
    /// Mark a file as visited. Returns false if it was seen before.
    fn visit_file(&mut self, path: &Path) -> bool {
        self.visited_files.insert(visit_key(path))
    }
}

/// Classifies the dependencies reachable from an entry file
pub struct DependencyAnalyzer {
    config: AnalyzeConfig,
    classifier: PackageClassifier,
    source_filter: SourceFilter,
}

impl DependencyAnalyzer {
    /// Build an analyzer. The module root comes from the config override or
    /// from `<project_root>/go.mod`; a missing go.mod leaves it empty.
    pub fn new(config: AnalyzeConfig) -> Result<Self, AnalyzeError> {
        let module_root = match config.module_root {
            Some(ref root) => root.clone(),
            None => manifest::module_root(&config.project_root),
        };
        let classifier = PackageClassifier::new(module_root, config.legacy_prefix.clone());
        let source_filter = SourceFilter::new(&config)?;

        Ok(Self {
            config,
            classifier,
            source_filter,
        })
    }

    pub fn classifier(&self) -> &PackageClassifier {
        &self.classifier
    }

    /// Analyze `entry` and everything deep mode reaches from it.
    ///
    /// Every call starts from empty visited and classification sets.
    pub fn analyze(&self, entry: &Path) -> Result<AnalysisResult, AnalyzeError> {
        let start = Instant::now();
        let mut state = TraversalState::default();
        let mut parser = create_parser()?;

        // The entry file is always fatal on failure
        state.visit_file(entry);
        let imports = parse_file(parser.as_mut(), entry)?;
        state.files.push(entry.to_path_buf());
        state.stats.files_parsed += 1;
        let discovered = self.process_imports(&mut state, imports, parser.as_ref());

        if self.config.threads == 1 {
            self.traverse_sequential(&mut state, parser.as_mut(), discovered)?;
        } else {
            self.traverse_parallel(&mut state, parser.as_ref(), discovered)?;
        }

        state.stats.stdlib_packages = state.packages.stdlib.len();
        state.stats.third_party_packages = state.packages.third_party.len();
        state.stats.internal_packages = state.packages.internal.len();

        let duration = start.elapsed();
        tracing::info!(
            entry = %entry.display(),
            files = state.stats.files_parsed,
            packages = state.packages.total(),
            skipped = state.skipped.len(),
            elapsed_ms = duration.as_millis() as u64,
            "analysis finished"
        );

        Ok(AnalysisResult {
            entry: entry.to_path_buf(),
            project_root: self.config.project_root.clone(),
            module_root: self.classifier.module_root().to_string(),
            deep: self.config.deep,
            packages: state.packages,
            files: state.files,
            skipped: state.skipped,
            stats: state.stats,
            metadata: AnalysisMetadata {
                duration_ms: duration.as_millis() as u64,
                timestamp: chrono::Utc::now().to_rfc3339(),
                tool_version: env!("CARGO_PKG_VERSION").to_string(),
            },
        })
    }

    /// Depth-first over an explicit stack of pending files
    fn traverse_sequential(
        &self,
        state: &mut TraversalState,
        parser: &mut dyn ImportParser,
        discovered: Vec<PathBuf>,
    ) -> Result<(), AnalyzeError> {
        // Reversed so files come off the stack in directory order
        let mut pending: Vec<PathBuf> = discovered.into_iter().rev().collect();

        while let Some(file) = pending.pop() {
            match parse_file(parser, &file) {
                Ok(imports) => {
                    state.files.push(file);
                    state.stats.files_parsed += 1;
                    let found = self.process_imports(state, imports, parser);
                    pending.extend(found.into_iter().rev());
                }
                Err(e) => self.handle_parse_failure(state, file, e)?,
            }
        }

        Ok(())
    }

    /// Parse each wave of discovered files concurrently, then merge the
    /// results in wave order on this thread. Visited-set updates only happen
    /// during the merge.
    fn traverse_parallel(
        &self,
        state: &mut TraversalState,
        filter_parser: &dyn ImportParser,
        discovered: Vec<PathBuf>,
    ) -> Result<(), AnalyzeError> {
        let mut builder = rayon::ThreadPoolBuilder::new();
        if self.config.threads > 0 {
            builder = builder.num_threads(self.config.threads);
        }
        let pool = builder
            .build()
            .map_err(|e| AnalyzeError::ThreadPool(e.to_string()))?;

        let mut wave = discovered;
        while !wave.is_empty() {
            let parsed: Vec<Result<Vec<String>, ParserError>> = pool.install(|| {
                wave.par_iter()
                    .map_init(create_parser, |parser, path| match parser {
                        Ok(parser) => parse_file(parser.as_mut(), path),
                        Err(e) => Err(ParserError::InitError(e.to_string())),
                    })
                    .collect()
            });

            let mut next = Vec::new();
            for (file, result) in wave.into_iter().zip(parsed) {
                match result {
                    Ok(imports) => {
                        state.files.push(file);
                        state.stats.files_parsed += 1;
                        next.extend(self.process_imports(state, imports, filter_parser));
                    }
                    Err(e) => self.handle_parse_failure(state, file, e)?,
                }
            }
            wave = next;
        }

        Ok(())
    }

    /// Classify unseen imports and return the files deep mode should visit
    /// next, in discovery order
    fn process_imports(
        &self,
        state: &mut TraversalState,
        imports: Vec<String>,
        parser: &dyn ImportParser,
    ) -> Vec<PathBuf> {
        let mut discovered = Vec::new();

        for import in imports {
            state.stats.imports_seen += 1;
            if !state.visited_imports.insert(import.clone()) {
                continue;
            }

            let category = self.classifier.classify(&import);
            let expand = self.config.deep && category == PackageCategory::Internal;
            let dir = if expand { self.package_dir(&import) } else { None };
            state.packages.insert(import, category);

            let Some(dir) = dir else { continue };
            let Some(files) = self.package_files(&dir, parser) else {
                continue;
            };
            state.stats.directories_expanded += 1;

            for file in files {
                if state.visit_file(&file) {
                    discovered.push(file);
                }
            }
        }

        discovered
    }

    /// On-disk directory of an internal package
    fn package_dir(&self, import: &str) -> Option<PathBuf> {
        let relative = self.classifier.internal_relative_path(import)?;
        if relative.is_empty() {
            Some(self.config.project_root.clone())
        } else {
            Some(self.config.project_root.join(relative))
        }
    }

    /// Non-test source files directly inside `dir`, sorted by name.
    /// `None` when `dir` is missing, not a directory, or unreadable.
    fn package_files(&self, dir: &Path, parser: &dyn ImportParser) -> Option<Vec<PathBuf>> {
        if !dir.is_dir() {
            tracing::debug!(dir = %dir.display(), "no package directory, nothing to expand");
            return None;
        }
        if let Err(e) = fs::read_dir(dir) {
            tracing::debug!(dir = %dir.display(), error = %e, "unreadable package directory");
            return None;
        }

        let files: Vec<PathBuf> = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|entry| {
                entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| parser.is_source_file(name))
            })
            .map(|entry| entry.into_path())
            .filter(|path| path.is_file())
            .filter(|path| {
                let ignored = self.source_filter.should_ignore(path);
                if ignored {
                    tracing::debug!(file = %path.display(), "ignored by pattern");
                }
                !ignored
            })
            .collect();

        tracing::debug!(dir = %dir.display(), files = files.len(), "expanding package");
        Some(files)
    }

    fn handle_parse_failure(
        &self,
        state: &mut TraversalState,
        file: PathBuf,
        error: ParserError,
    ) -> Result<(), AnalyzeError> {
        match self.config.parse_error_policy {
            ParseErrorPolicy::Abort => Err(error.into()),
            ParseErrorPolicy::Skip => {
                tracing::warn!(file = %file.display(), error = %error, "skipping unparsable file");
                state.skipped.push(SkippedFile {
                    path: file,
                    reason: error.to_string(),
                });
                Ok(())
            }
        }
    }
}

/// Analyze one entry file with `config`
pub fn analyze_file(entry: &Path, config: AnalyzeConfig) -> Result<AnalysisResult, AnalyzeError> {
    DependencyAnalyzer::new(config)?.analyze(entry)
}

/// Key for the file visited set, so `a/../a/x.go` and `a/x.go` are one file
fn visit_key(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
