//! MTA Rust GoDeps Core Library
//!
//! This library classifies the dependencies of a Go entry file and, in deep
//! mode, of every internal package it reaches.
//!
//! # Features
//!
//! - Extract import paths from Go files with tree-sitter (header only)
//! - Read the module path from `go.mod`
//! - Categorize imports as Standard, ThirdParty or Internal
//! - Recurse into internal packages with cycle and duplicate suppression
//! - Output results as a text report, JSON or YAML
//!
//! # Example
//!
//! ```no_run
//! use mta_rust_godeps_core::{AnalyzeConfig, DependencyAnalyzer, ReportOptions, format_report};
//! use std::path::{Path, PathBuf};
//!
//! let config = AnalyzeConfig::new(PathBuf::from(".")).with_deep(true);
//! let analyzer = DependencyAnalyzer::new(config).unwrap();
//! let result = analyzer.analyze(Path::new("cmd/server/main.go")).unwrap();
//!
//! let report = format_report(&result, &ReportOptions::default()).unwrap();
//! println!("{}", report);
//! ```

pub mod analyzer;
pub mod categorizer;
pub mod config;
pub mod manifest;
pub mod models;
pub mod output;
pub mod parsers;

// Re-exports for convenience
pub use analyzer::{analyze_file, AnalyzeError, DependencyAnalyzer};
pub use categorizer::{PackageClassifier, DEFAULT_LEGACY_PREFIX};
pub use config::{AnalyzeConfig, ConfigError, FileConfig, ParseErrorPolicy};
pub use models::*;
pub use output::{format_report, format_text, mode_line, FormatError, OutputFormat, ReportOptions};
pub use parsers::ParserError;
