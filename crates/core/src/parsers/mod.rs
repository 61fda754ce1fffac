mod go;

pub use go::GoParser;

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParserError {
    #[error("Failed to initialize parser: {0}")]
    InitError(String),
    #[error("Syntax error at line {line}, column {column}: {message}")]
    Syntax {
        line: usize,
        column: usize,
        message: String,
    },
    #[error("Failed to parse {}: {reason}", path.display())]
    ParseFile { path: PathBuf, reason: String },
}

/// Trait for language-specific import extractors
pub trait ImportParser: Send {
    /// Parse source code and return the import paths in declaration order
    fn parse(&mut self, source: &str) -> Result<Vec<String>, ParserError>;

    /// File extension of source files, without the dot
    fn extension(&self) -> &'static str;

    /// Whether a file name follows the language's test-file convention
    fn is_test_file(&self, file_name: &str) -> bool;

    /// Whether a file name is a non-test source file for this language
    fn is_source_file(&self, file_name: &str) -> bool {
        Path::new(file_name)
            .extension()
            .is_some_and(|ext| ext == self.extension())
            && !self.is_test_file(file_name)
    }
}

/// Create the import parser used by the analyzer
pub fn create_parser() -> Result<Box<dyn ImportParser>, ParserError> {
    Ok(Box::new(GoParser::new()?))
}

/// Read `path` and extract its imports.
///
/// Read failures and syntax errors both come back as
/// [`ParserError::ParseFile`] naming the file.
pub fn parse_file(parser: &mut dyn ImportParser, path: &Path) -> Result<Vec<String>, ParserError> {
    let source = fs::read_to_string(path).map_err(|e| ParserError::ParseFile {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    parser.parse(&source).map_err(|e| match e {
        ParserError::ParseFile { .. } => e,
        other => ParserError::ParseFile {
            path: path.to_path_buf(),
            reason: other.to_string(),
        },
    })
}
