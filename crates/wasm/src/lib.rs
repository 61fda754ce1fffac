//! WASM bindings for MTA Rust GoDeps
//!
//! Directory traversal needs a filesystem, so only the per-file pieces are
//! exposed: import extraction and classification of in-memory Go source.

use mta_rust_godeps_core::parsers::{GoParser, ImportParser};
use mta_rust_godeps_core::{ClassifiedPackages, PackageClassifier, DEFAULT_LEGACY_PREFIX};
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

/// Result envelope returned to JavaScript
#[derive(Serialize, Deserialize)]
pub struct WasmResult {
    pub success: bool,
    pub data: Option<String>,
    pub error: Option<String>,
}

impl WasmResult {
    fn ok(data: Option<String>) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }

    fn err(error: impl ToString) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.to_string()),
        }
    }

    fn into_js(self) -> JsValue {
        serde_wasm_bindgen::to_value(&self).unwrap_or(JsValue::NULL)
    }
}

fn extract(source: &str) -> Result<Vec<String>, String> {
    let mut parser = GoParser::new().map_err(|e| e.to_string())?;
    parser.parse(source).map_err(|e| e.to_string())
}

fn classify(source: &str, module_root: &str, legacy_prefix: Option<String>) -> Result<ClassifiedPackages, String> {
    let classifier = PackageClassifier::new(
        module_root,
        legacy_prefix.unwrap_or_else(|| DEFAULT_LEGACY_PREFIX.to_string()),
    );

    let mut packages = ClassifiedPackages::default();
    for import in extract(source)? {
        let category = classifier.classify(&import);
        packages.insert(import, category);
    }
    Ok(packages)
}

/// Parse a single Go file and return its import paths as JSON
#[wasm_bindgen]
pub fn parse_go_file(source: &str) -> JsValue {
    match extract(source) {
        Ok(imports) => WasmResult::ok(serde_json::to_string(&imports).ok()).into_js(),
        Err(e) => WasmResult::err(e).into_js(),
    }
}

/// Parse a single Go file and return its imports grouped by category as JSON
#[wasm_bindgen]
pub fn classify_go_file(source: &str, module_root: &str, legacy_prefix: Option<String>) -> JsValue {
    match classify(source, module_root, legacy_prefix) {
        Ok(packages) => WasmResult::ok(serde_json::to_string(&packages).ok()).into_js(),
        Err(e) => WasmResult::err(e).into_js(),
    }
}

/// Get the library version
#[wasm_bindgen]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_source() {
        let source = "package main\n\nimport (\n\t\"fmt\"\n\t\"example.com/app/x\"\n\t\"github.com/a/b\"\n)\n";
        let packages = classify(source, "example.com/app", None).unwrap();

        assert!(packages.stdlib.contains("fmt"));
        assert!(packages.internal.contains("example.com/app/x"));
        assert!(packages.third_party.contains("github.com/a/b"));
    }

    #[test]
    fn test_extract_reports_syntax_errors() {
        assert!(extract("import \"fmt\"\n").is_err());
    }
}
