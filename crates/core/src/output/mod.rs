mod json;
mod yaml;

pub use json::to_json;
pub use yaml::to_yaml;

use crate::models::{AnalysisResult, CategoryFilter, PackageCategory};

const BANNER_WIDTH: usize = 20;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Yaml,
}

/// How a result should be rendered
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportOptions {
    pub format: OutputFormat,
    pub filter: CategoryFilter,
    /// Mark each package with a check in text output
    pub verbose: bool,
}

/// Format an AnalysisResult according to the options. Categories excluded by
/// the filter are left out of every format.
pub fn format_report(result: &AnalysisResult, options: &ReportOptions) -> Result<String, FormatError> {
    match options.format {
        OutputFormat::Text => Ok(format_text(result, options.filter, options.verbose)),
        OutputFormat::Json => to_json(&result.filtered(options.filter)),
        OutputFormat::Yaml => to_yaml(&result.filtered(options.filter)),
    }
}

/// One-line description of the analysis mode
pub fn mode_line(deep: bool) -> &'static str {
    if deep {
        "Mode: deep analysis (recursing into internal packages)"
    } else {
        "Mode: shallow analysis (direct dependencies only)"
    }
}

fn banner(title: &str) -> String {
    let bar = "=".repeat(BANNER_WIDTH);
    format!("{bar} {title} {bar}")
}

/// Generate the human-readable grouped report
pub fn format_text(result: &AnalysisResult, filter: CategoryFilter, verbose: bool) -> String {
    let mut output = String::new();

    output.push('\n');
    output.push_str(&banner("Dependency Analysis"));
    output.push_str("\n\n");

    for category in PackageCategory::ALL {
        let packages = result.packages.get(category);
        if packages.is_empty() || !filter.includes(category) {
            continue;
        }

        output.push_str(&format!(
            "{} {} ({}):\n",
            category.icon(),
            category.label(),
            packages.len()
        ));
        // BTreeSet iteration is already sorted
        for pkg in packages {
            if verbose {
                output.push_str(&format!("  ✓ {}\n", pkg));
            } else {
                output.push_str(&format!("  {}\n", pkg));
            }
        }
        output.push('\n');
    }

    if !result.skipped.is_empty() {
        output.push_str(&format!("⚠ Skipped files ({}):\n", result.skipped.len()));
        for skipped in &result.skipped {
            output.push_str(&format!("  {} ({})\n", skipped.path.display(), skipped.reason));
        }
        output.push('\n');
    }

    output.push_str(&banner("Statistics"));
    output.push('\n');

    match filter.category() {
        None => {
            let total = result.packages.total();
            output.push_str(&format!("Total: {} packages\n", total));
            if total > 0 {
                for category in PackageCategory::ALL {
                    let count = result.packages.get(category).len();
                    output.push_str(&format!(
                        "  - {}: {} ({:.1}%)\n",
                        category.label(),
                        count,
                        count as f64 / total as f64 * 100.0
                    ));
                }
            }
        }
        Some(category) => {
            output.push_str(&format!(
                "{}: {} packages\n",
                category.label(),
                result.packages.get(category).len()
            ));
        }
    }

    output.push_str(&"=".repeat(BANNER_WIDTH * 2 + 12));
    output.push('\n');

    output
}

#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("YAML serialization error: {0}")]
    YamlError(#[from] serde_yaml::Error),
}


#[cfg(test)]
mod tests {
    use super::test_support::sample_result;
    use super::*;
    use crate::models::SkippedFile;
    use std::path::PathBuf;

    #[test]
    fn test_text_all_sections_sorted() {
        let result = sample_result(
            &["os", "fmt"],
            &["github.com/pkg/errors"],
            &["example.com/app/util"],
        );
        let text = format_text(&result, CategoryFilter::All, false);

        let fmt_pos = text.find("  fmt\n").unwrap();
        let os_pos = text.find("  os\n").unwrap();
        assert!(fmt_pos < os_pos);
        assert!(text.contains("📦 Standard library (2):"));
        assert!(text.contains("🌐 Third-party (1):"));
        assert!(text.contains("🏠 Internal (1):"));
        assert!(text.contains("Total: 4 packages"));
        assert!(text.contains("  - Standard library: 2 (50.0%)"));
        assert!(text.contains("  - Third-party: 1 (25.0%)"));
        assert!(!text.contains('✓'));
    }

    #[test]
    fn test_text_verbose_marks_packages() {
        let result = sample_result(&["fmt"], &[], &[]);
        let text = format_text(&result, CategoryFilter::All, true);
        assert!(text.contains("  ✓ fmt\n"));
    }

    #[test]
    fn test_text_empty_section_omitted() {
        let result = sample_result(&[], &["github.com/pkg/errors"], &[]);
        let text = format_text(&result, CategoryFilter::All, false);
        assert!(!text.contains("Standard library ("));
        assert!(text.contains("  - Standard library: 0 (0.0%)"));
    }

    #[test]
    fn test_text_zero_total_has_no_percentages() {
        let result = sample_result(&[], &[], &[]);
        let text = format_text(&result, CategoryFilter::All, false);
        assert!(text.contains("Total: 0 packages"));
        assert!(!text.contains('%'));
    }

    #[test]
    fn test_text_stdlib_filter_without_stdlib() {
        let result = sample_result(&[], &["github.com/pkg/errors"], &["example.com/app/x"]);
        let text = format_text(&result, CategoryFilter::Stdlib, false);

        assert!(!text.contains("📦"));
        assert!(!text.contains("github.com/pkg/errors"));
        assert!(text.contains("Standard library: 0 packages"));
        assert!(!text.contains("Total:"));
        assert!(!text.contains('%'));
    }

    #[test]
    fn test_text_internal_filter() {
        let result = sample_result(&["fmt"], &[], &["example.com/app/x", "example.com/app/y"]);
        let text = format_text(&result, CategoryFilter::Internal, false);

        assert!(text.contains("🏠 Internal (2):"));
        assert!(!text.contains("  fmt\n"));
        assert!(text.contains("Internal: 2 packages"));
    }

    #[test]
    fn test_text_lists_skipped_files() {
        let mut result = sample_result(&["fmt"], &[], &[]);
        result.skipped.push(SkippedFile {
            path: PathBuf::from("/repo/p/bad.go"),
            reason: "syntax error".to_string(),
        });
        let text = format_text(&result, CategoryFilter::All, false);
        assert!(text.contains("Skipped files (1)"));
        assert!(text.contains("/repo/p/bad.go"));
    }

    #[test]
    fn test_format_report_json_is_filtered() {
        let result = sample_result(&["fmt"], &["github.com/pkg/errors"], &[]);
        let options = ReportOptions {
            format: OutputFormat::Json,
            filter: CategoryFilter::ThirdParty,
            verbose: false,
        };
        let json = format_report(&result, &options).unwrap();
        assert!(json.contains("github.com/pkg/errors"));
        assert!(!json.contains("\"fmt\""));
    }

    #[test]
    fn test_mode_line() {
        assert!(mode_line(true).contains("deep"));
        assert!(mode_line(false).contains("shallow"));
    }
}
