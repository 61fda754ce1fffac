use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// Category of an imported package
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackageCategory {
    /// Standard library (no domain in the first path segment)
    Standard,
    /// Package from another module
    ThirdParty,
    /// Package that lives under the project's module root
    Internal,
}

impl PackageCategory {
    pub const ALL: [PackageCategory; 3] = [
        PackageCategory::Standard,
        PackageCategory::ThirdParty,
        PackageCategory::Internal,
    ];

    /// Heading used by the text reporter
    pub fn label(&self) -> &'static str {
        match self {
            PackageCategory::Standard => "Standard library",
            PackageCategory::ThirdParty => "Third-party",
            PackageCategory::Internal => "Internal",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            PackageCategory::Standard => "📦",
            PackageCategory::ThirdParty => "🌐",
            PackageCategory::Internal => "🏠",
        }
    }
}

impl fmt::Display for PackageCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Which categories a report should show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CategoryFilter {
    #[default]
    All,
    Stdlib,
    ThirdParty,
    Internal,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid type '{value}' (supported types: stdlib, third-party, internal, all)")]
pub struct InvalidFilterError {
    pub value: String,
}

impl CategoryFilter {
    pub const VALUES: [&'static str; 4] = ["all", "stdlib", "third-party", "internal"];

    /// Whether packages of `category` pass this filter
    pub fn includes(&self, category: PackageCategory) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Stdlib => category == PackageCategory::Standard,
            CategoryFilter::ThirdParty => category == PackageCategory::ThirdParty,
            CategoryFilter::Internal => category == PackageCategory::Internal,
        }
    }

    /// The single category selected, `None` for `all`
    pub fn category(&self) -> Option<PackageCategory> {
        match self {
            CategoryFilter::All => None,
            CategoryFilter::Stdlib => Some(PackageCategory::Standard),
            CategoryFilter::ThirdParty => Some(PackageCategory::ThirdParty),
            CategoryFilter::Internal => Some(PackageCategory::Internal),
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = InvalidFilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(CategoryFilter::All),
            "stdlib" => Ok(CategoryFilter::Stdlib),
            "third-party" => Ok(CategoryFilter::ThirdParty),
            "internal" => Ok(CategoryFilter::Internal),
            other => Err(InvalidFilterError {
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CategoryFilter::All => "all",
            CategoryFilter::Stdlib => "stdlib",
            CategoryFilter::ThirdParty => "third-party",
            CategoryFilter::Internal => "internal",
        };
        f.write_str(s)
    }
}

/// The three disjoint classification sets
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedPackages {
    pub stdlib: BTreeSet<String>,
    pub third_party: BTreeSet<String>,
    pub internal: BTreeSet<String>,
}

impl ClassifiedPackages {
    /// Record `package` under `category`. Returns false if it was already present.
    pub fn insert(&mut self, package: String, category: PackageCategory) -> bool {
        self.get_mut(category).insert(package)
    }

    pub fn get(&self, category: PackageCategory) -> &BTreeSet<String> {
        match category {
            PackageCategory::Standard => &self.stdlib,
            PackageCategory::ThirdParty => &self.third_party,
            PackageCategory::Internal => &self.internal,
        }
    }

    fn get_mut(&mut self, category: PackageCategory) -> &mut BTreeSet<String> {
        match category {
            PackageCategory::Standard => &mut self.stdlib,
            PackageCategory::ThirdParty => &mut self.third_party,
            PackageCategory::Internal => &mut self.internal,
        }
    }

    pub fn total(&self) -> usize {
        self.stdlib.len() + self.third_party.len() + self.internal.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Copy keeping only the categories selected by `filter`
    pub fn filtered(&self, filter: CategoryFilter) -> Self {
        let keep = |c: PackageCategory| {
            if filter.includes(c) {
                self.get(c).clone()
            } else {
                BTreeSet::new()
            }
        };
        Self {
            stdlib: keep(PackageCategory::Standard),
            third_party: keep(PackageCategory::ThirdParty),
            internal: keep(PackageCategory::Internal),
        }
    }
}

/// A recursively discovered file that could not be parsed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// Counters collected during one traversal
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisStats {
    /// Files whose imports were extracted (entry file included)
    pub files_parsed: usize,
    /// Import occurrences seen, duplicates included
    pub imports_seen: usize,
    /// Internal package directories that were listed
    pub directories_expanded: usize,
    pub stdlib_packages: usize,
    pub third_party_packages: usize,
    pub internal_packages: usize,
}

/// Run metadata
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisMetadata {
    pub duration_ms: u64,
    pub timestamp: String,
    pub tool_version: String,
}

/// Everything one analysis run produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Absolute path of the entry file
    pub entry: PathBuf,
    pub project_root: PathBuf,
    /// Module path from go.mod, empty when none was found
    pub module_root: String,
    pub deep: bool,
    pub packages: ClassifiedPackages,
    /// Files traversed, in processing order
    pub files: Vec<PathBuf>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedFile>,
    pub stats: AnalysisStats,
    pub metadata: AnalysisMetadata,
}

impl AnalysisResult {
    /// Copy restricted to the categories selected by `filter`
    pub fn filtered(&self, filter: CategoryFilter) -> Self {
        Self {
            packages: self.packages.filtered(filter),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_from_str() {
        assert_eq!("all".parse::<CategoryFilter>(), Ok(CategoryFilter::All));
        assert_eq!(
            "third-party".parse::<CategoryFilter>(),
            Ok(CategoryFilter::ThirdParty)
        );
        let err = "vendor".parse::<CategoryFilter>().unwrap_err();
        assert_eq!(err.value, "vendor");
        assert!(err.to_string().contains("stdlib, third-party, internal, all"));
    }

    #[test]
    fn test_filter_display_matches_values() {
        for value in CategoryFilter::VALUES {
            let filter: CategoryFilter = value.parse().unwrap();
            assert_eq!(filter.to_string(), value);
        }
    }

    #[test]
    fn test_classified_insert_and_lookup() {
        let mut packages = ClassifiedPackages::default();
        assert!(packages.insert("fmt".to_string(), PackageCategory::Standard));
        assert!(!packages.insert("fmt".to_string(), PackageCategory::Standard));
        packages.insert("github.com/pkg/errors".to_string(), PackageCategory::ThirdParty);

        assert_eq!(packages.total(), 2);
        assert!(packages.get(PackageCategory::Standard).contains("fmt"));
        assert!(!packages.get(PackageCategory::Standard).contains("os"));
    }

    #[test]
    fn test_classified_filtered() {
        let mut packages = ClassifiedPackages::default();
        packages.insert("fmt".to_string(), PackageCategory::Standard);
        packages.insert("example.com/app/util".to_string(), PackageCategory::Internal);

        let only_internal = packages.filtered(CategoryFilter::Internal);
        assert!(only_internal.stdlib.is_empty());
        assert_eq!(only_internal.internal.len(), 1);
        assert_eq!(packages.filtered(CategoryFilter::All), packages);
    }
}
