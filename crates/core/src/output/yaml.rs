use crate::models::AnalysisResult;
use super::FormatError;

/// Serialize AnalysisResult to YAML
pub fn to_yaml(result: &AnalysisResult) -> Result<String, FormatError> {
    serde_yaml::to_string(result).map_err(FormatError::from)
}
