use crate::models::AnalysisResult;
use super::FormatError;

/// Serialize AnalysisResult to pretty-printed JSON
pub fn to_json(result: &AnalysisResult) -> Result<String, FormatError> {
    serde_json::to_string_pretty(result).map_err(FormatError::from)
}
