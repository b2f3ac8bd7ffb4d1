use serde_json::Value;

use super::types::{AnalysisResult, REQUIRED_FIELDS};
use super::AnalysisError;

/// Parse the model's reply and check the required keys.
///
/// All-or-nothing: either every required key is present and the object is
/// returned untouched, or an error names the first missing key.
pub fn parse_analysis_response(raw: &str) -> Result<AnalysisResult, AnalysisError> {
    let value: Value =
        serde_json::from_str(raw).map_err(|e| AnalysisError::InvalidJson(e.to_string()))?;

    let object = match value {
        Value::Object(map) => map,
        other => {
            return Err(AnalysisError::InvalidJson(format!(
                "expected a JSON object, found {}",
                json_type_name(&other)
            )))
        }
    };

    if let Some(missing) = REQUIRED_FIELDS
        .into_iter()
        .find(|field| !object.contains_key(*field))
    {
        return Err(AnalysisError::MissingField(missing));
    }

    Ok(AnalysisResult::from_validated(object))
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
