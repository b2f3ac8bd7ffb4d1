use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::AnalysisError;

/// Keys every analysis must carry, in the order they are checked.
pub const REQUIRED_FIELDS: [&str; 7] = [
    "tone",
    "confidence",
    "positives",
    "concerns",
    "guidance",
    "capacity_trend",
    "growth_initiatives",
];

/// Structured sentiment summary returned by the model.
///
/// Holds the model's JSON object exactly as parsed. Only the presence of the
/// required keys is guaranteed; values are whatever the model produced, so the
/// typed accessors return `None` for anything outside the documented domain.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AnalysisResult(Map<String, Value>);

impl AnalysisResult {
    /// Wrap an object that has already passed the required-key check.
    pub(crate) fn from_validated(object: Map<String, Value>) -> Self {
        Self(object)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn tone(&self) -> Option<Tone> {
        self.str_field("tone").and_then(Tone::parse)
    }

    pub fn confidence(&self) -> Option<Confidence> {
        self.str_field("confidence").and_then(Confidence::parse)
    }

    pub fn capacity_trend(&self) -> Option<CapacityTrend> {
        self.str_field("capacity_trend").and_then(CapacityTrend::parse)
    }

    pub fn guidance(&self) -> Option<&str> {
        self.str_field("guidance")
    }

    pub fn positives(&self) -> Vec<&str> {
        self.string_list("positives")
    }

    pub fn concerns(&self) -> Vec<&str> {
        self.string_list("concerns")
    }

    pub fn growth_initiatives(&self) -> Vec<&str> {
        self.string_list("growth_initiatives")
    }

    fn str_field(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(Value::as_str)
    }

    /// String entries of an array field, in order; non-string entries are skipped.
    fn string_list(&self, field: &str) -> Vec<&str> {
        self.0
            .get(field)
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }
}

/// Overall tone of the call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Optimistic,
    Cautious,
    Neutral,
    Pessimistic,
}

impl Tone {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "optimistic" => Some(Tone::Optimistic),
            "cautious" => Some(Tone::Cautious),
            "neutral" => Some(Tone::Neutral),
            "pessimistic" => Some(Tone::Pessimistic),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tone::Optimistic => "optimistic",
            Tone::Cautious => "cautious",
            Tone::Neutral => "neutral",
            Tone::Pessimistic => "pessimistic",
        }
    }
}

/// Management confidence level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Some(Confidence::High),
            "medium" => Some(Confidence::Medium),
            "low" => Some(Confidence::Low),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::High => "high",
            Confidence::Medium => "medium",
            Confidence::Low => "low",
        }
    }
}

/// Capacity / demand trend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CapacityTrend {
    Expanding,
    Stable,
    Contracting,
}

impl CapacityTrend {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "expanding" => Some(CapacityTrend::Expanding),
            "stable" => Some(CapacityTrend::Stable),
            "contracting" => Some(CapacityTrend::Contracting),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CapacityTrend::Expanding => "expanding",
            CapacityTrend::Stable => "stable",
            CapacityTrend::Contracting => "contracting",
        }
    }
}

/// One completion call: a fixed system instruction plus the user message.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Ask the provider to constrain output to syntactically valid JSON.
    pub json_mode: bool,
}

/// LLM completion client abstraction (allows mocking)
pub trait LlmClient: Send + Sync {
    /// Whether a credential is configured. Without one, no call may be attempted.
    fn is_configured(&self) -> bool;

    /// Send the request and return the raw text of the model's reply.
    fn complete(&self, request: &CompletionRequest) -> Result<String, AnalysisError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn result_from(value: Value) -> AnalysisResult {
        match value {
            Value::Object(map) => AnalysisResult::from_validated(map),
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn accessors_read_documented_values() {
        let result = result_from(json!({
            "tone": "Optimistic",
            "confidence": "high",
            "positives": ["Record bookings", "Margin expansion"],
            "concerns": ["FX headwinds"],
            "guidance": "FY revenue raised to $4.2B",
            "capacity_trend": "expanding",
            "growth_initiatives": ["New fab in Arizona"]
        }));
        assert_eq!(result.tone(), Some(Tone::Optimistic));
        assert_eq!(result.confidence(), Some(Confidence::High));
        assert_eq!(result.capacity_trend(), Some(CapacityTrend::Expanding));
        assert_eq!(result.guidance(), Some("FY revenue raised to $4.2B"));
        assert_eq!(result.positives(), vec!["Record bookings", "Margin expansion"]);
        assert_eq!(result.concerns(), vec!["FX headwinds"]);
        assert_eq!(result.growth_initiatives(), vec!["New fab in Arizona"]);
    }

    #[test]
    fn off_domain_values_read_as_none() {
        let result = result_from(json!({
            "tone": "bullish",
            "confidence": 7,
            "positives": "not a list",
            "concerns": [],
            "guidance": null,
            "capacity_trend": "Not mentioned",
            "growth_initiatives": [1, "Buybacks"]
        }));
        assert_eq!(result.tone(), None);
        assert_eq!(result.confidence(), None);
        assert_eq!(result.capacity_trend(), None);
        assert_eq!(result.guidance(), None);
        assert!(result.positives().is_empty());
        assert_eq!(result.growth_initiatives(), vec!["Buybacks"]);
    }

    #[test]
    fn serializes_as_the_plain_object() {
        let value = json!({"tone": "neutral", "extra": 1});
        let result = result_from(value.clone());
        assert_eq!(serde_json::to_value(&result).unwrap(), value);
        assert_eq!(result.into_value(), value);
    }

    #[test]
    fn enum_round_trip_through_str() {
        for tone in [Tone::Optimistic, Tone::Cautious, Tone::Neutral, Tone::Pessimistic] {
            assert_eq!(Tone::parse(tone.as_str()), Some(tone));
        }
        assert_eq!(
            serde_json::to_string(&CapacityTrend::Contracting).unwrap(),
            "\"contracting\""
        );
        assert_eq!(Confidence::parse(" Medium "), Some(Confidence::Medium));
    }

    #[test]
    fn required_fields_check_order() {
        assert_eq!(REQUIRED_FIELDS[0], "tone");
        assert_eq!(REQUIRED_FIELDS[6], "growth_initiatives");
    }
}
