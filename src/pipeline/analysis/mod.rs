pub mod types;
pub mod prompt;
pub mod validation;
pub mod openai;
pub mod analyzer;

pub use types::*;
pub use prompt::*;
pub use validation::*;
pub use openai::*;
pub use analyzer::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("OPENAI_API_KEY environment variable not set")]
    MissingCredential,

    #[error("Invalid JSON response from LLM: {0}")]
    InvalidJson(String),

    #[error("Missing required field in analysis: {0}")]
    MissingField(&'static str),

    #[error("LLM request failed: {0}")]
    UpstreamFailure(String),

    #[error("LLM service returned error (status {status}): {body}")]
    UpstreamStatus { status: u16, body: String },

    #[error("LLM request timed out after {0}s")]
    Timeout(u64),
}

impl AnalysisError {
    /// Stable token for the failure kind, independent of the message text.
    pub fn kind(&self) -> &'static str {
        match self {
            AnalysisError::MissingCredential => "missing_credential",
            AnalysisError::InvalidJson(_) => "invalid_json",
            AnalysisError::MissingField(_) => "missing_field",
            AnalysisError::UpstreamFailure(_) | AnalysisError::UpstreamStatus { .. } => {
                "upstream_failure"
            }
            AnalysisError::Timeout(_) => "timeout",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_errors_share_a_kind() {
        let status = AnalysisError::UpstreamStatus {
            status: 429,
            body: "rate limited".into(),
        };
        assert_eq!(status.kind(), "upstream_failure");
        assert_eq!(
            AnalysisError::UpstreamFailure("connection refused".into()).kind(),
            "upstream_failure"
        );
    }

    #[test]
    fn missing_field_names_the_field() {
        let err = AnalysisError::MissingField("guidance");
        assert_eq!(err.kind(), "missing_field");
        assert!(err.to_string().ends_with("guidance"));
    }
}
