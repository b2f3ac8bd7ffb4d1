use std::sync::Arc;
use std::time::Instant;

use super::prompt::{
    build_analysis_prompt, truncate_transcript, ANALYSIS_SYSTEM_PROMPT, MAX_TRANSCRIPT_CHARS,
};
use super::types::{AnalysisResult, CompletionRequest, LlmClient};
use super::validation::parse_analysis_response;
use super::AnalysisError;

/// Low temperature keeps the summary close to the transcript.
pub const ANALYSIS_TEMPERATURE: f32 = 0.3;
pub const ANALYSIS_MAX_TOKENS: u32 = 2000;

/// Turns transcript text into a validated `AnalysisResult` with one LLM call.
pub struct TranscriptAnalyzer {
    client: Arc<dyn LlmClient>,
}

impl TranscriptAnalyzer {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self { client }
    }

    pub fn is_configured(&self) -> bool {
        self.client.is_configured()
    }

    /// Analyze one transcript.
    ///
    /// Fails with `MissingCredential` before any network activity when the
    /// client has no credential. Text past `MAX_TRANSCRIPT_CHARS` is dropped.
    pub fn analyze(&self, transcript: &str) -> Result<AnalysisResult, AnalysisError> {
        if !self.client.is_configured() {
            return Err(AnalysisError::MissingCredential);
        }

        let input_chars = transcript.chars().count();
        let text = truncate_transcript(transcript, MAX_TRANSCRIPT_CHARS);
        let truncated = input_chars > MAX_TRANSCRIPT_CHARS;
        if truncated {
            tracing::info!(
                input_chars,
                kept_chars = MAX_TRANSCRIPT_CHARS,
                "Transcript truncated before analysis"
            );
        }

        let request = CompletionRequest {
            system: ANALYSIS_SYSTEM_PROMPT.to_string(),
            user: build_analysis_prompt(&text),
            temperature: ANALYSIS_TEMPERATURE,
            max_tokens: ANALYSIS_MAX_TOKENS,
            json_mode: true,
        };

        let start = Instant::now();
        let raw = self.client.complete(&request)?;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        let result = parse_analysis_response(&raw).inspect_err(|e| {
            tracing::warn!(kind = e.kind(), response_len = raw.len(), "Rejected analysis response");
        })?;

        tracing::info!(
            input_chars,
            truncated,
            response_len = raw.len(),
            elapsed_ms,
            "Transcript analyzed"
        );
        Ok(result)
    }
}
