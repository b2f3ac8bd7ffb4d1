use std::borrow::Cow;

/// Character budget for the transcript sent to the model (~12.5k tokens).
/// Content past the cutoff is never analyzed.
pub const MAX_TRANSCRIPT_CHARS: usize = 50_000;

/// Appended when the transcript was cut to the budget.
pub const TRUNCATION_MARKER: &str = "\n\n[Transcript truncated due to length]";

pub const ANALYSIS_SYSTEM_PROMPT: &str = r#"You are a financial analyst expert specializing in earnings call transcript analysis.

Your task is to analyze the provided earnings call transcript and generate a structured financial analysis.

You MUST respond with ONLY a valid JSON object in the following exact format:

{
  "tone": "<overall tone: optimistic/cautious/neutral/pessimistic>",
  "confidence": "<management confidence level: high/medium/low>",
  "positives": ["<positive point 1>", "<positive point 2>", ...],
  "concerns": ["<concern 1>", "<concern 2>", ...],
  "guidance": "<forward guidance summary>",
  "capacity_trend": "<capacity/demand trend: expanding/stable/contracting>",
  "growth_initiatives": ["<initiative 1>", "<initiative 2>", ...]
}

CRITICAL RULES:
1. Output ONLY valid JSON - no additional text, explanations, or markdown
2. If information is not mentioned in the transcript, write "Not mentioned"
3. Be concise - each point should be 1-2 sentences maximum
4. Base analysis ONLY on transcript content - no hallucinations or assumptions
5. For arrays, provide at least one item if information exists, otherwise ["Not mentioned"]
6. Ensure all string values are properly escaped for JSON
7. Do not invent or fabricate any information
"#;

/// Cut `text` to at most `max_chars` characters, appending `TRUNCATION_MARKER` when cut.
///
/// Counts Unicode scalar values, never splitting a character.
pub fn truncate_transcript(text: &str, max_chars: usize) -> Cow<'_, str> {
    match text.char_indices().nth(max_chars) {
        None => Cow::Borrowed(text),
        Some((cut, _)) => {
            let mut truncated = String::with_capacity(cut + TRUNCATION_MARKER.len());
            truncated.push_str(&text[..cut]);
            truncated.push_str(TRUNCATION_MARKER);
            Cow::Owned(truncated)
        }
    }
}

/// Build the user message carrying the (already truncated) transcript.
pub fn build_analysis_prompt(transcript: &str) -> String {
    format!("Analyze this earnings call transcript:\n\n{transcript}")
}
