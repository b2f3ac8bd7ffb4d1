pub mod api;
pub mod config;
pub mod pipeline;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::api::ApiContext;
use crate::config::ServiceConfig;
use crate::pipeline::analysis::{OpenAiClient, TranscriptAnalyzer};
use crate::pipeline::extraction::TranscriptExtractor;
use crate::pipeline::processor::DocumentProcessor;

/// Errors that stop the service from starting or keep it from running.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("LLM client setup failed: {0}")]
    LlmClient(#[from] pipeline::analysis::AnalysisError),
    #[error("Server error: {0}")]
    Io(#[from] std::io::Error),
}

/// Wire the pipeline from configuration.
///
/// Builds the blocking HTTP client, so call it outside an async runtime.
pub fn build_processor(config: &ServiceConfig) -> Result<DocumentProcessor, StartupError> {
    let llm = OpenAiClient::new(&config.llm)?;
    Ok(DocumentProcessor::new(
        TranscriptExtractor::from_settings(&config.ocr),
        TranscriptAnalyzer::new(Arc::new(llm)),
    ))
}

pub fn run() {
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    if let Err(e) = start() {
        tracing::error!("{} failed: {e}", config::APP_NAME);
        std::process::exit(1);
    }
}

fn start() -> Result<(), StartupError> {
    let config = ServiceConfig::from_env()?;
    // Held here so the blocking HTTP client is dropped outside the runtime.
    let processor = Arc::new(build_processor(&config)?);

    tracing::info!(
        service = config::APP_NAME,
        version = config::APP_VERSION,
        bind_addr = %config.bind_addr,
        cors_origins = %config.allowed_origins,
        max_upload_mb = config::MAX_UPLOAD_BYTES / (1024 * 1024),
        llm_model = %config.llm.model,
        llm_configured = config.llm.has_credential(),
        "Starting; endpoints: GET / (health), POST /analyze (PDF upload)"
    );
    if !config.llm.has_credential() {
        tracing::warn!("OPENAI_API_KEY is not set; every analysis will fail until it is");
    }

    let app = api::api_router(ApiContext::new(processor.clone()), &config.allowed_origins);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(api::serve(config.bind_addr, app))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn processor_builds_from_default_config() {
        let config = ServiceConfig::from_lookup(|_| None).unwrap();
        let processor = build_processor(&config).unwrap();
        assert!(!processor.llm_configured());
    }

    #[test]
    fn processor_reports_configured_key() {
        let config = ServiceConfig::from_lookup(|var| {
            (var == "OPENAI_API_KEY").then(|| "sk-test".to_string())
        })
        .unwrap();
        assert!(build_processor(&config).unwrap().llm_configured());
    }
}
