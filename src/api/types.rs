//! Shared types for the API layer.

use std::sync::Arc;

use crate::config::MAX_UPLOAD_BYTES;
use crate::pipeline::processor::DocumentProcessor;

/// Shared context for all API routes.
#[derive(Clone)]
pub struct ApiContext {
    pub processor: Arc<DocumentProcessor>,
    /// Largest accepted file body in bytes.
    pub max_upload_bytes: usize,
}

impl ApiContext {
    pub fn new(processor: Arc<DocumentProcessor>) -> Self {
        Self {
            processor,
            max_upload_bytes: MAX_UPLOAD_BYTES,
        }
    }

    pub fn with_upload_limit(mut self, max_upload_bytes: usize) -> Self {
        self.max_upload_bytes = max_upload_bytes;
        self
    }

    pub fn upload_limit_mb(&self) -> usize {
        self.max_upload_bytes / (1024 * 1024)
    }
}
