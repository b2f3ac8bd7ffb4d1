use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use thiserror::Error;

use crate::pipeline::extraction::{OcrSettings, DEFAULT_OCR_DPI, DEFAULT_OCR_LANGUAGE};

/// Application-level constants
pub const APP_NAME: &str = "Earnings Call Analyzer";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Largest accepted upload (50 MB).
pub const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_LLM_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;

/// Log filter used when RUST_LOG is unset or invalid.
pub fn default_log_filter() -> &'static str {
    "earnings_analyzer_lib=info,tower_http=info"
}

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value:?} ({reason})")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// LLM connection settings.
#[derive(Clone, PartialEq)]
pub struct LlmSettings {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl LlmSettings {
    pub fn has_credential(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }
}

// Hand-written so the key never reaches a log line.
impl std::fmt::Debug for LlmSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmSettings")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// CORS origin policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowedOrigins {
    Any,
    List(Vec<String>),
}

impl AllowedOrigins {
    /// Parse a comma-separated origin list; `*` anywhere means any origin.
    pub fn parse(raw: &str) -> Self {
        let origins: Vec<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(String::from)
            .collect();
        if origins.is_empty() || origins.iter().any(|o| o == "*") {
            AllowedOrigins::Any
        } else {
            AllowedOrigins::List(origins)
        }
    }
}

impl std::fmt::Display for AllowedOrigins {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AllowedOrigins::Any => f.write_str("*"),
            AllowedOrigins::List(origins) => f.write_str(&origins.join(",")),
        }
    }
}

/// Everything the service reads from its environment at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub llm: LlmSettings,
    pub ocr: OcrSettings,
    pub bind_addr: SocketAddr,
    pub allowed_origins: AllowedOrigins,
}

impl ServiceConfig {
    /// Read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from an arbitrary variable source. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let llm = LlmSettings {
            api_key: get("OPENAI_API_KEY"),
            base_url: get("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.into()),
            model: get("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_OPENAI_MODEL.into()),
            timeout_secs: parse_number("LLM_TIMEOUT_SECS", get("LLM_TIMEOUT_SECS"))?
                .unwrap_or(DEFAULT_LLM_TIMEOUT_SECS),
        };
        if llm.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                var: "LLM_TIMEOUT_SECS",
                value: "0".into(),
                reason: "must be at least 1".into(),
            });
        }

        let ocr = OcrSettings {
            rasterizer_path: get("PDFTOPPM_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("pdftoppm")),
            recognizer_path: get("TESSERACT_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("tesseract")),
            dpi: DEFAULT_OCR_DPI,
            language: get("OCR_LANGUAGE").unwrap_or_else(|| DEFAULT_OCR_LANGUAGE.into()),
        };

        let host_raw = get("HOST").unwrap_or_else(|| DEFAULT_HOST.into());
        let host: IpAddr = host_raw.trim().parse().map_err(|e: std::net::AddrParseError| {
            ConfigError::InvalidValue {
                var: "HOST",
                value: host_raw.clone(),
                reason: e.to_string(),
            }
        })?;
        let port = parse_number("PORT", get("PORT"))?.unwrap_or(DEFAULT_PORT);

        let allowed_origins = AllowedOrigins::parse(&get("ALLOWED_ORIGINS").unwrap_or_default());

        Ok(Self {
            llm,
            ocr,
            bind_addr: SocketAddr::new(host, port),
            allowed_origins,
        })
    }
}

fn parse_number<T>(var: &'static str, raw: Option<String>) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.map(|value| {
        value
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue {
                var,
                reason: e.to_string(),
                value,
            })
    })
    .transpose()
}
