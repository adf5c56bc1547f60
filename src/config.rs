//! Configuration for the invoice-qa server
//!
//! Settings come from command-line flags, each of which can also be supplied
//! through the environment (a `.env` file is loaded by the binary first).
//! The API key is required: a missing key stops the server at startup
//! instead of failing every submission later.

use crate::types::{DEFAULT_BASE_URL, DEFAULT_MODEL, QaOptions};
use crate::{Error, Result};
use clap::Parser;
use std::env;
use std::net::SocketAddr;

/// Environment variable holding the API key
pub const API_KEY_ENV: &str = "GOOGLE_API_KEY";

/// Lower-case spelling accepted for existing `.env` files
pub const LEGACY_API_KEY_ENV: &str = "google_api_key";

/// Default upload limit in megabytes
pub const DEFAULT_MAX_UPLOAD_MB: usize = 200;

/// Command-line arguments
#[derive(Parser, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Address the web form listens on
    #[arg(long, env = "INVOICE_QA_BIND", default_value = "127.0.0.1:8501")]
    pub bind: SocketAddr,

    /// API key for the hosted model
    #[arg(long, env = API_KEY_ENV, hide_env_values = true)]
    pub api_key: Option<String>,

    /// Model name
    #[arg(long, env = "INVOICE_QA_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// API root URL
    #[arg(long, env = "INVOICE_QA_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Model request timeout in seconds
    #[arg(long, env = "INVOICE_QA_TIMEOUT", default_value_t = 60)]
    pub timeout: u64,

    /// Largest accepted upload, in megabytes
    #[arg(long, env = "INVOICE_QA_MAX_UPLOAD_MB", default_value_t = DEFAULT_MAX_UPLOAD_MB)]
    pub max_upload_mb: usize,

    /// Validate configuration and exit without starting the server
    #[arg(long)]
    pub validate: bool,
}

impl std::fmt::Debug for Args {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Args")
            .field("bind", &self.bind)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("max_upload_mb", &self.max_upload_mb)
            .field("validate", &self.validate)
            .finish()
    }
}

/// Validated server configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub bind: SocketAddr,
    pub max_upload_bytes: usize,
    pub qa: QaOptions,
}

impl Config {
    /// Resolve arguments against the process environment
    pub fn from_args(args: &Args) -> Result<Self> {
        Self::from_args_with(args, |name| env::var(name).ok())
    }

    /// Resolve arguments using `lookup` for environment variables
    pub fn from_args_with<F>(args: &Args, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = resolve_api_key(args.api_key.clone(), lookup).ok_or_else(|| {
            Error::config(format!(
                "no API key: set {} (or pass --api-key)",
                API_KEY_ENV
            ))
        })?;

        if args.max_upload_mb == 0 {
            return Err(Error::config("max upload size must be at least 1 MB"));
        }
        let max_upload_bytes = args.max_upload_mb.checked_mul(1024 * 1024).ok_or_else(|| {
            Error::config(format!(
                "max upload size of {} MB is too large",
                args.max_upload_mb
            ))
        })?;

        let qa = QaOptions::builder()
            .api_key(api_key)
            .model(&args.model)
            .base_url(&args.base_url)
            .timeout(args.timeout)
            .build()?;

        Ok(Self {
            bind: args.bind,
            max_upload_bytes,
            qa,
        })
    }
}

/// Load `.env` into the environment.
///
/// No `.env` file is not an error; a file that cannot be read or parsed is.
pub fn load_dotenv() -> std::result::Result<(), dotenvy::Error> {
    ignore_missing_env_file(dotenvy::dotenv().map(|_| ()))
}

fn ignore_missing_env_file(
    result: std::result::Result<(), dotenvy::Error>,
) -> std::result::Result<(), dotenvy::Error> {
    match result {
        Err(e) if e.not_found() => Ok(()),
        other => other,
    }
}

/// Get the API key from an explicit value or the environment
///
/// Priority:
/// 1. explicit value (flag or `GOOGLE_API_KEY`, via clap)
/// 2. `google_api_key` environment variable
///
/// Blank values count as missing.
pub fn resolve_api_key<F>(explicit: Option<String>, lookup: F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    explicit
        .or_else(|| lookup(LEGACY_API_KEY_ENV))
        .map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty())
}
