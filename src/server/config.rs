use crate::constants::{
    DEFAULT_BODY_LIMIT_MB, DEFAULT_CONCURRENCY, DEFAULT_HOST, DEFAULT_JOB_TIMEOUT_SECS, DEFAULT_PORT,
};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Settings for the local HTTP service.
///
/// Every field can come from a flag or from the environment variable named
/// in its `env` attribute.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(
    name = "compress-img-server",
    about = "Local image compression service with a browser upload form",
    version
)]
pub struct ServerConfig {
    #[arg(long, env = "HOST", default_value = DEFAULT_HOST, help = "Address to bind")]
    pub host: String,

    #[arg(short, long, env = "PORT", default_value_t = DEFAULT_PORT, help = "Port to listen on")]
    pub port: u16,

    #[arg(
        long,
        env = "BODY_LIMIT_MB",
        default_value_t = DEFAULT_BODY_LIMIT_MB,
        help = "Maximum request body size in MiB"
    )]
    pub body_limit_mb: usize,

    #[arg(
        long,
        env = "TIMEOUT_SECS",
        default_value_t = DEFAULT_JOB_TIMEOUT_SECS,
        help = "Per-image time limit in seconds"
    )]
    pub timeout_secs: u64,

    #[arg(
        short = 'j',
        long,
        env = "CONCURRENCY",
        default_value_t = DEFAULT_CONCURRENCY,
        help = "Images compressed at once within one request (0 = one per CPU)"
    )]
    pub concurrency: usize,

    #[arg(
        long,
        env = "STATIC_DIR",
        help = "Directory holding an index.html to serve instead of the built-in page"
    )]
    pub static_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            body_limit_mb: DEFAULT_BODY_LIMIT_MB,
            timeout_secs: DEFAULT_JOB_TIMEOUT_SECS,
            concurrency: DEFAULT_CONCURRENCY,
            static_dir: None,
        }
    }
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn body_limit_bytes(&self) -> usize {
        self.body_limit_mb.saturating_mul(1024 * 1024)
    }

    pub fn job_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
