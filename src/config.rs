use std::time::Duration;

use clap::Parser;

/// Sidecar settings. Flags win over environment variables.
#[derive(Debug, Clone, Parser)]
#[command(name = "schoold", version, about = "School administration form sidecar")]
pub struct AppConfig {
    /// Base URL of the school REST API.
    #[arg(long, env = "API_BASE_URL", default_value = "http://localhost:4000")]
    pub api_base_url: String,

    /// Per-request timeout in seconds.
    #[arg(long, env = "SCHOOLD_TIMEOUT_SECS", default_value_t = 10)]
    pub timeout_secs: u64,

    /// Emit log lines as JSON.
    #[arg(long, env = "SCHOOLD_LOG_JSON")]
    pub log_json: bool,
}

impl AppConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}
