use std::time::Duration;

/// Runtime configuration for the indicator
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorConfig {
    /// Site hosting the `/api/ping` endpoint and the guidelines page
    pub status_base_url: String,
    pub poll_interval_ms: u64,
    pub request_timeout_ms: u64,

    // Display
    pub server_name: String,
    /// Connection address copied to the clipboard
    pub server_address: String,
    pub map_url: String,
    pub rules_url: String,

    // External player lookups
    pub avatar_base_url: String,
    pub profile_base_url: String,
}

const DEFAULT_BASE_URL: &str = "https://mc.tygr.dev";

/// Dotenv files read at startup, repository root first. Variables already
/// set are never overwritten, so earlier files win.
pub const ENV_FILES: [&str; 2] = ["../.env", ".env"];

/// Load every dotenv file that exists, returning the ones that were read
pub fn load_env_files<P: AsRef<std::path::Path>>(paths: &[P]) -> Vec<std::path::PathBuf> {
    paths
        .iter()
        .filter(|path| dotenvy::from_path(path.as_ref()).is_ok())
        .map(|path| path.as_ref().to_path_buf())
        .collect()
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            status_base_url: DEFAULT_BASE_URL.to_string(),
            poll_interval_ms: 500,
            request_timeout_ms: 5000,

            server_name: "tyger's valley".to_string(),
            server_address: "mc.tygr.dev".to_string(),
            map_url: "https://map.mc.tygr.dev".to_string(),
            rules_url: rules_url_for(DEFAULT_BASE_URL),

            avatar_base_url: "https://crafthead.net/helm".to_string(),
            profile_base_url: "https://namemc.com/profile".to_string(),
        }
    }
}

macro_rules! env_or_default {
    ($config:expr, $field:ident, $env_var:expr) => {
        if let Ok(val) = std::env::var($env_var)
            && let Ok(parsed) = val.parse()
        {
            $config.$field = parsed;
        }
    };
}

impl IndicatorConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        env_or_default!(config, status_base_url, "STATUS_BASE_URL");
        env_or_default!(config, poll_interval_ms, "POLL_INTERVAL_MS");
        env_or_default!(config, request_timeout_ms, "REQUEST_TIMEOUT_MS");
        env_or_default!(config, server_name, "SERVER_NAME");
        env_or_default!(config, server_address, "SERVER_ADDRESS");
        env_or_default!(config, map_url, "MAP_URL");
        env_or_default!(config, avatar_base_url, "AVATAR_BASE_URL");
        env_or_default!(config, profile_base_url, "PROFILE_BASE_URL");

        // Guidelines follow the site unless pinned explicitly
        config.rules_url = rules_url_for(&config.status_base_url);
        env_or_default!(config, rules_url, "RULES_URL");

        config
    }

    /// Poll period; tokio intervals panic on zero so it is at least 1ms
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

fn rules_url_for(base_url: &str) -> String {
    format!("{}/rules", base_url.trim_end_matches('/'))
}
