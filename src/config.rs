use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::common::MergePolicy;

pub const DEFAULT_CONFIG_PATH: &str = "config/chat.json";
pub const SERVER_URL_ENV: &str = "CHAT_SERVER_URL";

const DEFAULT_SERVER_URL: &str = "http://localhost:8000";
const DEFAULT_IDENTITY_PATH: &str = "data/session.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Base url of the chat server; REST and Socket.IO share the host.
    pub server_url: String,
    /// Where the logged-in username is persisted.
    pub identity_path: String,
    pub merge_policy: MergePolicy,
    /// Capacity of each session's event queue.
    pub event_buffer: usize,
    pub handshake_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            identity_path: DEFAULT_IDENTITY_PATH.to_string(),
            merge_policy: MergePolicy::Replace,
            event_buffer: 100,
            handshake_timeout_secs: 20,
        }
    }
}

impl AppConfig {
    /// Environment beats the file, the command line beats both.
    pub fn with_overrides(mut self, env_server: Option<String>, cli_server: Option<String>) -> Self {
        if let Some(server_url) = cli_server.or(env_server) {
            let server_url = server_url.trim();
            if !server_url.is_empty() {
                self.server_url = server_url.to_string();
            }
        }
        self
    }
}

pub fn load_config(path: &str) -> AppConfig {
    let path = Path::new(path);
    match fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str::<AppConfig>(&content) {
            Ok(config) => config,
            Err(err) => {
                log::warn!("Failed to parse config file {}: {err}", path.display());
                AppConfig::default()
            }
        },
        Err(err) => {
            log::info!(
                "Config file {} not found ({err}); using defaults",
                path.display()
            );
            AppConfig::default()
        }
    }
}
