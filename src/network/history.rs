use crate::common::{LoadError, Message};

/// One-shot fetch of the messages already stored on the server.
#[derive(Debug, Clone)]
pub struct HistoryLoader {
    client: reqwest::Client,
    endpoint: String,
}

impl HistoryLoader {
    pub fn new(client: reqwest::Client, server_url: &str) -> Self {
        Self {
            client,
            endpoint: format!("{}/messages", server_url.trim_end_matches('/')),
        }
    }

    pub async fn load(&self) -> Result<Vec<Message>, LoadError> {
        let response = self.client.get(&self.endpoint).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(LoadError::Status(status));
        }

        let messages = response.json::<Vec<Message>>().await?;
        log::debug!("Fetched {} messages from {}", messages.len(), self.endpoint);
        Ok(messages)
    }
}
