//! Configuration module
//!
//! Handles CLI configuration: where the server lives and which token to use.

use voluntar_client::VoluntarClient;

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// URL of the Voluntar server
    pub server_url: String,
    /// Access token from `--token` or `VOLUNTAR_TOKEN`
    pub token: Option<String>,
}

impl Config {
    /// A client carrying the configured token, if any
    pub async fn client(&self) -> VoluntarClient {
        let client = VoluntarClient::new(&self.server_url);
        if let Some(token) = &self.token {
            client.set_token(token.clone()).await;
        }
        client
    }
}
