// SPDX-FileCopyrightText: 2026 Wagent Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::info;
use wagent_config::model::SessionsConfig;
use wagent_core::{
    AdapterType, ChatClientFactory, ClientConnection, HealthStatus, PluginAdapter, WagentError,
};

use crate::client::BridgeClient;

/// Opens a bridge connection per agent session.
pub struct BridgeClientFactory {
    url: String,
    request_timeout: Duration,
}

impl BridgeClientFactory {
    pub fn new(url: impl Into<String>, request_timeout: Duration) -> Self {
        Self {
            url: url.into(),
            request_timeout,
        }
    }

    pub fn from_config(config: &SessionsConfig) -> Self {
        Self::new(
            config.bridge_url.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    fn connect_error(&self, e: tokio_tungstenite::tungstenite::Error) -> WagentError {
        WagentError::Client {
            message: format!("cannot reach bridge at {}: {e}", self.url),
            source: Some(Box::new(e)),
        }
    }
}

#[async_trait]
impl ChatClientFactory for BridgeClientFactory {
    async fn create(
        &self,
        agent_id: &str,
        session_dir: &Path,
    ) -> Result<ClientConnection, WagentError> {
        let (ws, _) = tokio_tungstenite::connect_async(self.url.as_str())
            .await
            .map_err(|e| self.connect_error(e))?;
        info!(agent_id, url = %self.url, "bridge connection opened");
        let session_dir = session_dir.to_string_lossy();
        let (client, events) =
            BridgeClient::spawn(ws, agent_id, &session_dir, self.request_timeout);
        Ok(ClientConnection {
            client: Arc::new(client),
            events,
        })
    }
}

#[async_trait]
impl PluginAdapter for BridgeClientFactory {
    fn name(&self) -> &str {
        "whatsapp-web-bridge"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::ChatClient
    }

    async fn health_check(&self) -> Result<HealthStatus, WagentError> {
        match tokio_tungstenite::connect_async(self.url.as_str()).await {
            Ok((mut ws, _)) => {
                let _ = ws.close(None).await;
                Ok(HealthStatus::Healthy)
            }
            Err(e) => Ok(HealthStatus::Unhealthy(format!("bridge unreachable: {e}"))),
        }
    }
}
