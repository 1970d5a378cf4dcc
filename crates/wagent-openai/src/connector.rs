// SPDX-FileCopyrightText: 2026 Wagent Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-agent construction of assistant clients.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use wagent_config::model::OpenAiConfig;
use wagent_core::{
    AdapterType, AssistantBackend, AssistantConnector, HealthStatus, KeyResolver, PluginAdapter,
    WagentError,
};

use crate::client::AssistantsClient;

/// Resolves the agent's key on every call, so rotated keys take effect on
/// the next turn.
pub struct OpenAiConnector {
    keys: Arc<dyn KeyResolver>,
    base_url: String,
    timeout: Duration,
    max_retries: u32,
}

impl OpenAiConnector {
    pub fn new(keys: Arc<dyn KeyResolver>, config: &OpenAiConfig) -> Self {
        Self {
            keys,
            base_url: config.base_url.clone(),
            timeout: Duration::from_secs(config.request_timeout_secs),
            max_retries: config.max_retries,
        }
    }
}

#[async_trait]
impl AssistantConnector for OpenAiConnector {
    async fn connect(&self, agent_id: &str) -> Result<Arc<dyn AssistantBackend>, WagentError> {
        let key = self.keys.api_key(agent_id).await?;
        let client = AssistantsClient::new(&key, &self.base_url, self.timeout, self.max_retries)?;
        Ok(Arc::new(client))
    }
}

#[async_trait]
impl PluginAdapter for OpenAiConnector {
    fn name(&self) -> &str {
        "openai-assistants"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Assistant
    }

    async fn health_check(&self) -> Result<HealthStatus, WagentError> {
        if self.base_url.is_empty() {
            return Ok(HealthStatus::Unhealthy("no base url configured".into()));
        }
        Ok(HealthStatus::Healthy)
    }
}
