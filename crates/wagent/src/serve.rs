// SPDX-FileCopyrightText: 2026 Wagent Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `wagent serve` command implementation.
//!
//! Opens the store, builds the vault, OpenAI, OCR and bridge collaborators,
//! starts every stored agent, and runs until SIGINT/SIGTERM. Status events
//! from the bus are logged as they arrive.

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use wagent_agent::{AgentRuntime, RuntimeDeps, RuntimeSettings, install_signal_handler};
use wagent_bus::{AgentStatusEvent, StatusBus};
use wagent_config::WagentConfig;
use wagent_core::{HealthStatus, PluginAdapter, StatusEvent, WagentError};
use wagent_ocr::OcrClient;
use wagent_openai::OpenAiConnector;
use wagent_storage::SqliteStore;
use wagent_vault::{ApiKeyCipher, StoredKeyResolver};
use wagent_whatsapp::BridgeClientFactory;

/// Runs the `wagent serve` command.
pub async fn run_serve(config: WagentConfig) -> Result<(), WagentError> {
    init_tracing(&config.service.log_level);
    info!(name = %config.service.name, "starting wagent serve");

    let store = Arc::new(SqliteStore::open(&config.storage).await?);
    let cipher = ApiKeyCipher::from_config(&config.vault).inspect_err(|_| {
        eprintln!("error: vault.master_key is required. Set it in wagent.toml or WAGENT_VAULT_MASTER_KEY.");
    })?;
    let keys = Arc::new(StoredKeyResolver::new(
        store.clone(),
        cipher,
        config.openai.api_key_name.clone(),
    ));
    let connector = Arc::new(OpenAiConnector::new(keys, &config.openai));
    let ocr = Arc::new(OcrClient::new(&config.ocr)?);
    if !ocr.is_configured() {
        warn!("ocr endpoint or api key not configured, attachments will be ignored");
    }
    let factory = Arc::new(BridgeClientFactory::from_config(&config.sessions));
    let bus = Arc::new(StatusBus::new(config.status.channel_capacity));

    let adapters: [&dyn PluginAdapter; 4] = [
        store.as_ref(),
        connector.as_ref(),
        ocr.as_ref(),
        factory.as_ref(),
    ];
    log_health(&adapters).await;

    let shutdown = install_signal_handler();
    let status_logger = spawn_status_logger(bus.subscribe(), shutdown.clone());

    let runtime = AgentRuntime::new(
        RuntimeDeps {
            store: store.clone(),
            factory,
            connector,
            ocr,
            status: bus,
        },
        RuntimeSettings::from_config(&config),
        shutdown.clone(),
    );

    if config.sessions.autostart {
        runtime.start_all().await?;
    } else {
        info!("autostart disabled, no agents started");
    }

    info!("wagent ready");
    shutdown.cancelled().await;

    info!("shutting down");
    runtime.shutdown().await;
    drop(runtime);
    if let Err(e) = status_logger.await {
        warn!(error = %e, "status logger task failed");
    }

    match Arc::try_unwrap(store) {
        Ok(store) => store.close().await?,
        Err(_) => debug!("store still shared at exit, skipping checkpoint"),
    }
    info!("wagent stopped");
    Ok(())
}

async fn log_health(adapters: &[&dyn PluginAdapter]) {
    for adapter in adapters {
        match adapter.health_check().await {
            Ok(HealthStatus::Healthy) => {
                info!(adapter = adapter.name(), kind = %adapter.adapter_type(), "healthy");
            }
            Ok(status) => {
                warn!(adapter = adapter.name(), kind = %adapter.adapter_type(), ?status, "adapter not healthy");
            }
            Err(e) => {
                error!(adapter = adapter.name(), kind = %adapter.adapter_type(), error = %e, "health check failed");
            }
        }
    }
}

fn spawn_status_logger(
    mut rx: broadcast::Receiver<AgentStatusEvent>,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let event = tokio::select! {
                _ = shutdown.cancelled() => break,
                event = rx.recv() => event,
            };
            match event {
                Ok(event) => log_status_event(&event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "status logger lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

fn log_status_event(event: &AgentStatusEvent) {
    let channel = event.channel();
    match &event.event {
        StatusEvent::Status(snapshot) => {
            info!(channel, agent_id = %event.agent_id, state = %snapshot.state, "status");
        }
        StatusEvent::Qr { .. } => {
            info!(channel, agent_id = %event.agent_id, "pairing QR code available");
            match serde_json::to_string(event) {
                Ok(frame) => debug!(channel, %frame, "qr frame"),
                Err(e) => warn!(error = %e, "could not serialize qr frame"),
            }
        }
        StatusEvent::Error { message } => {
            warn!(channel, agent_id = %event.agent_id, %message, "agent error");
        }
    }
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("wagent={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
