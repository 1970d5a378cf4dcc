// SPDX-FileCopyrightText: 2026 Wagent Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One bridge connection per agent session.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use dashmap::DashMap;
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use wagent_core::{ChatClient, ClientEvent, MediaAttachment, WagentError};

use crate::protocol::{InboundFrame, InfoPayload, MediaPayload, Request, RequestFrame};

type Pending = DashMap<u64, oneshot::Sender<Result<Value, String>>>;

const EVENT_CAPACITY: usize = 64;
const OUTBOUND_CAPACITY: usize = 32;

pub struct BridgeClient {
    agent_id: String,
    session_dir: String,
    outbound: mpsc::Sender<String>,
    pending: Arc<Pending>,
    next_id: AtomicU64,
    timeout: Duration,
    cancel: CancellationToken,
}

impl BridgeClient {
    /// Starts the reader and writer tasks over an open WebSocket.
    pub fn spawn<S>(
        ws: WebSocketStream<S>,
        agent_id: &str,
        session_dir: &str,
        timeout: Duration,
    ) -> (Self, mpsc::Receiver<ClientEvent>)
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let (mut sink, mut stream) = ws.split();
        let (out_tx, mut out_rx) = mpsc::channel::<String>(OUTBOUND_CAPACITY);
        let (event_tx, event_rx) = mpsc::channel(EVENT_CAPACITY);
        let pending: Arc<Pending> = Arc::new(DashMap::new());
        let cancel = CancellationToken::new();

        let writer_cancel = cancel.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = writer_cancel.cancelled() => break,
                    frame = out_rx.recv() => match frame {
                        Some(text) => {
                            if let Err(e) = sink.send(WsMessage::Text(text.into())).await {
                                warn!(error = %e, "bridge write failed");
                                break;
                            }
                        }
                        None => break,
                    },
                }
            }
            let _ = sink.close().await;
        });

        let reader_cancel = cancel.clone();
        let reader_pending = Arc::clone(&pending);
        let agent = agent_id.to_string();
        tokio::spawn(async move {
            let reason = loop {
                tokio::select! {
                    _ = reader_cancel.cancelled() => return,
                    frame = stream.next() => match frame {
                        Some(Ok(WsMessage::Text(text))) => {
                            dispatch(text.as_str(), &reader_pending, &event_tx).await;
                        }
                        Some(Ok(WsMessage::Close(_))) | None => {
                            break "bridge connection closed".to_string();
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => break format!("bridge connection error: {e}"),
                    },
                }
            };
            debug!(agent_id = %agent, %reason, "bridge reader stopped");
            // Dropping the waiters fails every in-flight request.
            reader_pending.clear();
            if !reader_cancel.is_cancelled() {
                let _ = event_tx.send(ClientEvent::Disconnected(reason)).await;
            }
            reader_cancel.cancel();
        });

        let client = Self {
            agent_id: agent_id.to_string(),
            session_dir: session_dir.to_string(),
            outbound: out_tx,
            pending,
            next_id: AtomicU64::new(1),
            timeout,
            cancel,
        };
        (client, event_rx)
    }

    async fn request(&self, request: Request<'_>) -> Result<Value, WagentError> {
        if self.cancel.is_cancelled() {
            return Err(WagentError::client("bridge connection closed"));
        }
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let frame = serde_json::to_string(&RequestFrame { id, request }).map_err(|e| {
            WagentError::Client {
                message: format!("failed to encode bridge request: {e}"),
                source: Some(Box::new(e)),
            }
        })?;

        let (tx, rx) = oneshot::channel();
        self.pending.insert(id, tx);
        if self.outbound.send(frame).await.is_err() {
            self.pending.remove(&id);
            return Err(WagentError::client("bridge connection closed"));
        }

        match tokio::time::timeout(self.timeout, rx).await {
            Ok(Ok(Ok(data))) => Ok(data),
            Ok(Ok(Err(message))) => Err(WagentError::client(message)),
            Ok(Err(_)) => Err(WagentError::client("bridge connection closed")),
            Err(_) => {
                self.pending.remove(&id);
                Err(WagentError::Timeout {
                    duration: self.timeout,
                })
            }
        }
    }
}

async fn dispatch(text: &str, pending: &Pending, events: &mpsc::Sender<ClientEvent>) {
    match serde_json::from_str::<InboundFrame>(text) {
        Ok(InboundFrame::Response {
            id,
            ok,
            data,
            error,
        }) => {
            let Some((_, waiter)) = pending.remove(&id) else {
                debug!(id, "response for unknown request");
                return;
            };
            let outcome = if ok {
                Ok(data)
            } else {
                Err(error.unwrap_or_else(|| "bridge request failed".to_string()))
            };
            let _ = waiter.send(outcome);
        }
        Ok(InboundFrame::Event(event)) => {
            if events.send(event.into()).await.is_err() {
                debug!("event receiver dropped");
            }
        }
        Err(e) => warn!(error = %e, "unparseable bridge frame"),
    }
}

#[async_trait]
impl ChatClient for BridgeClient {
    async fn initialize(&self) -> Result<(), WagentError> {
        self.request(Request::Init {
            agent_id: &self.agent_id,
            session_dir: &self.session_dir,
        })
        .await
        .map(|_| ())
    }

    async fn destroy(&self) -> Result<(), WagentError> {
        if self.cancel.is_cancelled() {
            return Ok(());
        }
        let result = self.request(Request::Destroy).await;
        self.cancel.cancel();
        result.map(|_| ())
    }

    async fn phone_number(&self) -> Option<String> {
        match self.request(Request::Info).await {
            Ok(data) => serde_json::from_value::<InfoPayload>(data)
                .ok()
                .and_then(|info| info.phone_number),
            Err(e) => {
                debug!(agent_id = %self.agent_id, error = %e, "phone number unavailable");
                None
            }
        }
    }

    async fn send_seen(&self, chat_id: &str) -> Result<(), WagentError> {
        self.request(Request::Seen { chat_id }).await.map(|_| ())
    }

    async fn send_typing(&self, chat_id: &str) -> Result<(), WagentError> {
        self.request(Request::Typing { chat_id }).await.map(|_| ())
    }

    async fn clear_state(&self, chat_id: &str) -> Result<(), WagentError> {
        self.request(Request::ClearState { chat_id }).await.map(|_| ())
    }

    async fn reply(&self, chat_id: &str, message_id: &str, text: &str) -> Result<(), WagentError> {
        self.request(Request::Reply {
            chat_id,
            message_id,
            text,
        })
        .await
        .map(|_| ())
    }

    async fn download_media(
        &self,
        message_id: &str,
    ) -> Result<Option<MediaAttachment>, WagentError> {
        let data = self.request(Request::Media { message_id }).await?;
        if data.is_null() {
            return Ok(None);
        }
        let payload: MediaPayload = serde_json::from_value(data).map_err(|e| WagentError::Client {
            message: format!("malformed media payload: {e}"),
            source: Some(Box::new(e)),
        })?;
        let bytes = STANDARD
            .decode(payload.data.as_bytes())
            .map_err(|e| WagentError::Client {
                message: format!("media is not valid base64: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(Some(MediaAttachment {
            data: bytes,
            mime_type: payload.mimetype,
            filename: payload.filename,
        }))
    }
}

impl Drop for BridgeClient {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
