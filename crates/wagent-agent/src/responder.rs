// SPDX-FileCopyrightText: 2026 Wagent Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turns one queued inbound message into an assistant reply.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info, warn};
use wagent_core::{
    AssistantConnector, ChatClient, ChatMessage, ConversationKey, OutboundRecord, ResponseFormat,
    Store, TextExtractor, WagentError,
};

use crate::poll::RunPoller;
use crate::prompt::{self, ERROR_NOTICE};
use crate::queue::{QueueHandler, QueuedMessage};
use crate::threads::ThreadMapper;

/// Queue payload: the message plus the client it arrived on.
#[derive(Clone)]
pub struct InboundEnvelope {
    /// Client the reply goes out on.
    pub client: Arc<dyn ChatClient>,
    /// The inbound message as delivered.
    pub message: ChatMessage,
}

/// Runs one assistant turn per queued message: typing indicator, attachment
/// text, prompt, thread run, then an optional reply with its history record.
pub struct AiResponder {
    store: Arc<dyn Store>,
    connector: Arc<dyn AssistantConnector>,
    threads: Arc<ThreadMapper>,
    ocr: Arc<dyn TextExtractor>,
    poller: RunPoller,
}

impl AiResponder {
    pub fn new(
        store: Arc<dyn Store>,
        connector: Arc<dyn AssistantConnector>,
        threads: Arc<ThreadMapper>,
        ocr: Arc<dyn TextExtractor>,
        poller: RunPoller,
    ) -> Self {
        Self {
            store,
            connector,
            threads,
            ocr,
            poller,
        }
    }

    /// Answers one message. On failure the user gets an error notice and
    /// the original error is returned. A turn cut short by shutdown is
    /// returned as `Cancelled` without a notice.
    pub async fn respond(
        &self,
        key: &ConversationKey,
        envelope: &InboundEnvelope,
    ) -> Result<(), WagentError> {
        let result = self.try_respond(key, envelope).await;
        match &result {
            Ok(()) => {}
            Err(WagentError::Cancelled) => {
                info!(conversation = %key, message_id = %envelope.message.id, "turn abandoned on shutdown");
            }
            Err(e) => {
                warn!(conversation = %key, message_id = %envelope.message.id, error = %e, "responder failed");
                self.notify_failure(envelope).await;
            }
        }
        result
    }

    async fn try_respond(
        &self,
        key: &ConversationKey,
        envelope: &InboundEnvelope,
    ) -> Result<(), WagentError> {
        let InboundEnvelope { client, message } = envelope;
        let chat_id = message.chat_id.as_str();

        if let Err(e) = client.send_seen(chat_id).await {
            debug!(chat_id, error = %e, "send_seen failed");
        }
        if let Err(e) = client.send_typing(chat_id).await {
            debug!(chat_id, error = %e, "typing indicator failed");
        }

        let attachments = self.extract_attachments(client.as_ref(), message).await;
        let content = prompt::build_prompt(&message.body, &attachments);

        let agent = self
            .store
            .get_agent(&key.agent_id)
            .await?
            .ok_or_else(|| WagentError::AgentNotFound(key.agent_id.clone()))?;
        let thread_id = self.threads.get_or_create(key).await?;
        let backend = self.connector.connect(&key.agent_id).await?;

        backend.post_message(&thread_id, &content).await?;
        let run_id = backend
            .create_run(&thread_id, &agent.assistant_id, ResponseFormat::JsonObject)
            .await?;
        debug!(conversation = %key, %run_id, "run started");

        let part = self
            .poller
            .wait_for_completion(backend.as_ref(), &thread_id, &run_id)
            .await?;
        let reply = prompt::parse_reply(part.as_ref());

        if let Err(e) = client.clear_state(chat_id).await {
            debug!(chat_id, error = %e, "clear_state failed");
        }

        if !reply.should_respond {
            info!(conversation = %key, message_id = %message.id, "assistant chose not to respond");
            return Ok(());
        }

        client.reply(chat_id, &message.id, &reply.reply).await?;
        self.store
            .insert_outbound(&OutboundRecord {
                agent_id: key.agent_id.clone(),
                chat_id: chat_id.to_string(),
                thread_id,
                sender: message.sender().to_string(),
                message: reply.reply,
                created_at: Utc::now(),
            })
            .await?;
        info!(conversation = %key, message_id = %message.id, "reply sent");
        Ok(())
    }

    /// Extracted text of the message's attachment, if any. Failures only
    /// cost the attachment, never the message.
    async fn extract_attachments(
        &self,
        client: &dyn ChatClient,
        message: &ChatMessage,
    ) -> Vec<String> {
        if !message.has_media {
            return Vec::new();
        }

        let media = match client.download_media(&message.id).await {
            Ok(Some(media)) => media,
            Ok(None) => {
                debug!(message_id = %message.id, "media no longer available");
                return Vec::new();
            }
            Err(e) => {
                warn!(message_id = %message.id, error = %e, "media download failed");
                return Vec::new();
            }
        };

        let phone = message.from.split('@').next().unwrap_or(&message.from);
        let mime = media.mime_type.as_deref().unwrap_or_default();
        match self.ocr.extract_text(&media.data, mime, phone).await {
            Ok(text) => vec![text],
            Err(e) => {
                warn!(message_id = %message.id, error = %e, "text extraction failed");
                Vec::new()
            }
        }
    }

    async fn notify_failure(&self, envelope: &InboundEnvelope) {
        let InboundEnvelope { client, message } = envelope;
        if let Err(e) = client.reply(&message.chat_id, &message.id, ERROR_NOTICE).await {
            warn!(chat_id = %message.chat_id, error = %e, "could not deliver error notice");
            if let Err(e) = client.clear_state(&message.chat_id).await {
                debug!(chat_id = %message.chat_id, error = %e, "clear_state failed");
            }
        }
    }
}

#[async_trait]
impl QueueHandler<InboundEnvelope> for AiResponder {
    async fn handle(
        &self,
        key: &ConversationKey,
        message: &QueuedMessage<InboundEnvelope>,
    ) -> Result<(), WagentError> {
        self.respond(key, &message.payload).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;
    use wagent_core::{ContentPart, MediaAttachment, RunStatus};
    use wagent_test_utils::{ClientCall, MemoryStore, MockAssistant, MockChatClient, MockOcr};

    struct Fixture {
        store: Arc<MemoryStore>,
        assistant: MockAssistant,
        ocr: Arc<MockOcr>,
        client: Arc<MockChatClient>,
        responder: AiResponder,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        store.add_agent("agent-1", "asst_1");
        let assistant = MockAssistant::new();
        let ocr = Arc::new(MockOcr::returning("invoice total 42"));
        let threads = Arc::new(ThreadMapper::new(store.clone(), Arc::new(assistant.clone())));
        let responder = AiResponder::new(
            store.clone(),
            Arc::new(assistant.clone()),
            threads,
            ocr.clone(),
            RunPoller::new(Duration::from_millis(1), 5),
        );
        Fixture {
            store,
            assistant,
            ocr,
            client: Arc::new(MockChatClient::new()),
            responder,
        }
    }

    fn message(id: &str, body: &str) -> ChatMessage {
        ChatMessage {
            id: id.into(),
            chat_id: "1555@c.us".into(),
            from: "1555@c.us".into(),
            author: None,
            body: body.into(),
            timestamp: 100,
            has_media: false,
            from_me: false,
        }
    }

    fn envelope(f: &Fixture, message: ChatMessage) -> InboundEnvelope {
        InboundEnvelope {
            client: f.client.clone(),
            message,
        }
    }

    fn key() -> ConversationKey {
        ConversationKey::new("agent-1", "1555@c.us")
    }

    #[tokio::test]
    async fn replies_and_records_history() {
        let f = fixture();
        f.assistant
            .set_reply(ContentPart::Text(r#"{"reply":"hi there","shouldRespond":true}"#.into()));

        f.responder
            .respond(&key(), &envelope(&f, message("m1", "hello")))
            .await
            .unwrap();

        assert!(f.client.calls().contains(&ClientCall::Reply {
            chat_id: "1555@c.us".into(),
            message_id: "m1".into(),
            text: "hi there".into(),
        }));
        let outbound = f.store.outbound();
        assert_eq!(outbound.len(), 1);
        assert_eq!(outbound[0].message, "hi there");
        assert_eq!(outbound[0].sender, "1555@c.us");
        assert_eq!(f.assistant.runs_created()[0].1, ResponseFormat::JsonObject);
    }

    #[tokio::test]
    async fn silent_when_assistant_declines() {
        let f = fixture();
        f.assistant
            .set_reply(ContentPart::Text(r#"{"reply":"nah","shouldRespond":false}"#.into()));

        f.responder
            .respond(&key(), &envelope(&f, message("m1", "hello")))
            .await
            .unwrap();

        assert!(f.client.replies().is_empty());
        assert!(f.store.outbound().is_empty());
        assert!(f.client.calls().contains(&ClientCall::ClearState("1555@c.us".into())));
    }

    #[tokio::test]
    async fn attachment_text_is_added_to_prompt() {
        let f = fixture();
        f.client.set_media(MediaAttachment {
            data: b"%PDF-1.4".to_vec(),
            mime_type: Some("application/pdf".into()),
            filename: Some("invoice.pdf".into()),
        });
        let mut msg = message("m1", "what is the total?");
        msg.has_media = true;

        f.responder.respond(&key(), &envelope(&f, msg)).await.unwrap();

        let posted = f.assistant.posted_messages();
        assert!(posted[0].1.contains("In the file File0 you have the following data:\ninvoice total 42"));
        assert_eq!(f.ocr.calls()[0].1, "1555");
    }

    #[tokio::test]
    async fn ocr_failure_degrades_to_text_only() {
        let f = fixture();
        f.ocr.fail(true);
        f.client.set_media(MediaAttachment {
            data: vec![1, 2, 3],
            mime_type: None,
            filename: None,
        });
        let mut msg = message("m1", "see attached");
        msg.has_media = true;

        f.responder.respond(&key(), &envelope(&f, msg)).await.unwrap();

        let posted = f.assistant.posted_messages();
        assert!(!posted[0].1.contains("File0"));
    }

    #[tokio::test]
    async fn failed_run_sends_error_notice() {
        let f = fixture();
        f.assistant.script_statuses([RunStatus::Failed]);

        let err = f
            .responder
            .respond(&key(), &envelope(&f, message("m1", "hello")))
            .await
            .unwrap_err();

        assert!(matches!(err, WagentError::RunFailed { .. }));
        assert_eq!(f.client.replies(), vec![ERROR_NOTICE.to_string()]);
        assert!(f.store.outbound().is_empty());
    }

    #[tokio::test]
    async fn undeliverable_notice_clears_typing() {
        let f = fixture();
        f.assistant.fail_post(true);
        f.client.fail_replies(true);

        let result = f
            .responder
            .respond(&key(), &envelope(&f, message("m1", "hello")))
            .await;

        assert!(result.is_err());
        assert!(f.client.calls().contains(&ClientCall::ClearState("1555@c.us".into())));
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_mid_poll_sends_no_notice() {
        let store = Arc::new(MemoryStore::new());
        store.add_agent("agent-1", "asst_1");
        let assistant = MockAssistant::new();
        assistant.script_statuses(std::iter::repeat_n(RunStatus::InProgress, 100));
        let threads = Arc::new(ThreadMapper::new(store.clone(), Arc::new(assistant.clone())));
        let token = CancellationToken::new();
        let responder = AiResponder::new(
            store.clone(),
            Arc::new(assistant.clone()),
            threads,
            Arc::new(MockOcr::returning("")),
            RunPoller::new(Duration::from_secs(1), 60).with_cancellation(token.clone()),
        );
        let client = Arc::new(MockChatClient::new());
        let envelope = InboundEnvelope {
            client: client.clone(),
            message: message("m1", "hello"),
        };

        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(2500)).await;
            token.cancel();
        });
        let err = responder.respond(&key(), &envelope).await.unwrap_err();
        canceller.await.unwrap();

        assert!(matches!(err, WagentError::Cancelled));
        assert!(client.replies().is_empty());
        assert!(store.outbound().is_empty());
    }

    #[tokio::test]
    async fn unknown_agent_is_an_error() {
        let f = fixture();
        let key = ConversationKey::new("ghost", "1555@c.us");
        let err = f
            .responder
            .respond(&key, &envelope(&f, message("m1", "hello")))
            .await
            .unwrap_err();
        assert!(matches!(err, WagentError::AgentNotFound(id) if id == "ghost"));
    }
}
