// SPDX-FileCopyrightText: 2026 Wagent Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Assistants API (threads, messages, runs).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use wagent_core::{AssistantBackend, ContentPart, ResponseFormat, RunStatus, WagentError};

use crate::types::{
    ApiErrorResponse, CreateMessageRequest, CreateRunRequest, MessageList, ResponseFormatParam,
    RunObject, ThreadObject,
};

/// Client bound to one API key.
///
/// Transient failures (429, 500, 503) are retried after a one second pause,
/// up to `max_retries` times.
#[derive(Debug, Clone)]
pub struct AssistantsClient {
    http: reqwest::Client,
    base_url: String,
    max_retries: u32,
}

enum Reply {
    Body(String),
    NotFound,
}

impl AssistantsClient {
    pub fn new(
        api_key: &SecretString,
        base_url: &str,
        timeout: Duration,
        max_retries: u32,
    ) -> Result<Self, WagentError> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", api_key.expose_secret()))
            .map_err(|e| WagentError::Config(format!("invalid API key header value: {e}")))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert("OpenAI-Beta", HeaderValue::from_static("assistants=v2"));
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| WagentError::Assistant {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_retries,
        })
    }

    async fn send<B: Serialize + Sync>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Reply, WagentError> {
        let url = format!("{}{path}", self.base_url);
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, %url, "retrying request after transient error");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }

            let mut request = self.http.request(method.clone(), &url);
            if let Some(body) = body {
                request = request.json(body);
            }
            let response = request.send().await.map_err(|e| WagentError::Assistant {
                message: format!("HTTP request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

            let status = response.status();
            debug!(%status, attempt, %method, path, "assistants response received");

            if status.is_success() {
                let text = response.text().await.map_err(|e| WagentError::Assistant {
                    message: format!("failed to read response body: {e}"),
                    source: Some(Box::new(e)),
                })?;
                return Ok(Reply::Body(text));
            }
            if status == StatusCode::NOT_FOUND {
                return Ok(Reply::NotFound);
            }

            let body = response.text().await.unwrap_or_default();
            let error = WagentError::assistant(describe_error(status, &body));
            if is_transient_error(status) && attempt < self.max_retries {
                warn!(%status, "transient error, will retry");
                last_error = Some(error);
                continue;
            }
            return Err(error);
        }

        Err(last_error.unwrap_or_else(|| WagentError::assistant("request failed after retries")))
    }

    async fn call<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, WagentError> {
        match self.send(method, path, body).await? {
            Reply::Body(text) => serde_json::from_str(&text).map_err(|e| WagentError::Assistant {
                message: format!("failed to parse API response: {e}"),
                source: Some(Box::new(e)),
            }),
            Reply::NotFound => Err(WagentError::assistant(format!("{path} not found"))),
        }
    }
}

fn describe_error(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<ApiErrorResponse>(body) {
        Ok(api) => format!(
            "OpenAI API error ({}): {}",
            api.error.kind.as_deref().unwrap_or("unknown"),
            api.error.message
        ),
        Err(_) => format!("API returned {status}: {body}"),
    }
}

fn is_transient_error(status: StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 503)
}

const NO_BODY: Option<&()> = None;

#[async_trait]
impl AssistantBackend for AssistantsClient {
    async fn create_thread(&self) -> Result<String, WagentError> {
        let thread: ThreadObject = self
            .call(Method::POST, "/threads", Some(&serde_json::json!({})))
            .await?;
        debug!(thread_id = %thread.id, "thread created");
        Ok(thread.id)
    }

    async fn thread_exists(&self, thread_id: &str) -> Result<bool, WagentError> {
        match self
            .send(Method::GET, &format!("/threads/{thread_id}"), NO_BODY)
            .await?
        {
            Reply::Body(_) => Ok(true),
            Reply::NotFound => Ok(false),
        }
    }

    async fn post_message(&self, thread_id: &str, content: &str) -> Result<(), WagentError> {
        let body = CreateMessageRequest {
            role: "user",
            content,
        };
        let _: serde_json::Value = self
            .call(
                Method::POST,
                &format!("/threads/{thread_id}/messages"),
                Some(&body),
            )
            .await?;
        Ok(())
    }

    async fn create_run(
        &self,
        thread_id: &str,
        assistant_id: &str,
        format: ResponseFormat,
    ) -> Result<String, WagentError> {
        let body = CreateRunRequest {
            assistant_id,
            response_format: match format {
                ResponseFormat::JsonObject => Some(ResponseFormatParam {
                    kind: "json_object",
                }),
                ResponseFormat::Text => None,
            },
        };
        let run: RunObject = self
            .call(Method::POST, &format!("/threads/{thread_id}/runs"), Some(&body))
            .await?;
        debug!(thread_id, run_id = %run.id, status = %run.status, "run created");
        Ok(run.id)
    }

    async fn run_status(&self, thread_id: &str, run_id: &str) -> Result<RunStatus, WagentError> {
        let run: RunObject = self
            .call(
                Method::GET,
                &format!("/threads/{thread_id}/runs/{run_id}"),
                NO_BODY,
            )
            .await?;
        Ok(run.status)
    }

    async fn latest_message(&self, thread_id: &str) -> Result<Option<ContentPart>, WagentError> {
        let list: MessageList = self
            .call(
                Method::GET,
                &format!("/threads/{thread_id}/messages?limit=1&order=desc"),
                NO_BODY,
            )
            .await?;
        Ok(list
            .data
            .into_iter()
            .next()
            .and_then(|message| message.content.into_iter().next())
            .map(ContentPart::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(base_url: &str) -> AssistantsClient {
        AssistantsClient::new(
            &SecretString::from("sk-test".to_string()),
            base_url,
            Duration::from_secs(5),
            1,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn create_thread_sends_auth_headers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/threads"))
            .and(header("authorization", "Bearer sk-test"))
            .and(header("openai-beta", "assistants=v2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "thread_abc", "object": "thread"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let id = test_client(&server.uri()).create_thread().await.unwrap();
        assert_eq!(id, "thread_abc");
    }

    #[tokio::test]
    async fn missing_thread_is_not_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/threads/thread_gone"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "error": {"message": "No thread found", "type": "invalid_request_error"}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/threads/thread_ok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "thread_ok"
            })))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        assert!(!client.thread_exists("thread_gone").await.unwrap());
        assert!(client.thread_exists("thread_ok").await.unwrap());
    }

    #[tokio::test]
    async fn create_run_forces_json_output() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/threads/t1/runs"))
            .and(body_json(serde_json::json!({
                "assistant_id": "asst_1",
                "response_format": {"type": "json_object"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "run_1", "status": "queued"
            })))
            .mount(&server)
            .await;

        let run = test_client(&server.uri())
            .create_run("t1", "asst_1", ResponseFormat::JsonObject)
            .await
            .unwrap();
        assert_eq!(run, "run_1");
    }

    #[tokio::test]
    async fn latest_message_returns_first_part() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/threads/t1/messages"))
            .and(query_param("limit", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{
                    "id": "msg_1",
                    "content": [
                        {"type": "text", "text": {"value": "{\"reply\":\"hi\"}", "annotations": []}},
                        {"type": "text", "text": {"value": "ignored", "annotations": []}}
                    ]
                }]
            })))
            .mount(&server)
            .await;

        let part = test_client(&server.uri()).latest_message("t1").await.unwrap();
        assert_eq!(part, Some(ContentPart::Text("{\"reply\":\"hi\"}".into())));
    }

    #[tokio::test]
    async fn retries_once_on_503() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/threads/t1/runs/r1"))
            .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/threads/t1/runs/r1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "r1", "status": "in_progress"
            })))
            .mount(&server)
            .await;

        let status = test_client(&server.uri())
            .run_status("t1", "r1")
            .await
            .unwrap();
        assert_eq!(status, RunStatus::InProgress);
    }

    #[tokio::test]
    async fn api_errors_surface_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/threads/t1/messages"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": {"message": "run is active", "type": "invalid_request_error"}
            })))
            .mount(&server)
            .await;

        let err = test_client(&server.uri())
            .post_message("t1", "hello")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("run is active"));
    }
}
