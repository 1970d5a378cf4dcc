// SPDX-FileCopyrightText: 2026 Wagent Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Client for the external OCR extraction endpoint.
//!
//! Files are posted as base64 JSON together with the sender's phone number.
//! The endpoint answers either `{"text": ...}` directly or wrapped in a
//! gateway envelope whose `body` field is itself a JSON string.

pub mod mime;

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use tracing::debug;
use wagent_config::model::OcrConfig;
use wagent_core::{
    AdapterType, HealthStatus, OcrErrorKind, PluginAdapter, TextExtractor, WagentError,
};

#[derive(Serialize)]
struct ExtractRequest<'a> {
    phone_number: &'a str,
    content_type: &'a str,
    file: String,
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    body: Option<String>,
}

#[derive(Deserialize)]
struct InnerBody {
    #[serde(default)]
    text: Option<String>,
}

pub struct OcrClient {
    http: reqwest::Client,
    endpoint: Option<String>,
    api_key: Option<String>,
    timeout: Duration,
}

impl OcrClient {
    pub fn new(config: &OcrConfig) -> Result<Self, WagentError> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| WagentError::ocr(OcrErrorKind::Upstream, e.to_string()))?;
        Ok(Self {
            http,
            endpoint: config.endpoint.clone().filter(|s| !s.is_empty()),
            api_key: config.api_key.clone().filter(|s| !s.is_empty()),
            timeout,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.endpoint.is_some() && self.api_key.is_some()
    }
}

fn parse_response(raw: &str) -> String {
    let Ok(envelope) = serde_json::from_str::<Envelope>(raw) else {
        return raw.to_string();
    };
    if let Some(text) = envelope.text {
        return text;
    }
    envelope
        .body
        .and_then(|body| serde_json::from_str::<InnerBody>(&body).ok())
        .and_then(|inner| inner.text)
        .unwrap_or_default()
}

#[async_trait]
impl TextExtractor for OcrClient {
    async fn extract_text(
        &self,
        bytes: &[u8],
        mime: &str,
        phone_number: &str,
    ) -> Result<String, WagentError> {
        let endpoint = self
            .endpoint
            .as_deref()
            .ok_or_else(|| WagentError::ocr(OcrErrorKind::NoConfiguration, "no endpoint"))?;
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| WagentError::ocr(OcrErrorKind::NoConfiguration, "no api key"))?;
        if phone_number.is_empty() {
            return Err(WagentError::ocr(
                OcrErrorKind::NoConfiguration,
                "no phone number",
            ));
        }

        let file = STANDARD.encode(bytes);
        let content_type = if mime.is_empty() {
            mime::sniff_base64(&file)
        } else {
            mime
        };
        let request = ExtractRequest {
            phone_number,
            content_type,
            file,
        };

        let response = self
            .http
            .post(endpoint)
            .header("x-api-key", api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    WagentError::ocr(
                        OcrErrorKind::Timeout,
                        format!("no answer within {:?}", self.timeout),
                    )
                } else {
                    WagentError::ocr(OcrErrorKind::Upstream, e.to_string())
                }
            })?;

        let status = response.status();
        let raw = response
            .text()
            .await
            .map_err(|e| WagentError::ocr(OcrErrorKind::Upstream, e.to_string()))?;
        if !status.is_success() {
            return Err(WagentError::ocr(
                OcrErrorKind::Upstream,
                format!("endpoint returned {status}: {raw}"),
            ));
        }
        let text = parse_response(&raw);
        debug!(content_type, chars = text.len(), "ocr extraction finished");
        Ok(text)
    }
}

#[async_trait]
impl PluginAdapter for OcrClient {
    fn name(&self) -> &str {
        "ocr-http"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Ocr
    }

    async fn health_check(&self) -> Result<HealthStatus, WagentError> {
        Ok(if self.is_configured() {
            HealthStatus::Healthy
        } else {
            HealthStatus::Degraded("endpoint or api key not configured".into())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(endpoint: Option<String>) -> OcrClient {
        OcrClient::new(&OcrConfig {
            endpoint,
            api_key: Some("secret".into()),
            timeout_secs: 2,
        })
        .unwrap()
    }

    #[test]
    fn parses_both_response_shapes() {
        assert_eq!(parse_response(r#"{"text":"direct"}"#), "direct");
        assert_eq!(
            parse_response(r#"{"statusCode":200,"body":"{\"text\":\"wrapped\"}"}"#),
            "wrapped"
        );
        assert_eq!(parse_response("plain words"), "plain words");
    }

    #[tokio::test]
    async fn posts_base64_with_sniffed_mime() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("x-api-key", "secret"))
            .and(body_partial_json(serde_json::json!({
                "phone_number": "15551234",
                "content_type": "application/pdf",
                "file": "JVBERi0xLjQ="
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "body": "{\"text\":\"invoice total 42\"}"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let text = client(Some(server.uri()))
            .extract_text(b"%PDF-1.4", "", "15551234")
            .await
            .unwrap();
        assert_eq!(text, "invoice total 42");
    }

    #[tokio::test]
    async fn missing_configuration_is_classified() {
        let err = client(None).extract_text(b"x", "image/png", "1").await.unwrap_err();
        assert!(matches!(
            err,
            WagentError::Ocr {
                kind: OcrErrorKind::NoConfiguration,
                ..
            }
        ));
        let err = client(Some("http://127.0.0.1:9".into()))
            .extract_text(b"x", "image/png", "")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no phone number"));
    }

    #[tokio::test]
    async fn slow_endpoint_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"text": "late"}))
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let err = client(Some(server.uri()))
            .extract_text(b"x", "image/png", "1")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            WagentError::Ocr {
                kind: OcrErrorKind::Timeout,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn upstream_failure_is_classified() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;
        let err = client(Some(server.uri()))
            .extract_text(b"x", "image/png", "1")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            WagentError::Ocr {
                kind: OcrErrorKind::Upstream,
                ..
            }
        ));
    }
}
