// SPDX-FileCopyrightText: 2026 Wagent Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wire types for the Assistants API.

use serde::{Deserialize, Serialize};
use wagent_core::{ContentPart, RunStatus};

#[derive(Debug, Deserialize)]
pub struct ThreadObject {
    pub id: String,
}

#[derive(Debug, Serialize)]
pub struct CreateMessageRequest<'a> {
    pub role: &'a str,
    pub content: &'a str,
}

#[derive(Debug, Serialize)]
pub struct CreateRunRequest<'a> {
    pub assistant_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormatParam>,
}

#[derive(Debug, Serialize)]
pub struct ResponseFormatParam {
    #[serde(rename = "type")]
    pub kind: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct RunObject {
    pub id: String,
    pub status: RunStatus,
}

#[derive(Debug, Deserialize)]
pub struct MessageList {
    #[serde(default)]
    pub data: Vec<ThreadMessage>,
}

#[derive(Debug, Deserialize)]
pub struct ThreadMessage {
    #[serde(default)]
    pub content: Vec<RawContentPart>,
}

#[derive(Debug, Deserialize)]
pub struct RawContentPart {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: Option<TextValue>,
}

#[derive(Debug, Deserialize)]
pub struct TextValue {
    pub value: String,
}

impl From<RawContentPart> for ContentPart {
    fn from(part: RawContentPart) -> Self {
        match (part.kind.as_str(), part.text) {
            ("text", Some(text)) => ContentPart::Text(text.value),
            _ => ContentPart::Other(part.kind),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorDetail {
    pub message: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}
