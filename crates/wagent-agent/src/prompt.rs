// SPDX-FileCopyrightText: 2026 Wagent Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prompt assembly and structured-reply parsing.

use serde::Deserialize;
use serde_json::Value;
use wagent_core::ContentPart;

/// Reply used when the assistant produced nothing usable.
pub const FALLBACK_REPLY: &str = "I couldn't generate a response.";

/// Text sent back to the user when processing fails.
pub const ERROR_NOTICE: &str = "Error in processing message with AI";

const JSON_INSTRUCTION: &str = "\n\nReturn the final answer as JSON with keys: reply, shouldRespond. Only output a single valid JSON object.";

/// Builds the assistant prompt for one inbound message.
///
/// `attachments` holds text extracted from the message's files, in order.
pub fn build_prompt(body: &str, attachments: &[String]) -> String {
    let mut prompt = format!("The user has asked: {body}");
    if !attachments.is_empty() {
        prompt.push_str("\nThis is the context from files provided by the user:");
    }
    prompt.push_str(JSON_INSTRUCTION);
    for (i, text) in attachments.iter().enumerate() {
        prompt.push_str(&format!(
            "\n\nIn the file File{i} you have the following data:\n{text}\nEnd of file File{i}"
        ));
    }
    prompt
}

/// Parsed assistant output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AiReply {
    pub reply: String,
    pub should_respond: bool,
}

impl AiReply {
    fn fallback() -> Self {
        Self {
            reply: FALLBACK_REPLY.to_string(),
            should_respond: false,
        }
    }
}

#[derive(Deserialize)]
struct RawReply {
    #[serde(default)]
    reply: Option<Value>,
    #[serde(default, rename = "shouldRespond")]
    should_respond: Option<Value>,
}

/// Interprets the first content part of the assistant's latest message.
///
/// Only a literal JSON `true` for `shouldRespond` enables a reply. Text that
/// is not a JSON object becomes the reply verbatim with `should_respond`
/// off.
pub fn parse_reply(part: Option<&ContentPart>) -> AiReply {
    let Some(ContentPart::Text(raw)) = part else {
        return AiReply::fallback();
    };

    match serde_json::from_str::<RawReply>(raw) {
        Ok(parsed) => {
            let reply = match parsed.reply {
                Some(Value::String(s)) if !s.is_empty() => s,
                _ => raw.clone(),
            };
            AiReply {
                reply,
                should_respond: matches!(parsed.should_respond, Some(Value::Bool(true))),
            }
        }
        Err(_) => AiReply {
            reply: raw.clone(),
            should_respond: false,
        },
    }
}
