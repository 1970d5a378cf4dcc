// SPDX-FileCopyrightText: 2026 Wagent Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use wagent_core::{OcrErrorKind, TextExtractor, WagentError};

use crate::lock;

/// Text extractor returning a fixed string.
pub struct MockOcr {
    text: String,
    fail: AtomicBool,
    calls: Mutex<Vec<(String, String)>>,
}

impl MockOcr {
    pub fn returning(text: &str) -> Self {
        Self {
            text: text.to_string(),
            fail: AtomicBool::new(false),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// `(mime, phone_number)` of every call.
    pub fn calls(&self) -> Vec<(String, String)> {
        lock(&self.calls).clone()
    }
}

#[async_trait]
impl TextExtractor for MockOcr {
    async fn extract_text(
        &self,
        _bytes: &[u8],
        mime: &str,
        phone_number: &str,
    ) -> Result<String, WagentError> {
        lock(&self.calls).push((mime.to_string(), phone_number.to_string()));
        if self.fail.load(Ordering::SeqCst) {
            return Err(WagentError::ocr(OcrErrorKind::Upstream, "status 502"));
        }
        Ok(self.text.clone())
    }
}
