// SPDX-FileCopyrightText: 2026 Wagent Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use async_trait::async_trait;

use crate::error::WagentError;

/// Black-box text extraction for media attachments.
#[async_trait]
pub trait TextExtractor: Send + Sync + 'static {
    /// Extracts text from `bytes`. `mime` may be empty, in which case the
    /// implementation infers it.
    async fn extract_text(
        &self,
        bytes: &[u8],
        mime: &str,
        phone_number: &str,
    ) -> Result<String, WagentError>;
}
