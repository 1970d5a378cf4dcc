// SPDX-FileCopyrightText: 2026 Wagent Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

/// Infers a MIME type from the leading characters of base64 data.
pub fn sniff_base64(data: &str) -> &'static str {
    const SIGNATURES: &[(&str, &str)] = &[
        ("JVBERi0", "application/pdf"),
        ("/9j/", "image/jpeg"),
        ("iVBORw0KGgo", "image/png"),
        ("SUkq", "image/tiff"),
        ("TU0A", "image/tiff"),
    ];
    SIGNATURES
        .iter()
        .find(|(prefix, _)| data.starts_with(prefix))
        .map(|(_, mime)| *mime)
        .unwrap_or("application/octet-stream")
}
