// SPDX-FileCopyrightText: 2026 dws-mcp Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Secret redaction for log output and logged error messages.
//!
//! Known credential formats are caught by regex; the configured API key is
//! also replaced by exact match.

use std::io::Write;
use std::sync::{Arc, LazyLock};

use regex::Regex;

static REDACTION_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        // Bearer tokens in headers
        r"Bearer\s+[a-zA-Z0-9._\-]{10,}",
        // Processing API keys: pdf_live_..., pdf_test_...
        r"pdf_(?:live|test)_[a-zA-Z0-9]{16,}",
    ]
    .into_iter()
    .filter_map(|pattern| Regex::new(pattern).ok())
    .collect()
});

const REDACTED: &str = "[REDACTED]";

/// Replaces secrets in text.
#[derive(Debug, Clone, Default)]
pub struct Redactor {
    /// Exact values, longest first.
    secrets: Arc<Vec<String>>,
}

impl Redactor {
    pub fn new(secrets: impl IntoIterator<Item = String>) -> Self {
        let mut secrets: Vec<String> = secrets.into_iter().filter(|s| !s.is_empty()).collect();
        secrets.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        secrets.dedup();
        Self {
            secrets: Arc::new(secrets),
        }
    }

    pub fn redact(&self, input: &str) -> String {
        let mut result = input.to_string();
        for pattern in REDACTION_PATTERNS.iter() {
            result = pattern.replace_all(&result, REDACTED).into_owned();
        }
        for secret in self.secrets.iter() {
            result = result.replace(secret.as_str(), REDACTED);
        }
        result
    }
}

/// A writer that redacts secrets before forwarding to `inner`.
pub struct RedactingWriter<W> {
    inner: W,
    redactor: Redactor,
}

impl<W: Write> RedactingWriter<W> {
    pub fn new(inner: W, redactor: Redactor) -> Self {
        Self { inner, redactor }
    }
}

impl<W: Write> Write for RedactingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let input = String::from_utf8_lossy(buf);
        self.inner
            .write_all(self.redactor.redact(&input).as_bytes())?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}
