// SPDX-FileCopyrightText: 2026 Nexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Credential scrubbing for log output and upstream error text.
//!
//! Upstream error bodies sometimes echo request headers, and log lines carry
//! whatever callers put in them. Both pass through [`scrub`] first.

use std::io::Write;
use std::sync::LazyLock;

use regex::Regex;

static SECRET_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        // Gateway API keys.
        r"nx-[A-Za-z0-9_\-]{20,}",
        // OpenAI-style secret keys.
        r"sk-[A-Za-z0-9_\-]{20,}",
        // Bearer tokens in headers.
        r"Bearer\s+[A-Za-z0-9._\-]{10,}",
        // Azure subscription keys in `api-key: ...` or `Ocp-Apim-Subscription-Key: ...`.
        r"(?i)(?:api-key|subscription-key)\W{1,3}[A-Za-z0-9]{16,}",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("built-in secret pattern must compile"))
    .collect()
});

/// The scrub placeholder.
pub const SCRUBBED: &str = "[REDACTED]";

/// Replace known credential shapes, plus any exact `known` values, with [`SCRUBBED`].
pub fn scrub(input: &str, known: &[&str]) -> String {
    let mut result = input.to_string();
    for pattern in SECRET_PATTERNS.iter() {
        if pattern.is_match(&result) {
            result = pattern.replace_all(&result, SCRUBBED).into_owned();
        }
    }

    let mut known: Vec<&str> = known.iter().copied().filter(|v| !v.is_empty()).collect();
    known.sort_by_key(|v| std::cmp::Reverse(v.len()));
    for value in known {
        result = result.replace(value, SCRUBBED);
    }
    result
}

/// A writer that scrubs credentials from everything passing through it.
///
/// Each `write` call is scrubbed independently, which matches how
/// `tracing-subscriber` emits one formatted event per call.
pub struct ScrubbingWriter<W> {
    inner: W,
}

impl<W: Write> ScrubbingWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }
}

impl<W: Write> Write for ScrubbingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let input = String::from_utf8_lossy(buf);
        self.inner.write_all(scrub(&input, &[]).as_bytes())?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scrubs_gateway_key() {
        let out = scrub("lookup for nx-AbCdEfGhIjKlMnOpQrStUvWx failed", &[]);
        assert_eq!(out, "lookup for [REDACTED] failed");
    }

    #[test]
    fn scrubs_bearer_and_openai_keys() {
        let out = scrub(
            "Authorization: Bearer abcdefghijklmnop, key sk-proj-abcdefghijklmnopqrstu",
            &[],
        );
        assert!(!out.contains("abcdefghijklmnop"));
        assert!(!out.contains("sk-proj"));
    }

    #[test]
    fn scrubs_azure_header_echo() {
        let out = scrub("header api-key: 0123456789abcdef0123456789abcdef rejected", &[]);
        assert!(!out.contains("0123456789abcdef"));
    }

    #[test]
    fn scrubs_known_values_longest_first() {
        let out = scrub("secret=hunter2hunter2", &["hunter2", "hunter2hunter2"]);
        assert_eq!(out, "secret=[REDACTED]");
    }

    #[test]
    fn leaves_plain_text_alone() {
        assert_eq!(scrub("upstream returned 503", &[]), "upstream returned 503");
    }

    #[test]
    fn writer_scrubs_output() {
        let mut buf = Vec::new();
        {
            let mut writer = ScrubbingWriter::new(&mut buf);
            writer
                .write_all(b"auth Bearer eyJhbGciOiJIUzI1NiJ9.payload\n")
                .unwrap();
        }
        let output = String::from_utf8(buf).unwrap();
        assert_eq!(output, "auth [REDACTED]\n");
    }
}
