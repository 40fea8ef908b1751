//! Log sanitization for clinical measurements and key material.
//!
//! Formatted log lines pass through [`SanitizingMakeWriter`] before they
//! reach the sink. It redacts:
//! - measurement assignments such as `glucose=148` or `BMI: 33.6`
//! - UUIDs and e-mail addresses
//! - long hex strings (hashes, key bytes) and contextual base64 secrets
//!
//! Call sites should still avoid logging feature values at all; this is the
//! fallback for the ones that slip through.

use regex::{Regex, RegexSet};
use std::sync::OnceLock;
use tracing_subscriber::fmt::MakeWriter;

static PATTERNS: OnceLock<Patterns> = OnceLock::new();

/// Lines longer than this are cut before scanning.
const MAX_SANITIZE_BYTES: usize = 16 * 1024;

struct Rule {
    regex: Regex,
    replacement: &'static str,
}

struct Patterns {
    set: RegexSet,
    rules: Vec<Rule>,
}

fn patterns() -> &'static Patterns {
    PATTERNS.get_or_init(|| {
        let rules: Vec<(&'static str, &'static str)> = vec![
            // Measurement assignments; keep the field name, drop the number.
            (
                r"(?i)\b(pregnancies|glucose|blood[ _]?pressure|skin[ _]?thickness|insulin|bmi|diabetes[ _]?pedigree(?:[ _]?function)?|dpf|age)\b(\s*[:=]\s*)-?(?:\d+(?:\.\d*)?|\.\d+|nan|inf(?:inity)?)",
                "${1}${2}[REDACTED]",
            ),
            (
                r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}",
                "[REDACTED-UUID]",
            ),
            (
                r"(?i)\b[a-z0-9](?:[a-z0-9._%+-]{0,62}[a-z0-9])?@(?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z]{2,}\b",
                "[REDACTED-EMAIL]",
            ),
            (
                r"(?i)\b(?:seed|secret|private[_-]?key|signing[_-]?key|token)\b\s*[:=]\s*[A-Za-z0-9+/]{32,}={0,2}",
                "[REDACTED-SECRET]",
            ),
            (r"\b[0-9a-fA-F]{32,}\b", "[REDACTED-KEY]"),
        ];

        // Static patterns; a failure here is a programming error.
        let set = RegexSet::new(rules.iter().map(|(p, _)| *p)).expect("Valid regex set");
        let rules = rules
            .into_iter()
            .map(|(pattern, replacement)| Rule {
                regex: Regex::new(pattern).expect("Valid regex"),
                replacement,
            })
            .collect();

        Patterns { set, rules }
    })
}

fn truncate_to_char_boundary(input: &str, max_bytes: usize) -> (&str, bool) {
    if input.len() <= max_bytes {
        return (input, false);
    }
    let mut end = max_bytes;
    while end > 0 && !input.is_char_boundary(end) {
        end -= 1;
    }
    (&input[..end], true)
}

/// Redact sensitive values from `input`.
#[must_use]
pub fn sanitize(input: &str) -> String {
    sanitize_with_limit(input, MAX_SANITIZE_BYTES)
}

fn sanitize_with_limit(input: &str, max_bytes: usize) -> String {
    let patterns = patterns();
    let (prefix, truncated) = truncate_to_char_boundary(input, max_bytes);

    let mut result = prefix.to_string();
    for idx in patterns.set.matches(prefix).into_iter() {
        let rule = &patterns.rules[idx];
        result = rule.regex.replace_all(&result, rule.replacement).into_owned();
    }

    if truncated {
        result.push_str(" [TRUNCATED]");
    }
    result
}

/// Whether `input` contains anything [`sanitize`] would redact.
#[must_use]
pub fn contains_sensitive(input: &str) -> bool {
    let (prefix, _) = truncate_to_char_boundary(input, MAX_SANITIZE_BYTES);
    patterns().set.is_match(prefix)
}

/// A `tracing_subscriber` writer wrapper that sanitizes each formatted line
/// before it is written to the underlying sink.
#[derive(Debug, Clone)]
pub struct SanitizingMakeWriter<M> {
    inner: M,
}

impl<M> SanitizingMakeWriter<M> {
    #[must_use]
    pub fn new(inner: M) -> Self {
        Self { inner }
    }
}

pub struct SanitizingWriter<W: std::io::Write> {
    inner: W,
    buffer: Vec<u8>,
}

impl<W: std::io::Write> SanitizingWriter<W> {
    fn new(inner: W) -> Self {
        Self {
            inner,
            buffer: Vec::new(),
        }
    }

    fn write_sanitized(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        let text = String::from_utf8_lossy(bytes);
        self.inner.write_all(sanitize(&text).as_bytes())
    }

    fn flush_lines(&mut self) -> std::io::Result<()> {
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            self.write_sanitized(&line)?;
        }
        Ok(())
    }
}

impl<W: std::io::Write> std::io::Write for SanitizingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.extend_from_slice(buf);

        // A formatter that never emits a newline must not grow the buffer forever.
        if self.buffer.len() > MAX_SANITIZE_BYTES * 2 {
            let pending = std::mem::take(&mut self.buffer);
            self.write_sanitized(&pending)?;
            self.inner.write_all(b"\n")?;
            return Ok(buf.len());
        }

        self.flush_lines()?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_lines()?;
        if !self.buffer.is_empty() {
            let pending = std::mem::take(&mut self.buffer);
            self.write_sanitized(&pending)?;
        }
        self.inner.flush()
    }
}

impl<W: std::io::Write> Drop for SanitizingWriter<W> {
    fn drop(&mut self) {
        // The fmt layer drops the writer after each event without flushing.
        let _ = std::io::Write::flush(self);
    }
}

impl<'a, M> MakeWriter<'a> for SanitizingMakeWriter<M>
where
    M: MakeWriter<'a>,
{
    type Writer = SanitizingWriter<M::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        SanitizingWriter::new(self.inner.make_writer())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_sanitize_measurements() {
        let out = sanitize("submitted glucose=148 bmi: 33.6 Age=50 pregnancies = 6");
        assert!(!out.contains("148"));
        assert!(!out.contains("33.6"));
        assert!(!out.contains("50"));
        assert!(!out.contains('6'));
        assert!(out.contains("glucose=[REDACTED]"));
        assert!(out.contains("bmi: [REDACTED]"));
    }

    #[test]
    fn test_sanitize_spaced_field_names() {
        let out = sanitize("Blood Pressure: 72, skin_thickness=35, DiabetesPedigree=0.627");
        assert!(!out.contains("72"));
        assert!(!out.contains("35"));
        assert!(!out.contains("0.627"));
    }

    #[test]
    fn test_plain_text_is_untouched() {
        let line = "Loaded model from \"models/model.json\" (n_features=8, threshold=0.5)";
        assert_eq!(sanitize(line), line);
        assert!(!contains_sensitive(line));
    }

    #[test]
    fn test_sanitize_uuid_and_email() {
        let out = sanitize("id 550e8400-e29b-41d4-a716-446655440000 from nurse@clinic.org");
        assert!(out.contains("[REDACTED-UUID]"));
        assert!(out.contains("[REDACTED-EMAIL]"));
    }

    #[test]
    fn test_sanitize_key_material() {
        let out = sanitize("sha256 0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef");
        assert!(out.contains("[REDACTED-KEY]"));

        let out = sanitize("seed=QWxhZGRpbjpvcGVuIHNlc2FtZSB3aXRoIGxvbmcgc2VjcmV0IHZhbHVl");
        assert!(out.contains("[REDACTED-SECRET]"));
    }

    #[test]
    fn test_truncates_large_inputs() {
        let out = sanitize_with_limit("prefix glucose=148 suffix", 10);
        assert!(out.ends_with("[TRUNCATED]"));
    }

    #[derive(Clone, Default)]
    struct Sink(Arc<Mutex<Vec<u8>>>);

    impl Write for Sink {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().expect("sink lock").extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_writer_sanitizes_lines() {
        let sink = Sink::default();
        {
            let mut writer = SanitizingWriter::new(sink.clone());
            writer.write_all(b"insulin=").expect("write");
            writer.write_all(b"94 accepted\nno newline yet age=41").expect("write");
        }
        let written = String::from_utf8(sink.0.lock().expect("sink lock").clone()).expect("utf8");
        assert_eq!(written, "insulin=[REDACTED] accepted\nno newline yet age=[REDACTED]");
    }
}
