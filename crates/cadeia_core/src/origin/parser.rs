//! Origin reference parser.
//!
//! Passes run cumulatively over the same text; a later pass only adds
//! identifiers that earlier passes did not produce:
//! 1. prefix letter immediately followed by digits (`T001`);
//! 2. prefix letter, separator, digits (`T-001`, `M 45`, `T.9`);
//! 3. bare runs of three or more digits, assumed to be matrículas;
//! 4. keywords `transcrição`/`matrícula`, optionally abbreviated `nº`,
//!    `n.º` or `no.`, followed by digits.
//!
//! Spans consumed by prefixed or keyword matches are masked before the bare
//! digit pass, so `T-001` never also yields `M001`.

use crate::model::document::DocumentKind;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt::{Display, Formatter};

static DIRECT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b([MT])(\d+)\b").expect("valid direct ref regex"));
static SPACED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b([MT])\s*[-.]\s*(\d+)\b|\b([MT])\s+(\d+)\b").expect("valid spaced ref regex")
});
static KEYWORD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(transcri[çc][ãa]o|matr[íi]cula)s?\s*(?:n\.?\s*[º°o]?\.?\s*)?[-:.]?\s*(\d+(?:\.\d{3})*)",
    )
    .expect("valid keyword ref regex")
});
static BARE_DIGITS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{3,})\b").expect("valid bare digits regex"));

/// One normalized reference to a registry document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct OriginRef {
    /// Uppercase series prefix, `M` or `T`.
    pub prefix: char,
    /// Digits exactly as written, leading zeros kept.
    pub digits: String,
}

impl OriginRef {
    pub fn new(prefix: char, digits: impl Into<String>) -> Self {
        Self {
            prefix: prefix.to_ascii_uppercase(),
            digits: digits.into(),
        }
    }

    /// Normalized identifier, `<Prefix><Digits>`.
    pub fn key(&self) -> String {
        format!("{}{}", self.prefix, self.digits)
    }

    pub fn kind(&self) -> Option<DocumentKind> {
        DocumentKind::from_prefix(self.prefix)
    }

    /// Same digits under the other series prefix.
    pub fn with_prefix(&self, prefix: char) -> Self {
        Self::new(prefix, self.digits.clone())
    }
}

impl Display for OriginRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.prefix, self.digits)
    }
}

/// Parses free-text origin into a deduplicated identifier list.
///
/// Empty input yields an empty list. Output order follows discovery order
/// but callers must not rely on it.
pub fn parse_origins(text: &str) -> Vec<OriginRef> {
    let mut collector = Collector::default();
    if text.trim().is_empty() {
        return collector.refs;
    }

    let mut consumed: Vec<(usize, usize)> = Vec::new();

    for caps in DIRECT_RE.captures_iter(text) {
        if let (Some(whole), Some(prefix), Some(digits)) = (caps.get(0), caps.get(1), caps.get(2)) {
            collector.push(first_char(prefix.as_str()), digits.as_str());
            consumed.push((whole.start(), whole.end()));
        }
    }

    for caps in SPACED_RE.captures_iter(text) {
        let (Some(whole), Some(prefix), Some(digits)) = (
            caps.get(0),
            caps.get(1).or_else(|| caps.get(3)),
            caps.get(2).or_else(|| caps.get(4)),
        ) else {
            continue;
        };
        collector.push(first_char(prefix.as_str()), digits.as_str());
        consumed.push((whole.start(), whole.end()));
    }

    let mut keyword_refs = Vec::new();
    for caps in KEYWORD_RE.captures_iter(text) {
        if let (Some(whole), Some(word), Some(digits)) = (caps.get(0), caps.get(1), caps.get(2)) {
            let prefix = if word.as_str().to_lowercase().starts_with("transcri") {
                'T'
            } else {
                'M'
            };
            // Thousands separators: `1.234` is number 1234.
            keyword_refs.push(OriginRef::new(prefix, digits.as_str().replace('.', "")));
            consumed.push((whole.start(), whole.end()));
        }
    }

    let masked = mask_spans(text, &consumed);
    for caps in BARE_DIGITS_RE.captures_iter(&masked) {
        if let Some(digits) = caps.get(1) {
            collector.push('M', digits.as_str());
        }
    }

    for origin in keyword_refs {
        collector.push(origin.prefix, origin.digits.as_str());
    }

    collector.refs
}

/// Parses origin text and returns normalized identifier keys only.
pub fn parse_origin_keys(text: &str) -> Vec<String> {
    parse_origins(text).iter().map(OriginRef::key).collect()
}

#[derive(Default)]
struct Collector {
    seen: HashSet<String>,
    refs: Vec<OriginRef>,
}

impl Collector {
    fn push(&mut self, prefix: char, digits: &str) {
        let origin = OriginRef::new(prefix, digits);
        if self.seen.insert(origin.key()) {
            self.refs.push(origin);
        }
    }
}

fn first_char(value: &str) -> char {
    value.chars().next().unwrap_or('M')
}

fn mask_spans(text: &str, spans: &[(usize, usize)]) -> String {
    text.char_indices()
        .map(|(index, c)| {
            if spans.iter().any(|(start, end)| index >= *start && index < *end) {
                ' '
            } else {
                c
            }
        })
        .collect()
}
