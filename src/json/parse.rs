//! Purpose: Provide the internal JSON parse entrypoints and failure categorization.
//! Exports: `probe`, `ParseFailureCategory`, `categorize_error`, `categorize_message`, `hint_for_error`.
//! Role: Parser boundary that centralizes serde_json usage details.
//! Invariants: Category labels are stable and never echo payload bytes.
//! Notes: Error mapping into `core::error` is done by callsites so type context stays explicit.

use serde_json::Value;
use serde_json::error::Category;

/// Parse a fragment into a generic tree so its outer shape can be inspected.
pub(crate) fn probe(input: &[u8]) -> Result<Value, serde_json::Error> {
    serde_json::from_slice(input)
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum ParseFailureCategory {
    Syntax,
    Data,
    Eof,
    Io,
    DepthLimit,
    Unknown,
}

impl ParseFailureCategory {
    pub(crate) fn label(self) -> &'static str {
        match self {
            ParseFailureCategory::Syntax => "syntax",
            ParseFailureCategory::Data => "data",
            ParseFailureCategory::Eof => "eof",
            ParseFailureCategory::Io => "io",
            ParseFailureCategory::DepthLimit => "depth-limit",
            ParseFailureCategory::Unknown => "unknown",
        }
    }
}

pub(crate) fn categorize_error(err: &serde_json::Error) -> ParseFailureCategory {
    // serde_json reports recursion overflow as a syntax error.
    if categorize_message(&err.to_string()) == ParseFailureCategory::DepthLimit {
        return ParseFailureCategory::DepthLimit;
    }
    match err.classify() {
        Category::Syntax => ParseFailureCategory::Syntax,
        Category::Data => ParseFailureCategory::Data,
        Category::Eof => ParseFailureCategory::Eof,
        Category::Io => ParseFailureCategory::Io,
    }
}

pub(crate) fn categorize_message(message: &str) -> ParseFailureCategory {
    let lower = message.to_ascii_lowercase();
    if lower.contains("recursion limit") {
        ParseFailureCategory::DepthLimit
    } else if lower.contains("eof while parsing") {
        ParseFailureCategory::Eof
    } else if lower.contains("invalid type") || lower.contains("missing field") {
        ParseFailureCategory::Data
    } else if lower.contains("expected value") || lower.contains("trailing characters") {
        ParseFailureCategory::Syntax
    } else {
        ParseFailureCategory::Unknown
    }
}

pub(crate) fn hint_for_error(err: &serde_json::Error, context: &str) -> String {
    let category = categorize_error(err).label();
    // Errors raised outside a byte stream (e.g. `from_value`) carry no position.
    if err.line() == 0 && err.column() == 0 {
        return format!("parse category: {category}; context: {context}");
    }
    format!(
        "parse category: {category}; line {} column {}; context: {context}",
        err.line(),
        err.column()
    )
}
