//! Stand-off annotation records and parsing.
//!
//! BRAT-style `.ann` files carry one record per line, tab-separated:
//!
//! ```text
//! T1\tTobacco 10 16\tsmoker          span: label, char offsets, surface text
//! T2\tStatus 2 9\tcurrent
//! E1\tTobacco:T1 Status:T2            event: role:span-id member list
//! ```
//!
//! Span offsets are **character** offsets into the companion `.txt` file,
//! half-open `[start, end)`. Record IDs are local to one document; nothing
//! here assumes they are unique across a corpus.
//!
//! Parsing never fails as a whole. Lines with no tab at all carry no payload
//! and are skipped silently (this tolerates trailing junk); lines that clear
//! that bar but cannot yield a record are skipped and reported as
//! [`ParseIssue`]s so a corpus run can keep going and surface the damage in
//! its report. Line types other than `T` and `E` (BRAT attributes, notes,
//! relations) are ignored without comment.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// =============================================================================
// Records
// =============================================================================

/// One `T` line: a labeled text span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanRecord {
    /// Record ID as written in the file (e.g. `"T3"`).
    pub id: String,
    /// Span label (e.g. `"Tobacco"`, `"Status"`).
    pub label: String,
    /// Start character offset, inclusive.
    pub start: usize,
    /// End character offset, exclusive.
    pub end: usize,
    /// Surface text as recorded in the annotation file.
    pub text: String,
}

/// One `role:span-id` token inside an `E` line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMember {
    /// Role label (e.g. `"Tobacco"`, `"Status"`).
    pub role: String,
    /// ID of the referenced span record.
    pub ref_id: String,
}

/// One `E` line: an event grouping span records under roles.
///
/// The trigger token BRAT writes first is kept as an ordinary member; relation
/// resolution only cares about which span texts an event touches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Record ID as written in the file (e.g. `"E1"`).
    pub id: String,
    /// Member tokens in file order.
    pub members: Vec<EventMember>,
}

impl EventRecord {
    /// The event's anchoring label: the role of its first member token.
    ///
    /// Only events anchored by an entity label express relations; the rest
    /// are dropped when the relation index is built.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.members.first().map(|m| m.role.as_str())
    }
}

/// All records parsed from one `.ann` file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentAnnotations {
    /// Every well-formed span record, in file order.
    pub spans: Vec<SpanRecord>,
    /// Every well-formed event record, in file order.
    pub events: Vec<EventRecord>,
}

impl DocumentAnnotations {
    /// True when the file contributed no records at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty() && self.events.is_empty()
    }

    /// Map from span ID to surface text.
    ///
    /// Every span is included regardless of label, so event members that
    /// reference spans outside any schema still resolve to their text.
    #[must_use]
    pub fn span_texts(&self) -> HashMap<&str, &str> {
        self.spans
            .iter()
            .map(|s| (s.id.as_str(), s.text.as_str()))
            .collect()
    }
}

/// A malformed line skipped during parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseIssue {
    /// 1-based line number in the `.ann` file.
    pub line: usize,
    /// What was wrong with the line.
    pub message: String,
}

// =============================================================================
// Parsing
// =============================================================================

/// Parse the contents of an `.ann` file.
///
/// Returns everything that parsed plus one [`ParseIssue`] per skipped line.
/// A file of pure garbage yields an empty [`DocumentAnnotations`] and a long
/// issue list, never an error.
#[must_use]
pub fn parse_standoff(content: &str) -> (DocumentAnnotations, Vec<ParseIssue>) {
    let mut doc = DocumentAnnotations::default();
    let mut issues = Vec::new();

    for (idx, raw) in content.lines().enumerate() {
        // lines() keeps a bare trailing '\r' on an unterminated final CRLF
        // line; strip only that. Trailing spaces belong to the text column.
        let line = raw.strip_suffix('\r').unwrap_or(raw);
        // A record needs at least two tab fields; anything shorter is noise,
        // not a reportable line.
        if line.is_empty() || !line.contains('\t') {
            continue;
        }
        let line_no = idx + 1;
        if line.starts_with('T') {
            match parse_span_line(line) {
                Ok(span) => doc.spans.push(span),
                Err(message) => issues.push(ParseIssue {
                    line: line_no,
                    message,
                }),
            }
        } else if line.starts_with('E') {
            match parse_event_line(line) {
                Ok(event) => doc.events.push(event),
                Err(message) => issues.push(ParseIssue {
                    line: line_no,
                    message,
                }),
            }
        }
        // A (attributes), R (relations), # (notes) and friends are not used.
    }

    (doc, issues)
}

/// Parse `T<id>\t<label> <start> <end>\t<text>`.
fn parse_span_line(line: &str) -> std::result::Result<SpanRecord, String> {
    let mut fields = line.splitn(3, '\t');
    let id = fields.next().unwrap_or_default();
    let Some(anchor) = fields.next() else {
        return Err(format!("span line '{id}' has no label field"));
    };
    let Some(text) = fields.next() else {
        return Err(format!("span line '{id}' has no text field"));
    };

    let mut parts = anchor.split_whitespace();
    let label = parts
        .next()
        .ok_or_else(|| format!("span line '{id}' has an empty label field"))?;
    let start = parts
        .next()
        .ok_or_else(|| format!("span line '{id}' is missing offsets"))?;
    let end = parts
        .next()
        .ok_or_else(|| format!("span line '{id}' is missing its end offset"))?;
    if parts.next().is_some() {
        // Discontinuous spans ("10 15;20 25") land here via the ';' chunk.
        return Err(format!("span line '{id}' has trailing offset tokens"));
    }

    let start: usize = start
        .parse()
        .map_err(|_| format!("span line '{id}' has a non-numeric start offset '{start}'"))?;
    let end: usize = end
        .parse()
        .map_err(|_| format!("span line '{id}' has a non-numeric end offset '{end}'"))?;
    if start >= end {
        return Err(format!(
            "span line '{id}' has an empty or inverted range {start}..{end}"
        ));
    }

    Ok(SpanRecord {
        id: id.to_string(),
        label: label.to_string(),
        start,
        end,
        text: text.to_string(),
    })
}

/// Parse `E<id>\t<role>:<ref> <role>:<ref> ...`.
///
/// Tokens without a `:` separator are dropped with a warning rather than
/// poisoning the whole line.
fn parse_event_line(line: &str) -> std::result::Result<EventRecord, String> {
    let mut fields = line.splitn(2, '\t');
    let id = fields.next().unwrap_or_default();
    let Some(member_field) = fields.next() else {
        return Err(format!("event line '{id}' has no member field"));
    };

    let mut members = Vec::new();
    for token in member_field.split_whitespace() {
        match token.split_once(':') {
            Some((role, ref_id)) if !role.is_empty() && !ref_id.is_empty() => {
                members.push(EventMember {
                    role: role.to_string(),
                    ref_id: ref_id.to_string(),
                });
            }
            _ => {
                log::warn!("event '{id}': skipping malformed member token '{token}'");
            }
        }
    }

    Ok(EventRecord {
        id: id.to_string(),
        members,
    })
}
