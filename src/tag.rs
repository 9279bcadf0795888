//! Span marker insertion for classifier input.
//!
//! Takes raw document text plus one entity span and one attribute span and
//! returns the text with four boundary markers spliced in, by default
//! `<e>...</e>` around the entity and `<a>...</a>` around the attribute.
//!
//! All four insertions happen in **one combined pass from the highest offset
//! down**. Inserting high-to-low means no insertion ever shifts an offset
//! that is still pending, which is what makes the two spans tag correctly in
//! either textual order and under full containment. Tagging the spans one
//! after the other against the original offsets is exactly the bug this
//! module exists to avoid.
//!
//! Offsets are character offsets, as stand-off annotation counts them; the
//! conversion to byte positions happens here, against the original text.
//!
//! Partial overlap between the two spans is not meaningful input. The pass
//! still terminates and keeps every original character, but the marker
//! interleaving it produces is unspecified.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

// =============================================================================
// Markers
// =============================================================================

/// The four boundary markers spliced around a candidate pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerSet {
    /// Opening marker for the entity span.
    pub entity_open: String,
    /// Closing marker for the entity span.
    pub entity_close: String,
    /// Opening marker for the attribute span.
    pub attribute_open: String,
    /// Closing marker for the attribute span.
    pub attribute_close: String,
}

impl Default for MarkerSet {
    fn default() -> Self {
        MarkerSet::new("<e>", "</e>", "<a>", "</a>")
    }
}

impl MarkerSet {
    /// Create a marker set from explicit tokens.
    pub fn new(
        entity_open: impl Into<String>,
        entity_close: impl Into<String>,
        attribute_open: impl Into<String>,
        attribute_close: impl Into<String>,
    ) -> Self {
        MarkerSet {
            entity_open: entity_open.into(),
            entity_close: entity_close.into(),
            attribute_open: attribute_open.into(),
            attribute_close: attribute_close.into(),
        }
    }

    /// Total byte length of all four markers.
    ///
    /// Tagged output is always exactly this much longer than its input.
    #[must_use]
    pub fn total_len(&self) -> usize {
        self.entity_open.len()
            + self.entity_close.len()
            + self.attribute_open.len()
            + self.attribute_close.len()
    }

    /// Reject marker sets with an empty token.
    ///
    /// An empty marker would tag silently and make the output impossible to
    /// strip back to the original text.
    pub fn validate(&self) -> Result<()> {
        let tokens = [
            ("entity_open", &self.entity_open),
            ("entity_close", &self.entity_close),
            ("attribute_open", &self.attribute_open),
            ("attribute_close", &self.attribute_close),
        ];
        for (name, token) in tokens {
            if token.is_empty() {
                return Err(Error::invalid_config(format!("{name} marker is empty")));
            }
        }
        Ok(())
    }
}

// =============================================================================
// Insertion
// =============================================================================

/// One pending marker insertion.
struct Insertion<'a> {
    /// Character position the marker goes in front of.
    pos: usize,
    /// Opening marker (closing markers sit at span ends).
    open: bool,
    /// Belongs to the entity span (tie-break for identical spans).
    entity: bool,
    /// The span this marker delimits.
    span: (usize, usize),
    marker: &'a str,
}

/// Processing order for the descending pass.
///
/// Highest position first, so earlier inserts never shift pending ones. At
/// a shared position the marker inserted last lands leftmost, so ties run
/// in reverse of the wanted output order: opens before closes, inner open
/// before outer open, outer close before inner close.
fn process_order(a: &Insertion<'_>, b: &Insertion<'_>) -> Ordering {
    b.pos
        .cmp(&a.pos)
        .then_with(|| b.open.cmp(&a.open))
        .then_with(|| {
            if a.open {
                // Tied opens share a start; the shorter span is inner.
                a.span.1.cmp(&b.span.1).then_with(|| a.entity.cmp(&b.entity))
            } else {
                // Tied closes share an end; the earlier start is outer.
                a.span.0.cmp(&b.span.0).then_with(|| b.entity.cmp(&a.entity))
            }
        })
}

/// Insert all four markers around the entity and attribute spans.
///
/// Spans are half-open character ranges into `text` and may sit in either
/// textual order; nested spans come out properly nested. Returns
/// [`Error::OffsetOutOfRange`] when a span is inverted, empty, or runs past
/// the end of the text. No original character is dropped or duplicated; the
/// output is exactly [`MarkerSet::total_len`] bytes longer than `text`.
pub fn insert_pair_markers(
    text: &str,
    entity_span: (usize, usize),
    attribute_span: (usize, usize),
    markers: &MarkerSet,
) -> Result<String> {
    let byte_of = char_byte_offsets(text);
    let char_len = byte_of.len() - 1;

    for (what, span) in [("entity", entity_span), ("attribute", attribute_span)] {
        if span.0 >= span.1 {
            return Err(Error::offset_out_of_range(format!(
                "{what} span {}..{} is empty or inverted",
                span.0, span.1
            )));
        }
        if span.1 > char_len {
            return Err(Error::offset_out_of_range(format!(
                "{what} span {}..{} exceeds text length {char_len}",
                span.0, span.1
            )));
        }
    }

    let mut insertions = [
        Insertion {
            pos: entity_span.0,
            open: true,
            entity: true,
            span: entity_span,
            marker: &markers.entity_open,
        },
        Insertion {
            pos: entity_span.1,
            open: false,
            entity: true,
            span: entity_span,
            marker: &markers.entity_close,
        },
        Insertion {
            pos: attribute_span.0,
            open: true,
            entity: false,
            span: attribute_span,
            marker: &markers.attribute_open,
        },
        Insertion {
            pos: attribute_span.1,
            open: false,
            entity: false,
            span: attribute_span,
            marker: &markers.attribute_close,
        },
    ];
    insertions.sort_by(process_order);

    let mut tagged = String::with_capacity(text.len() + markers.total_len());
    tagged.push_str(text);
    for insertion in &insertions {
        tagged.insert_str(byte_of[insertion.pos], insertion.marker);
    }
    Ok(tagged)
}

/// Byte offset of every character boundary, including the end of the text.
fn char_byte_offsets(text: &str) -> Vec<usize> {
    let mut offsets: Vec<usize> = text.char_indices().map(|(b, _)| b).collect();
    offsets.push(text.len());
    offsets
}
