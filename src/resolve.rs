//! Relation resolution: `RELATED` vs `NOT_RELATED` per candidate pair.
//!
//! Each event record is reduced to the set of surface texts its members
//! carry. A pair is `RELATED` when some single event's text set contains
//! both the entity text and the attribute text, meaning the annotator
//! asserted the two together in one relation instance.
//!
//! Matching is on literal text, not span identity: two mentions with the
//! same surface form are interchangeable as far as resolution is concerned.
//! That trades precision for recall on repetitive clinical prose and is the
//! contract downstream training data is built on, so it stays text-based
//! here; callers wanting identity matching need a different index.

use crate::pair::CandidatePair;
use crate::record::DocumentAnnotations;
use crate::schema::LabelSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

// =============================================================================
// Labels
// =============================================================================

/// Binary relation label attached to every candidate pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationLabel {
    /// No event attests the pair together.
    NotRelated,
    /// At least one event attests the pair together.
    Related,
}

impl RelationLabel {
    /// Canonical string form, as written to output files.
    #[must_use]
    pub fn as_label(&self) -> &'static str {
        match self {
            RelationLabel::NotRelated => "NOT_RELATED",
            RelationLabel::Related => "RELATED",
        }
    }

    /// Numeric class ID for classifier targets (`NOT_RELATED` = 0).
    #[must_use]
    pub fn class_id(&self) -> u8 {
        match self {
            RelationLabel::NotRelated => 0,
            RelationLabel::Related => 1,
        }
    }

    /// Parse the canonical string form.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "NOT_RELATED" => Some(RelationLabel::NotRelated),
            "RELATED" => Some(RelationLabel::Related),
            _ => None,
        }
    }

    /// True for [`RelationLabel::Related`].
    #[must_use]
    pub fn is_related(&self) -> bool {
        matches!(self, RelationLabel::Related)
    }
}

impl fmt::Display for RelationLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

// =============================================================================
// Index
// =============================================================================

/// Per-document index of attested relation instances.
///
/// Built once per document and queried per pair. Only events anchored by an
/// entity label are indexed; an event anchored by anything else does not
/// express an entity-attribute relation. Members referencing unknown span
/// IDs are dropped with a warning rather than failing the event.
#[derive(Debug, Clone, Default)]
pub struct RelationIndex {
    event_texts: Vec<HashSet<String>>,
}

impl RelationIndex {
    /// Build the index from one document's records.
    #[must_use]
    pub fn build(doc: &DocumentAnnotations, schema: &LabelSchema) -> Self {
        let texts = doc.span_texts();
        let mut event_texts = Vec::new();

        for event in &doc.events {
            let anchored = event.label().is_some_and(|l| schema.is_entity(l));
            if !anchored {
                continue;
            }
            let mut members = HashSet::new();
            for member in &event.members {
                match texts.get(member.ref_id.as_str()) {
                    Some(text) => {
                        members.insert((*text).to_string());
                    }
                    None => log::warn!(
                        "event '{}': member '{}' references an unknown span, skipping member",
                        event.id,
                        member.ref_id
                    ),
                }
            }
            if !members.is_empty() {
                event_texts.push(members);
            }
        }

        RelationIndex { event_texts }
    }

    /// Number of indexed relation instances.
    #[must_use]
    pub fn len(&self) -> usize {
        self.event_texts.len()
    }

    /// True when the document attested no relations at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.event_texts.is_empty()
    }

    /// Decide the label for one candidate pair.
    ///
    /// Pure and order-independent: the answer depends only on the document's
    /// records, never on which pairs were resolved before this one.
    #[must_use]
    pub fn label(&self, pair: &CandidatePair) -> RelationLabel {
        let attested = self.event_texts.iter().any(|members| {
            members.contains(&pair.entity_text) && members.contains(&pair.attribute_text)
        });
        if attested {
            RelationLabel::Related
        } else {
            RelationLabel::NotRelated
        }
    }
}
