//! Candidate pair enumeration.
//!
//! Every entity mention in a document is paired with every attribute mention
//! in the same document. Pairing is deliberately unrestricted: proximity and
//! label compatibility play no part here, because relation resolution decides
//! which combinations are real. The output is a set, so duplicate annotation
//! lines (same text, same offsets) collapse to one candidate.

use crate::record::DocumentAnnotations;
use crate::schema::LabelSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One entity mention crossed with one attribute mention.
///
/// Equality and hashing cover the surface texts and the character spans,
/// nothing else, so the same mention pair written twice in an annotation
/// file is one candidate. Ordering is lexicographic over the same fields,
/// which gives corpus runs a stable pair order independent of hash state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CandidatePair {
    /// Surface text of the entity mention.
    pub entity_text: String,
    /// Surface text of the attribute mention.
    pub attribute_text: String,
    /// Character span of the entity mention, half-open.
    pub entity_span: (usize, usize),
    /// Character span of the attribute mention, half-open.
    pub attribute_span: (usize, usize),
}

/// Cross every entity span with every attribute span.
///
/// Spans whose label matches neither side of the schema contribute nothing.
/// With all-distinct mentions the result has exactly
/// `|entities| * |attributes|` members; duplicates only ever shrink it.
#[must_use]
pub fn enumerate_pairs(doc: &DocumentAnnotations, schema: &LabelSchema) -> HashSet<CandidatePair> {
    let entities: Vec<_> = doc.spans.iter().filter(|s| schema.is_entity(&s.label)).collect();
    let attributes: Vec<_> = doc
        .spans
        .iter()
        .filter(|s| schema.is_attribute(&s.label))
        .collect();

    let mut pairs = HashSet::with_capacity(entities.len() * attributes.len());
    for entity in &entities {
        for attribute in &attributes {
            pairs.insert(CandidatePair {
                entity_text: entity.text.clone(),
                attribute_text: attribute.text.clone(),
                entity_span: (entity.start, entity.end),
                attribute_span: (attribute.start, attribute.end),
            });
        }
    }
    pairs
}
