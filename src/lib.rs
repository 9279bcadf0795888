//! # relprep
//!
//! Stand-off annotation to relation-classifier examples.
//!
//! Clinical substance-use corpora annotate entity mentions (Tobacco,
//! Alcohol, Drug) and attribute mentions (Status, Amount, Frequency, ...)
//! as BRAT-style stand-off records over raw note text. relprep turns a
//! folder of those annotations into labeled training examples for a binary
//! relation classifier: does this entity mention relate to this attribute
//! mention?
//!
//! ## Pipeline
//!
//! | Stage | Entry point | Produces |
//! |-------|-------------|----------|
//! | Parse | [`parse_standoff`] | [`DocumentAnnotations`] |
//! | Pair | [`enumerate_pairs`] | set of [`CandidatePair`] |
//! | Resolve | [`RelationIndex::label`] | [`RelationLabel`] |
//! | Tag | [`insert_pair_markers`] | marked-up text |
//! | Extract | [`CorpusExtractor::extract`] | [`Extraction`] |
//!
//! ## Quick Start
//!
//! ```rust
//! use relprep::{
//!     enumerate_pairs, insert_pair_markers, parse_standoff, LabelSchema, MarkerSet,
//!     RelationIndex,
//! };
//!
//! let text = "status: current, smoker here";
//! let (doc, issues) = parse_standoff(
//!     "T1\tTobacco 17 23\tsmoker\n\
//!      T2\tStatus 8 15\tcurrent\n\
//!      E1\tTobacco:T1 Status:T2\n",
//! );
//! assert!(issues.is_empty());
//!
//! let schema = LabelSchema::default();
//! let index = RelationIndex::build(&doc, &schema);
//! for pair in enumerate_pairs(&doc, &schema) {
//!     let label = index.label(&pair);
//!     let tagged =
//!         insert_pair_markers(text, pair.entity_span, pair.attribute_span, &MarkerSet::default())?;
//!     assert!(label.is_related());
//!     assert_eq!(tagged, "status: <a>current</a>, <e>smoker</e> here");
//! }
//! # Ok::<(), relprep::Error>(())
//! ```
//!
//! ## Whole-corpus extraction
//!
//! ```rust,no_run
//! use relprep::{CorpusExtractor, Result};
//!
//! fn main() -> Result<()> {
//!     let extractor = CorpusExtractor::new();
//!     let extraction = extractor.extract("corpus/")?;
//!     println!("{}", extraction.report);
//!     let (train, validation) = extractor.split_train_val(extraction.examples);
//!     println!("{} train / {} validation", train.len(), validation.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! ```toml
//! [dependencies]
//! relprep = "0.1"                                    # sequential extraction
//! relprep = { version = "0.1", features = ["parallel"] } # rayon per-file fan-out
//! ```
//!
//! ## Design Philosophy
//!
//! - **Partial output beats no output**: malformed lines, counterpartless
//!   files, and out-of-range spans are skipped at the smallest possible
//!   scope and surfaced as diagnostics, never as a crashed run.
//! - **Deterministic**: file order, pair order, and the seeded shuffle make
//!   two runs over the same folder byte-identical.
//! - **Text-based resolution**: relation membership matches on surface
//!   text, not span identity. Downstream training sets were built on that
//!   contract; see [`resolve`] before "fixing" it.

#![warn(missing_docs)]

pub mod corpus;
mod error;
pub mod pair;
pub mod record;
pub mod resolve;
pub mod schema;
pub mod tag;

pub mod prelude {
    //! Commonly used items, re-exported for convenience.
    //!
    //! ```rust
    //! use relprep::prelude::*;
    //!
    //! let schema = LabelSchema::default();
    //! assert!(schema.is_entity("Tobacco"));
    //! assert!(schema.is_attribute("QuitHistory"));
    //! assert_eq!(RelationLabel::Related.as_label(), "RELATED");
    //! ```
    pub use crate::corpus::{
        CorpusExtractor, Example, Extraction, ExtractionReport, ExtractorConfig,
    };
    pub use crate::error::{Error, Result};
    pub use crate::pair::{enumerate_pairs, CandidatePair};
    pub use crate::record::{parse_standoff, DocumentAnnotations};
    pub use crate::resolve::{RelationIndex, RelationLabel};
    pub use crate::schema::LabelSchema;
    pub use crate::tag::{insert_pair_markers, MarkerSet};
}

// Re-exports
pub use corpus::{
    CorpusExtractor, Diagnostic, DiagnosticKind, Example, Extraction, ExtractionReport,
    ExtractorConfig,
};
pub use error::{Error, Result};
pub use pair::{enumerate_pairs, CandidatePair};
pub use record::{
    parse_standoff, DocumentAnnotations, EventMember, EventRecord, ParseIssue, SpanRecord,
};
pub use resolve::{RelationIndex, RelationLabel};
pub use schema::LabelSchema;
pub use tag::{insert_pair_markers, MarkerSet};
