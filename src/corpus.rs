//! Corpus extraction: from a folder of annotation files to labeled examples.
//!
//! A corpus folder holds sibling files `X.ann` / `X.txt`. For every such
//! pair the extractor parses the stand-off records, enumerates candidate
//! pairs, resolves each against the document's events, and tags the document
//! text, yielding one [`Example`] per candidate pair. Failures never abort
//! the run: everything that goes wrong is scoped to its line, span, or file
//! and collected as a [`Diagnostic`] in the final report.
//!
//! Output order is deterministic. Files process in name order and each
//! document's pairs in sorted order, so two runs over the same folder
//! produce identical example lists, and with a fixed shuffle seed identical
//! train/validation partitions.
//!
//! Documents are independent, so the per-file loop fans out across a rayon
//! pool when the `parallel` feature is on; merging keeps file order either
//! way.

use crate::error::{Error, Result};
use crate::pair::{enumerate_pairs, CandidatePair};
use crate::record::parse_standoff;
use crate::resolve::{RelationIndex, RelationLabel};
use crate::schema::LabelSchema;
use crate::tag::{insert_pair_markers, MarkerSet};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

// =============================================================================
// Configuration
// =============================================================================

/// Tunable knobs for a corpus extraction run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Which labels are entities and which are attributes.
    pub schema: LabelSchema,
    /// Boundary markers spliced into tagged text.
    pub markers: MarkerSet,
    /// Fraction of examples that go to the training partition, in (0, 1).
    pub train_fraction: f64,
    /// Seed for the pre-split shuffle. Fixed seed, fixed partitions.
    pub shuffle_seed: u64,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        ExtractorConfig {
            schema: LabelSchema::default(),
            markers: MarkerSet::default(),
            train_fraction: 0.8,
            shuffle_seed: 42,
        }
    }
}

impl ExtractorConfig {
    /// Replace the label schema.
    #[must_use]
    pub fn with_schema(mut self, schema: LabelSchema) -> Self {
        self.schema = schema;
        self
    }

    /// Replace the marker set.
    #[must_use]
    pub fn with_markers(mut self, markers: MarkerSet) -> Self {
        self.markers = markers;
        self
    }

    /// Set the training fraction.
    #[must_use]
    pub fn with_train_fraction(mut self, fraction: f64) -> Self {
        self.train_fraction = fraction;
        self
    }

    /// Set the shuffle seed.
    #[must_use]
    pub fn with_shuffle_seed(mut self, seed: u64) -> Self {
        self.shuffle_seed = seed;
        self
    }

    /// Check the whole configuration before any file is touched.
    pub fn validate(&self) -> Result<()> {
        self.schema.validate()?;
        self.markers.validate()?;
        if !(self.train_fraction > 0.0 && self.train_fraction < 1.0) {
            return Err(Error::invalid_config(format!(
                "train_fraction must be in (0, 1), got {}",
                self.train_fraction
            )));
        }
        Ok(())
    }
}

// =============================================================================
// Output types
// =============================================================================

/// One labeled training or evaluation unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Example {
    /// Document text with the four pair markers inserted.
    pub tagged_text: String,
    /// Resolved relation label.
    pub label: RelationLabel,
}

/// What kind of failure a [`Diagnostic`] records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// A record line that could not be parsed. Scope: one line.
    Parse,
    /// An `.ann` file without its `.txt` sibling, or the reverse. Scope: one file.
    MissingCounterpart,
    /// A span running past the end of its document. Scope: one span.
    OffsetOutOfRange,
    /// A file that could not be read. Scope: one file.
    Io,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DiagnosticKind::Parse => "parse error",
            DiagnosticKind::MissingCounterpart => "missing counterpart",
            DiagnosticKind::OffsetOutOfRange => "offset out of range",
            DiagnosticKind::Io => "io error",
        };
        f.write_str(name)
    }
}

/// One recorded failure, scoped to the smallest unit that could be skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// File the failure belongs to.
    pub file: PathBuf,
    /// Failure category.
    pub kind: DiagnosticKind,
    /// Human-readable detail.
    pub detail: String,
}

impl Diagnostic {
    fn new(file: &Path, kind: DiagnosticKind, detail: impl Into<String>) -> Self {
        Diagnostic {
            file: file.to_path_buf(),
            kind,
            detail: detail.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.kind, self.file.display(), self.detail)
    }
}

/// Summary of one extraction run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionReport {
    /// Files that contributed examples (even zero of them).
    pub files_processed: usize,
    /// Files skipped whole, counterpartless or unreadable.
    pub files_skipped: usize,
    /// Examples labeled `RELATED`.
    pub related: usize,
    /// Examples labeled `NOT_RELATED`.
    pub not_related: usize,
    /// Every failure recorded along the way.
    pub diagnostics: Vec<Diagnostic>,
}

impl ExtractionReport {
    /// Total example count.
    #[must_use]
    pub fn examples(&self) -> usize {
        self.related + self.not_related
    }
}

impl fmt::Display for ExtractionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Extraction report")?;
        writeln!(f, "  Files processed: {}", self.files_processed)?;
        writeln!(f, "  Files skipped:   {}", self.files_skipped)?;
        writeln!(
            f,
            "  Examples:        {} ({} related, {} not related)",
            self.examples(),
            self.related,
            self.not_related
        )?;
        write!(f, "  Diagnostics:     {}", self.diagnostics.len())
    }
}

/// Everything an extraction run produces.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extraction {
    /// All examples across the corpus, in file-then-pair order.
    pub examples: Vec<Example>,
    /// Run summary and collected diagnostics.
    pub report: ExtractionReport,
}

// =============================================================================
// Extractor
// =============================================================================

/// One sibling pair of corpus files, or a lone `.ann` file.
struct DocumentTask {
    ann: PathBuf,
    txt: Option<PathBuf>,
}

/// Per-document result, merged in file order.
#[derive(Default)]
struct DocumentOutcome {
    examples: Vec<Example>,
    diagnostics: Vec<Diagnostic>,
    skipped: bool,
}

/// Walks a corpus folder and turns annotations into labeled examples.
#[derive(Debug, Clone, Default)]
pub struct CorpusExtractor {
    config: ExtractorConfig,
}

impl CorpusExtractor {
    /// Extractor with the default substance-use configuration.
    #[must_use]
    pub fn new() -> Self {
        CorpusExtractor::default()
    }

    /// Extractor with a custom configuration, validated up front.
    pub fn with_config(config: ExtractorConfig) -> Result<Self> {
        config.validate()?;
        Ok(CorpusExtractor { config })
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Extract every example the folder yields.
    ///
    /// Returns an error only when the folder itself cannot be listed; all
    /// per-file and per-line failures land in the report instead.
    pub fn extract(&self, dir: impl AsRef<Path>) -> Result<Extraction> {
        let dir = dir.as_ref();
        log::info!("extracting examples from {}", dir.display());

        let (ann_files, txt_files) = scan_corpus_dir(dir)?;
        let tasks: Vec<DocumentTask> = ann_files
            .iter()
            .map(|(stem, ann)| DocumentTask {
                ann: ann.clone(),
                txt: txt_files.get(stem).cloned(),
            })
            .collect();
        log::info!("found {} annotation file(s)", tasks.len());

        #[cfg(feature = "parallel")]
        let outcomes: Vec<DocumentOutcome> =
            tasks.par_iter().map(|t| self.extract_document(t)).collect();
        #[cfg(not(feature = "parallel"))]
        let outcomes: Vec<DocumentOutcome> =
            tasks.iter().map(|t| self.extract_document(t)).collect();

        let mut extraction = Extraction::default();
        for outcome in outcomes {
            if outcome.skipped {
                extraction.report.files_skipped += 1;
            } else {
                extraction.report.files_processed += 1;
            }
            for example in &outcome.examples {
                match example.label {
                    RelationLabel::Related => extraction.report.related += 1,
                    RelationLabel::NotRelated => extraction.report.not_related += 1,
                }
            }
            extraction.report.diagnostics.extend(outcome.diagnostics);
            extraction.examples.extend(outcome.examples);
        }

        // Text files with no annotation sibling are skipped files too.
        for (stem, txt) in &txt_files {
            if !ann_files.contains_key(stem) {
                log::warn!("{}: no matching .ann file, skipping", txt.display());
                extraction.report.files_skipped += 1;
                extraction.report.diagnostics.push(Diagnostic::new(
                    txt,
                    DiagnosticKind::MissingCounterpart,
                    "no matching .ann file",
                ));
            }
        }

        log::info!(
            "extracted {} example(s) from {} file(s), {} skipped, {} diagnostic(s)",
            extraction.examples.len(),
            extraction.report.files_processed,
            extraction.report.files_skipped,
            extraction.report.diagnostics.len()
        );
        Ok(extraction)
    }

    /// Run the full pipeline over one document.
    fn extract_document(&self, task: &DocumentTask) -> DocumentOutcome {
        let mut outcome = DocumentOutcome::default();
        let ann = task.ann.as_path();

        let Some(txt) = task.txt.as_deref() else {
            log::warn!("{}: no matching .txt file, skipping", ann.display());
            outcome.diagnostics.push(Diagnostic::new(
                ann,
                DiagnosticKind::MissingCounterpart,
                "no matching .txt file",
            ));
            outcome.skipped = true;
            return outcome;
        };

        let ann_content = match fs::read_to_string(ann) {
            Ok(content) => content,
            Err(e) => {
                outcome
                    .diagnostics
                    .push(Diagnostic::new(ann, DiagnosticKind::Io, e.to_string()));
                outcome.skipped = true;
                return outcome;
            }
        };
        let text = match fs::read_to_string(txt) {
            Ok(content) => content,
            Err(e) => {
                outcome
                    .diagnostics
                    .push(Diagnostic::new(txt, DiagnosticKind::Io, e.to_string()));
                outcome.skipped = true;
                return outcome;
            }
        };

        let (mut doc, issues) = parse_standoff(&ann_content);
        for issue in issues {
            log::warn!("{}: line {}: {}", ann.display(), issue.line, issue.message);
            outcome.diagnostics.push(Diagnostic::new(
                ann,
                DiagnosticKind::Parse,
                format!("line {}: {}", issue.line, issue.message),
            ));
        }

        // The index sees every span, including ones dropped below; event
        // membership is about text, not about taggability.
        let index = RelationIndex::build(&doc, &self.config.schema);

        let char_len = text.chars().count();
        doc.spans.retain(|span| {
            if span.end <= char_len {
                return true;
            }
            log::warn!(
                "{}: span {} ({}..{}) exceeds text length {}, dropping",
                ann.display(),
                span.id,
                span.start,
                span.end,
                char_len
            );
            outcome.diagnostics.push(Diagnostic::new(
                ann,
                DiagnosticKind::OffsetOutOfRange,
                format!(
                    "span {} ({}..{}) exceeds text length {}",
                    span.id, span.start, span.end, char_len
                ),
            ));
            false
        });

        // Sorted materialization keeps output order independent of hash
        // state from run to run.
        let mut pairs: Vec<CandidatePair> =
            enumerate_pairs(&doc, &self.config.schema).into_iter().collect();
        pairs.sort();
        log::debug!(
            "{}: {} span(s), {} event(s), {} candidate pair(s)",
            ann.display(),
            doc.spans.len(),
            doc.events.len(),
            pairs.len()
        );

        for pair in &pairs {
            let label = index.label(pair);
            match insert_pair_markers(&text, pair.entity_span, pair.attribute_span, &self.config.markers)
            {
                Ok(tagged_text) => outcome.examples.push(Example { tagged_text, label }),
                Err(e) => outcome.diagnostics.push(Diagnostic::new(
                    ann,
                    DiagnosticKind::OffsetOutOfRange,
                    e.to_string(),
                )),
            }
        }

        outcome
    }

    /// Shuffle and partition examples into training and validation sets.
    ///
    /// The shuffle is seeded from the configuration, so the partition is a
    /// pure function of input order and seed. The boundary is
    /// `floor(len * train_fraction)`; the training set comes first. No label
    /// stratification is attempted, so partition balance drifts with small
    /// corpora.
    #[must_use]
    pub fn split_train_val(&self, mut examples: Vec<Example>) -> (Vec<Example>, Vec<Example>) {
        let mut rng = StdRng::seed_from_u64(self.config.shuffle_seed);
        examples.shuffle(&mut rng);
        let boundary = (examples.len() as f64 * self.config.train_fraction).floor() as usize;
        let validation = examples.split_off(boundary);
        (examples, validation)
    }
}

/// Collect `.ann` and `.txt` files by stem, name-sorted.
fn scan_corpus_dir(
    dir: &Path,
) -> Result<(BTreeMap<OsString, PathBuf>, BTreeMap<OsString, PathBuf>)> {
    let mut ann_files = BTreeMap::new();
    let mut txt_files = BTreeMap::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let Some(stem) = path.file_stem() else {
            continue;
        };
        match path.extension().and_then(|e| e.to_str()) {
            Some("ann") => {
                ann_files.insert(stem.to_os_string(), path);
            }
            Some("txt") => {
                txt_files.insert(stem.to_os_string(), path);
            }
            _ => {}
        }
    }
    Ok((ann_files, txt_files))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_doc(dir: &Path, stem: &str, ann: &str, txt: &str) {
        fs::write(dir.join(format!("{stem}.ann")), ann).unwrap();
        fs::write(dir.join(format!("{stem}.txt")), txt).unwrap();
    }

    //            0123456789012345678901234567
    const TEXT: &str = "status: current, smoker here";
    const ANN: &str = "T1\tTobacco 17 23\tsmoker\n\
                       T2\tStatus 8 15\tcurrent\n\
                       E1\tTobacco:T1 Status:T2\n";

    #[test]
    fn test_extracts_one_related_example() {
        let dir = TempDir::new().unwrap();
        write_doc(dir.path(), "note1", ANN, TEXT);

        let extraction = CorpusExtractor::new().extract(dir.path()).unwrap();
        assert_eq!(extraction.report.files_processed, 1);
        assert_eq!(extraction.report.files_skipped, 0);
        assert!(extraction.report.diagnostics.is_empty());
        assert_eq!(extraction.examples.len(), 1);

        let example = &extraction.examples[0];
        assert_eq!(example.label, RelationLabel::Related);
        assert_eq!(
            example.tagged_text,
            "status: <a>current</a>, <e>smoker</e> here"
        );
    }

    #[test]
    fn test_without_the_event_the_pair_is_not_related() {
        let dir = TempDir::new().unwrap();
        let ann_without_event = "T1\tTobacco 17 23\tsmoker\nT2\tStatus 8 15\tcurrent\n";
        write_doc(dir.path(), "note1", ann_without_event, TEXT);

        let extraction = CorpusExtractor::new().extract(dir.path()).unwrap();
        assert_eq!(extraction.examples.len(), 1);
        assert_eq!(extraction.examples[0].label, RelationLabel::NotRelated);
    }

    #[test]
    fn test_missing_txt_skips_the_file_not_the_corpus() {
        let dir = TempDir::new().unwrap();
        write_doc(dir.path(), "good", ANN, TEXT);
        fs::write(dir.path().join("lonely.ann"), ANN).unwrap();

        let extraction = CorpusExtractor::new().extract(dir.path()).unwrap();
        assert_eq!(extraction.report.files_processed, 1);
        assert_eq!(extraction.report.files_skipped, 1);
        assert_eq!(extraction.examples.len(), 1);
        let diag = &extraction.report.diagnostics[0];
        assert_eq!(diag.kind, DiagnosticKind::MissingCounterpart);
        assert!(diag.file.ends_with("lonely.ann"));
    }

    #[test]
    fn test_orphan_txt_is_reported_too() {
        let dir = TempDir::new().unwrap();
        write_doc(dir.path(), "good", ANN, TEXT);
        fs::write(dir.path().join("orphan.txt"), TEXT).unwrap();

        let extraction = CorpusExtractor::new().extract(dir.path()).unwrap();
        assert_eq!(extraction.report.files_skipped, 1);
        assert!(extraction
            .report
            .diagnostics
            .iter()
            .any(|d| d.kind == DiagnosticKind::MissingCounterpart
                && d.file.ends_with("orphan.txt")));
    }

    #[test]
    fn test_out_of_range_span_is_dropped_with_a_diagnostic() {
        let dir = TempDir::new().unwrap();
        let ann = "T1\tTobacco 17 23\tsmoker\n\
                   T2\tStatus 8 15\tcurrent\n\
                   T3\tAmount 40 55\ttwo packs a day\n";
        write_doc(dir.path(), "note1", ann, TEXT);

        let extraction = CorpusExtractor::new().extract(dir.path()).unwrap();
        // T3 is gone, so only the smoker/current pair remains.
        assert_eq!(extraction.examples.len(), 1);
        assert_eq!(extraction.report.files_processed, 1);
        let diag = &extraction.report.diagnostics[0];
        assert_eq!(diag.kind, DiagnosticKind::OffsetOutOfRange);
        assert!(diag.detail.contains("T3"));
    }

    #[test]
    fn test_malformed_lines_are_reported_and_the_rest_extracts() {
        let dir = TempDir::new().unwrap();
        let ann = "T1\tTobacco 17 23\tsmoker\n\
                   T9\tStatus eight 15\tcurrent\n\
                   T2\tStatus 8 15\tcurrent\n\
                   E1\tTobacco:T1 Status:T2\n";
        write_doc(dir.path(), "note1", ann, TEXT);

        let extraction = CorpusExtractor::new().extract(dir.path()).unwrap();
        assert_eq!(extraction.examples.len(), 1);
        assert_eq!(extraction.examples[0].label, RelationLabel::Related);
        let diag = &extraction.report.diagnostics[0];
        assert_eq!(diag.kind, DiagnosticKind::Parse);
        assert!(diag.detail.starts_with("line 2:"));
    }

    #[test]
    fn test_files_process_in_name_order() {
        let dir = TempDir::new().unwrap();
        write_doc(
            dir.path(),
            "b_note",
            "T1\tTobacco 0 6\tsecond\nT2\tStatus 7 11\tlate\n",
            "second late",
        );
        write_doc(
            dir.path(),
            "a_note",
            "T1\tTobacco 0 5\tfirst\nT2\tStatus 6 11\tearly\n",
            "first early",
        );

        let extraction = CorpusExtractor::new().extract(dir.path()).unwrap();
        assert_eq!(extraction.examples.len(), 2);
        assert!(extraction.examples[0].tagged_text.contains("first"));
        assert!(extraction.examples[1].tagged_text.contains("second"));
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let dir = TempDir::new().unwrap();
        write_doc(dir.path(), "note1", ANN, TEXT);
        write_doc(
            dir.path(),
            "note2",
            "T1\tAlcohol 0 6\tdrinks\nT2\tFrequency 7 12\tdaily\nE1\tAlcohol:T1 Frequency:T2\n",
            "drinks daily",
        );

        let extractor = CorpusExtractor::new();
        let first = extractor.extract(dir.path()).unwrap();
        let second = extractor.extract(dir.path()).unwrap();
        assert_eq!(first, second);

        let (train_a, val_a) = extractor.split_train_val(first.examples.clone());
        let (train_b, val_b) = extractor.split_train_val(second.examples);
        assert_eq!(train_a, train_b);
        assert_eq!(val_a, val_b);
    }

    #[test]
    fn test_split_respects_the_fraction_and_is_seeded() {
        let examples: Vec<Example> = (0..10)
            .map(|i| Example {
                tagged_text: format!("example {i}"),
                label: RelationLabel::NotRelated,
            })
            .collect();

        let extractor = CorpusExtractor::new();
        let (train, val) = extractor.split_train_val(examples.clone());
        assert_eq!(train.len(), 8);
        assert_eq!(val.len(), 2);

        // Same seed, same partition.
        let (train_again, val_again) = extractor.split_train_val(examples.clone());
        assert_eq!(train, train_again);
        assert_eq!(val, val_again);

        // A different seed moves examples across the boundary.
        let reseeded = CorpusExtractor::with_config(
            ExtractorConfig::default().with_shuffle_seed(7),
        )
        .unwrap();
        let (train_other, _) = reseeded.split_train_val(examples);
        assert_ne!(train, train_other);
    }

    #[test]
    fn test_split_boundary_rounds_down() {
        let examples: Vec<Example> = (0..7)
            .map(|i| Example {
                tagged_text: format!("example {i}"),
                label: RelationLabel::Related,
            })
            .collect();
        let (train, val) = CorpusExtractor::new().split_train_val(examples);
        // floor(7 * 0.8) = 5
        assert_eq!(train.len(), 5);
        assert_eq!(val.len(), 2);
    }

    #[test]
    fn test_empty_folder_yields_an_empty_extraction() {
        let dir = TempDir::new().unwrap();
        let extraction = CorpusExtractor::new().extract(dir.path()).unwrap();
        assert!(extraction.examples.is_empty());
        assert_eq!(extraction.report.files_processed, 0);
        assert!(extraction.report.diagnostics.is_empty());
    }

    #[test]
    fn test_missing_folder_is_an_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            CorpusExtractor::new().extract(&missing),
            Err(Error::Io(_))
        ));
    }

    #[test]
    fn test_invalid_config_is_rejected_up_front() {
        let config = ExtractorConfig::default().with_train_fraction(1.0);
        assert!(matches!(
            CorpusExtractor::with_config(config),
            Err(Error::InvalidConfig(_))
        ));

        let config = ExtractorConfig::default()
            .with_schema(LabelSchema::new(["Tobacco"], Vec::<String>::new()));
        assert!(CorpusExtractor::with_config(config).is_err());
    }

    #[test]
    fn test_report_display_summarizes_counts() {
        let report = ExtractionReport {
            files_processed: 3,
            files_skipped: 1,
            related: 4,
            not_related: 6,
            diagnostics: vec![Diagnostic::new(
                Path::new("x.ann"),
                DiagnosticKind::Parse,
                "line 2: bad",
            )],
        };
        let rendered = report.to_string();
        assert!(rendered.contains("Files processed: 3"));
        assert!(rendered.contains("10 (4 related, 6 not related)"));
        assert!(rendered.contains("Diagnostics:     1"));
    }
}
