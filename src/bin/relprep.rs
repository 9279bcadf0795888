//! relprep - Relation example extraction CLI
//!
//! Turns folders of stand-off substance-use annotations into labeled
//! train/validation files for a binary relation classifier.
//!
//! # Usage
//!
//! ```bash
//! # Extract a corpus into train.jsonl / validation.jsonl
//! relprep extract ./corpus
//!
//! # Same, with a custom split and seed
//! relprep extract ./corpus --train-fraction 0.9 --seed 7
//!
//! # Summarize a corpus without writing anything
//! relprep stats ./corpus
//!
//! # Show how one document parses, pairs, and resolves
//! relprep inspect ./corpus/note_042.ann
//! ```

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use is_terminal::IsTerminal;

use relprep::{
    enumerate_pairs, parse_standoff, CandidatePair, CorpusExtractor, Example, ExtractorConfig,
    LabelSchema, MarkerSet, RelationIndex, RelationLabel,
};

// ============================================================================
// CLI Structure
// ============================================================================

/// Relation example extraction for stand-off annotated corpora
#[derive(Parser)]
#[command(name = "relprep")]
#[command(
    author,
    version,
    about = "Extract relation-classifier examples from stand-off annotations",
    long_about = r#"
relprep - stand-off annotation to relation-classifier examples

A corpus folder holds sibling files X.ann / X.txt. Every entity mention is
paired with every attribute mention per document, labeled RELATED when some
event record attests the two together, and emitted as the document text with
<e>...</e> and <a>...</a> markers around the pair.

EXAMPLES:
  relprep extract ./corpus
  relprep extract ./corpus --entity-label Medication --attribute-label Dosage
  relprep stats ./corpus
  relprep inspect ./corpus/note_042.ann
"#
)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Corpus folder (shorthand for `relprep extract DIR`)
    #[arg(value_name = "DIR")]
    dir: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract examples and write the train/validation split
    #[command(visible_alias = "x")]
    Extract(ExtractArgs),

    /// Summarize a corpus without writing example files
    #[command(visible_alias = "s")]
    Stats(StatsArgs),

    /// Show how one annotation file parses, pairs, and resolves
    #[command(visible_alias = "i")]
    Inspect(InspectArgs),

    /// Show version and build features
    Info,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Example file format selection
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum ExampleFormat {
    /// JSON lines, one {"tagged_text", "label"} object per line (default)
    #[default]
    Jsonl,
    /// Tab-separated label and text, tabs and line breaks in text escaped
    Tsv,
}

#[derive(Parser)]
struct ExtractArgs {
    /// Corpus folder containing X.ann / X.txt sibling files
    #[arg(value_name = "DIR")]
    dir: String,

    /// Output path for the training partition
    #[arg(long, value_name = "PATH", default_value = "train.jsonl")]
    train: String,

    /// Output path for the validation partition
    #[arg(long, value_name = "PATH", default_value = "validation.jsonl")]
    validation: String,

    /// Example file format
    #[arg(long, default_value = "jsonl")]
    format: ExampleFormat,

    /// Fraction of examples that go to training
    #[arg(long, default_value = "0.8", value_name = "FLOAT")]
    train_fraction: f64,

    /// Shuffle seed; same seed, same partitions
    #[arg(long, default_value = "42", value_name = "SEED")]
    seed: u64,

    /// Treat LABEL as an entity (repeatable; default: Alcohol, Drug, Tobacco)
    #[arg(long = "entity-label", value_name = "LABEL")]
    entity_labels: Vec<String>,

    /// Treat LABEL as an attribute (repeatable; default: the substance-use set)
    #[arg(long = "attribute-label", value_name = "LABEL")]
    attribute_labels: Vec<String>,

    /// Opening marker for the entity span
    #[arg(long, default_value = "<e>", value_name = "TOKEN")]
    entity_open: String,

    /// Closing marker for the entity span
    #[arg(long, default_value = "</e>", value_name = "TOKEN")]
    entity_close: String,

    /// Opening marker for the attribute span
    #[arg(long, default_value = "<a>", value_name = "TOKEN")]
    attribute_open: String,

    /// Closing marker for the attribute span
    #[arg(long, default_value = "</a>", value_name = "TOKEN")]
    attribute_close: String,

    /// Suppress the report and diagnostics on stderr
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Parser)]
struct StatsArgs {
    /// Corpus folder containing X.ann / X.txt sibling files
    #[arg(value_name = "DIR")]
    dir: String,

    /// Print the report as JSON instead of text
    #[arg(long)]
    json: bool,

    /// Treat LABEL as an entity (repeatable; default: Alcohol, Drug, Tobacco)
    #[arg(long = "entity-label", value_name = "LABEL")]
    entity_labels: Vec<String>,

    /// Treat LABEL as an attribute (repeatable; default: the substance-use set)
    #[arg(long = "attribute-label", value_name = "LABEL")]
    attribute_labels: Vec<String>,
}

#[derive(Parser)]
struct InspectArgs {
    /// Annotation file to inspect (its .txt sibling must exist)
    #[arg(value_name = "FILE")]
    file: String,

    /// Print records and labeled pairs as JSON instead of text
    #[arg(long)]
    json: bool,

    /// Treat LABEL as an entity (repeatable; default: Alcohol, Drug, Tobacco)
    #[arg(long = "entity-label", value_name = "LABEL")]
    entity_labels: Vec<String>,

    /// Treat LABEL as an attribute (repeatable; default: the substance-use set)
    #[arg(long = "attribute-label", value_name = "LABEL")]
    attribute_labels: Vec<String>,
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let result: Result<(), String> = match cli.command {
        Some(Commands::Extract(args)) => cmd_extract(args),
        Some(Commands::Stats(args)) => cmd_stats(args),
        Some(Commands::Inspect(args)) => cmd_inspect(args),
        Some(Commands::Info) => cmd_info(),
        Some(Commands::Completions { shell }) => {
            generate(shell, &mut Cli::command(), "relprep", &mut io::stdout());
            Ok(())
        }
        None => {
            // No subcommand: treat a positional folder as `extract DIR`
            let Some(dir) = cli.dir else {
                eprintln!("No corpus folder provided. Run `relprep --help` for usage.");
                return ExitCode::FAILURE;
            };
            cmd_extract(ExtractArgs {
                dir,
                train: "train.jsonl".to_string(),
                validation: "validation.jsonl".to_string(),
                format: ExampleFormat::default(),
                train_fraction: 0.8,
                seed: 42,
                entity_labels: vec![],
                attribute_labels: vec![],
                entity_open: "<e>".to_string(),
                entity_close: "</e>".to_string(),
                attribute_open: "<a>".to_string(),
                attribute_close: "</a>".to_string(),
                quiet: false,
            })
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", color("31", "error:"), e);
            ExitCode::FAILURE
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// ANSI-color `text` when stdout is a terminal.
fn color(code: &str, text: &str) -> String {
    if io::stdout().is_terminal() {
        format!("\x1b[{}m{}\x1b[0m", code, text)
    } else {
        text.to_string()
    }
}

/// Default schema with either side overridden by CLI flags.
fn build_schema(entity_labels: &[String], attribute_labels: &[String]) -> LabelSchema {
    let mut schema = LabelSchema::default();
    if !entity_labels.is_empty() {
        schema.entity_labels = entity_labels.to_vec();
    }
    if !attribute_labels.is_empty() {
        schema.attribute_labels = attribute_labels.to_vec();
    }
    schema
}

/// Escape backslash, tab, newline, and carriage return so one example
/// stays one TSV row.
fn escape_tsv_field(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('\t', "\\t")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
}

/// Serialize one partition to its output file.
fn write_examples(path: &str, examples: &[Example], format: ExampleFormat) -> Result<(), String> {
    let mut out = String::new();
    match format {
        ExampleFormat::Jsonl => {
            for example in examples {
                let line = serde_json::to_string(example)
                    .map_err(|e| format!("Failed to serialize example: {}", e))?;
                out.push_str(&line);
                out.push('\n');
            }
        }
        ExampleFormat::Tsv => {
            out.push_str("label\ttagged_text\n");
            for example in examples {
                out.push_str(example.label.as_label());
                out.push('\t');
                out.push_str(&escape_tsv_field(&example.tagged_text));
                out.push('\n');
            }
        }
    }
    fs::write(path, out).map_err(|e| format!("Failed to write {}: {}", path, e))
}

// ============================================================================
// Commands
// ============================================================================

fn cmd_extract(args: ExtractArgs) -> Result<(), String> {
    let config = ExtractorConfig::default()
        .with_schema(build_schema(&args.entity_labels, &args.attribute_labels))
        .with_markers(MarkerSet::new(
            args.entity_open,
            args.entity_close,
            args.attribute_open,
            args.attribute_close,
        ))
        .with_train_fraction(args.train_fraction)
        .with_shuffle_seed(args.seed);
    let extractor = CorpusExtractor::with_config(config).map_err(|e| e.to_string())?;

    let extraction = extractor.extract(&args.dir).map_err(|e| e.to_string())?;
    if !args.quiet {
        eprintln!("{}", extraction.report);
        for diagnostic in &extraction.report.diagnostics {
            eprintln!("  {} {}", color("33", "warning:"), diagnostic);
        }
    }

    let (train, validation) = extractor.split_train_val(extraction.examples);
    write_examples(&args.train, &train, args.format)?;
    write_examples(&args.validation, &validation, args.format)?;

    if !args.quiet {
        eprintln!(
            "{} wrote {} train example(s) to {} and {} validation example(s) to {}",
            color("32", "ok:"),
            train.len(),
            args.train,
            validation.len(),
            args.validation
        );
    }
    Ok(())
}

fn cmd_stats(args: StatsArgs) -> Result<(), String> {
    let config =
        ExtractorConfig::default().with_schema(build_schema(&args.entity_labels, &args.attribute_labels));
    let extractor = CorpusExtractor::with_config(config).map_err(|e| e.to_string())?;
    let extraction = extractor.extract(&args.dir).map_err(|e| e.to_string())?;

    if args.json {
        let json = serde_json::to_string_pretty(&extraction.report)
            .map_err(|e| format!("Failed to serialize report: {}", e))?;
        println!("{}", json);
        return Ok(());
    }

    println!("{}", extraction.report);
    for diagnostic in &extraction.report.diagnostics {
        println!("  {} {}", color("33", "warning:"), diagnostic);
    }
    Ok(())
}

fn cmd_inspect(args: InspectArgs) -> Result<(), String> {
    let ann_path = PathBuf::from(&args.file);
    let txt_path = ann_path.with_extension("txt");
    if !txt_path.exists() {
        return Err(format!(
            "{} has no matching text file at {}",
            ann_path.display(),
            txt_path.display()
        ));
    }

    let ann_content = fs::read_to_string(&ann_path)
        .map_err(|e| format!("Failed to read {}: {}", ann_path.display(), e))?;
    let text = fs::read_to_string(&txt_path)
        .map_err(|e| format!("Failed to read {}: {}", txt_path.display(), e))?;

    let schema = build_schema(&args.entity_labels, &args.attribute_labels);
    let (doc, issues) = parse_standoff(&ann_content);
    let index = RelationIndex::build(&doc, &schema);
    let mut pairs: Vec<CandidatePair> = enumerate_pairs(&doc, &schema).into_iter().collect();
    pairs.sort();
    let labeled: Vec<(CandidatePair, RelationLabel)> = pairs
        .into_iter()
        .map(|pair| {
            let label = index.label(&pair);
            (pair, label)
        })
        .collect();

    if args.json {
        let json = serde_json::to_string_pretty(&serde_json::json!({
            "file": ann_path,
            "text_chars": text.chars().count(),
            "spans": doc.spans,
            "events": doc.events,
            "issues": issues,
            "pairs": labeled
                .iter()
                .map(|(pair, label)| serde_json::json!({
                    "entity_text": pair.entity_text,
                    "attribute_text": pair.attribute_text,
                    "entity_span": pair.entity_span,
                    "attribute_span": pair.attribute_span,
                    "label": label,
                }))
                .collect::<Vec<_>>(),
        }))
        .map_err(|e| format!("Failed to serialize inspection: {}", e))?;
        println!("{}", json);
        return Ok(());
    }

    println!(
        "{}: {} span(s), {} event(s), {} candidate pair(s)",
        ann_path.display(),
        doc.spans.len(),
        doc.events.len(),
        labeled.len()
    );
    for issue in &issues {
        println!(
            "  {} line {}: {}",
            color("33", "warning:"),
            issue.line,
            issue.message
        );
    }
    if labeled.is_empty() {
        println!("  (no candidate pairs)");
        return Ok(());
    }
    println!();
    let mut stdout = io::stdout().lock();
    for (pair, label) in &labeled {
        let painted = match label {
            RelationLabel::Related => color("32", label.as_label()),
            RelationLabel::NotRelated => color("33", label.as_label()),
        };
        writeln!(
            stdout,
            "  {:<22} {} ({}..{}) ~ {} ({}..{})",
            painted,
            pair.entity_text,
            pair.entity_span.0,
            pair.entity_span.1,
            pair.attribute_text,
            pair.attribute_span.0,
            pair.attribute_span.1
        )
        .map_err(|e| format!("Failed to write output: {}", e))?;
    }
    Ok(())
}

fn cmd_info() -> Result<(), String> {
    println!("relprep {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Features:");
    println!(
        "  parallel: {}",
        if cfg!(feature = "parallel") {
            color("32", "enabled")
        } else {
            "disabled (build with --features parallel)".to_string()
        }
    );
    println!();
    println!("Default schema:");
    let schema = LabelSchema::default();
    println!("  entities:   {}", schema.entity_labels.join(", "));
    println!("  attributes: {}", schema.attribute_labels.join(", "));
    Ok(())
}
