//! Property-based tests for pipeline invariants.
//!
//! These check that counting, symmetry, and partitioning properties hold for
//! generated inputs, not just the hand-written fixtures.

use proptest::prelude::*;
use relprep::{
    enumerate_pairs, parse_standoff, CandidatePair, CorpusExtractor, Example, ExtractorConfig,
    LabelSchema, RelationIndex, RelationLabel,
};

const ENTITY_LABELS: [&str; 3] = ["Tobacco", "Alcohol", "Drug"];
const ATTRIBUTE_LABELS: [&str; 3] = ["Status", "Amount", "Frequency"];

/// Stand-off content with `entities` entity mentions and `attributes`
/// attribute mentions, all at distinct offsets with distinct texts.
fn synthetic_ann(entities: usize, attributes: usize) -> String {
    let mut ann = String::new();
    for i in 0..entities {
        let label = ENTITY_LABELS[i % ENTITY_LABELS.len()];
        let start = i * 10;
        ann.push_str(&format!("T{}\t{} {} {}\tent{}\n", i + 1, label, start, start + 4, i));
    }
    for j in 0..attributes {
        let label = ATTRIBUTE_LABELS[j % ATTRIBUTE_LABELS.len()];
        let start = 1000 + j * 10;
        ann.push_str(&format!("T{}\t{} {} {}\tatt{}\n", 100 + j, label, start, start + 4, j));
    }
    ann
}

fn synthetic_examples(count: usize) -> Vec<Example> {
    (0..count)
        .map(|i| Example {
            tagged_text: format!("example {i}"),
            label: if i % 2 == 0 {
                RelationLabel::Related
            } else {
                RelationLabel::NotRelated
            },
        })
        .collect()
}

/// Order-independent view of an example list.
fn multiset(examples: &[Example]) -> Vec<(String, &'static str)> {
    let mut items: Vec<_> = examples
        .iter()
        .map(|e| (e.tagged_text.clone(), e.label.as_label()))
        .collect();
    items.sort();
    items
}

proptest! {
    #[test]
    fn pair_count_is_the_product_of_the_mention_counts(
        entities in 0..6usize,
        attributes in 0..6usize,
    ) {
        let (doc, issues) = parse_standoff(&synthetic_ann(entities, attributes));
        prop_assert!(issues.is_empty());

        let pairs = enumerate_pairs(&doc, &LabelSchema::default());
        prop_assert_eq!(pairs.len(), entities * attributes);
    }

    #[test]
    fn repeating_every_line_never_adds_pairs(
        entities in 1..5usize,
        attributes in 1..5usize,
    ) {
        let once = synthetic_ann(entities, attributes);
        // Same mentions again under fresh ids.
        let again = once
            .lines()
            .enumerate()
            .map(|(i, line)| {
                let fields = line.split_once('\t').unwrap().1;
                format!("T{}\t{}\n", 500 + i, fields)
            })
            .collect::<String>();
        let (doc, issues) = parse_standoff(&format!("{once}{again}"));
        prop_assert!(issues.is_empty());

        let pairs = enumerate_pairs(&doc, &LabelSchema::default());
        prop_assert_eq!(pairs.len(), entities * attributes);
    }

    #[test]
    fn resolution_is_symmetric_and_matches_membership(
        member_bits in 0..16u32,
        first in 0..5usize,
        second in 0..5usize,
    ) {
        // T1 always anchors the event; four optional members join per bit.
        let pool = [
            ("Tobacco", "T1", "smoker"),
            ("Status", "T2", "current"),
            ("Amount", "T3", "daily"),
            ("Frequency", "T4", "often"),
            ("Alcohol", "T5", "beer"),
        ];
        let mut ann = String::new();
        for (i, (label, id, text)) in pool.iter().enumerate() {
            let start = i * 10;
            ann.push_str(&format!("{}\t{} {} {}\t{}\n", id, label, start, start + 6, text));
        }
        ann.push_str("E1\tTobacco:T1");
        let mut member_texts = vec!["smoker"];
        for bit in 0..4 {
            if member_bits & (1 << bit) != 0 {
                let (label, id, text) = pool[bit + 1];
                ann.push_str(&format!(" {label}:{id}"));
                member_texts.push(text);
            }
        }
        ann.push('\n');

        let (doc, issues) = parse_standoff(&ann);
        prop_assert!(issues.is_empty());
        let index = RelationIndex::build(&doc, &LabelSchema::default());

        let forward = CandidatePair {
            entity_text: pool[first].2.to_string(),
            attribute_text: pool[second].2.to_string(),
            entity_span: (0, 1),
            attribute_span: (2, 3),
        };
        let swapped = CandidatePair {
            entity_text: pool[second].2.to_string(),
            attribute_text: pool[first].2.to_string(),
            entity_span: (2, 3),
            attribute_span: (0, 1),
        };

        let expected = member_texts.contains(&pool[first].2)
            && member_texts.contains(&pool[second].2);
        prop_assert_eq!(index.label(&forward).is_related(), expected);
        prop_assert_eq!(index.label(&forward), index.label(&swapped));
    }

    #[test]
    fn split_sizes_follow_the_fraction(
        count in 0..200usize,
        seed in any::<u64>(),
        fraction in 0.05f64..0.95,
    ) {
        let config = ExtractorConfig::default()
            .with_train_fraction(fraction)
            .with_shuffle_seed(seed);
        let extractor = CorpusExtractor::with_config(config).unwrap();

        let (train, validation) = extractor.split_train_val(synthetic_examples(count));
        prop_assert_eq!(train.len(), (count as f64 * fraction).floor() as usize);
        prop_assert_eq!(train.len() + validation.len(), count);
    }

    #[test]
    fn split_is_a_permutation_of_its_input(
        count in 0..80usize,
        seed in any::<u64>(),
    ) {
        let examples = synthetic_examples(count);
        let before = multiset(&examples);

        let config = ExtractorConfig::default().with_shuffle_seed(seed);
        let extractor = CorpusExtractor::with_config(config).unwrap();
        let (mut train, validation) = extractor.split_train_val(examples);
        train.extend(validation);

        prop_assert_eq!(multiset(&train), before);
    }

    #[test]
    fn the_same_seed_always_partitions_the_same_way(
        count in 0..80usize,
        seed in any::<u64>(),
    ) {
        let config = ExtractorConfig::default().with_shuffle_seed(seed);
        let a = CorpusExtractor::with_config(config.clone()).unwrap();
        let b = CorpusExtractor::with_config(config).unwrap();

        let (train_a, val_a) = a.split_train_val(synthetic_examples(count));
        let (train_b, val_b) = b.split_train_val(synthetic_examples(count));
        prop_assert_eq!(train_a, train_b);
        prop_assert_eq!(val_a, val_b);
    }
}
