//! Property tests for the substitution, wrapping and patch-validation engines.

use proptest::prelude::*;
use std::collections::BTreeMap;
use text_replacer::hex;
use text_replacer::patch::{validate_rows, PatchRow};
use text_replacer::progress::NullReporter;
use text_replacer::substitute::{Substitution, SubstitutionOptions};
use text_replacer::wrap::{wrap_text, WrapConfig};
use text_replacer::TranslationMap;

/// Scan left to right, trying longer keys first at each position.
fn reference_substitute(content: &str, map: &BTreeMap<String, String>) -> String {
    let mut keys: Vec<&String> = map.keys().filter(|k| !k.is_empty()).collect();
    keys.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

    let mut out = String::new();
    let mut i = 0;
    while i < content.len() {
        match keys.iter().find(|k| content[i..].starts_with(k.as_str())) {
            Some(key) => {
                out.push_str(&map[key.as_str()]);
                i += key.len();
            }
            None => {
                let c = content[i..].chars().next().unwrap();
                out.push(c);
                i += c.len_utf8();
            }
        }
    }
    out
}

fn run(content: &str, map: &TranslationMap, chunk_size: usize) -> String {
    let options = SubstitutionOptions {
        chunk_size,
        ..SubstitutionOptions::default()
    };
    Substitution::new(map, options)
        .run(content, &NullReporter)
        .unwrap()
}

fn non_whitespace(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

fn patch_row(index: usize, offset: u64, value: &str, len: usize) -> PatchRow {
    PatchRow {
        row_index: index,
        offset,
        value_text: value.to_string(),
        write_length: len,
        cells: vec![offset.to_string(), value.to_string(), len.to_string()],
    }
}

proptest! {
    #[test]
    fn chunked_substitution_matches_single_pass(
        content in "[abcé \n]{0,120}",
        entries in prop::collection::btree_map("[abcé]{1,4}", "[xyz]{0,3}", 0..8),
        chunk_size in 1usize..32,
    ) {
        let map: TranslationMap = entries.clone().into_iter().collect();
        let expected = reference_substitute(&content, &entries);
        prop_assert_eq!(run(&content, &map, chunk_size), expected.clone());
        prop_assert_eq!(run(&content, &map, usize::MAX), expected);
    }

    #[test]
    fn identity_map_leaves_content_unchanged(
        content in "[abc \n]{0,100}",
        keys in prop::collection::btree_set("[abc]{1,3}", 0..6),
        chunk_size in 1usize..16,
    ) {
        let map: TranslationMap = keys.iter().map(|k| (k.clone(), k.clone())).collect();
        prop_assert_eq!(run(&content, &map, chunk_size), content);
    }

    #[test]
    fn plain_wrap_respects_limit_and_keeps_text(
        line in "[a-z .,!]{0,200}",
        limit in 1usize..30,
    ) {
        let out = wrap_text(&line, &WrapConfig::new(limit, Vec::new()));
        for segment in out.split('\n') {
            prop_assert!(segment.chars().count() <= limit, "{:?} exceeds {}", segment, limit);
        }
        prop_assert_eq!(non_whitespace(&out), non_whitespace(&line));
    }

    #[test]
    fn marker_wrap_fits_budget(
        line in "[a-z .,]{0,200}",
        limit in 4usize..30,
    ) {
        let config = WrapConfig::new(limit, vec!["|".to_string(), "#".to_string()]);
        let budget = config.budget();
        let out = wrap_text(&line, &config);
        for segment in out.split("|#") {
            prop_assert!(segment.chars().count() <= budget);
        }
        prop_assert_eq!(non_whitespace(&out.replace("|#", "")), non_whitespace(&line));
    }

    #[test]
    fn hex_round_trips(bytes in prop::collection::vec(any::<u8>(), 2..32)) {
        prop_assert_eq!(hex::decode(&hex::encode(&bytes)), bytes);
    }

    #[test]
    fn accepted_patches_are_disjoint_and_exact(
        specs in prop::collection::vec((0u64..64, 1usize..6, "[A-Z]{1,6}"), 0..16),
    ) {
        let rows: Vec<PatchRow> = specs
            .iter()
            .enumerate()
            .map(|(i, (offset, len, value))| patch_row(i, *offset, value, *len))
            .collect();
        let validation = validate_rows(&rows, Some(64));

        let mut spans: Vec<(u64, u64)> = Vec::new();
        for (op, index) in validation.operations.iter().zip(&validation.accepted) {
            let row = &rows[*index];
            prop_assert_eq!(op.bytes.len(), row.write_length);
            prop_assert!(op.offset + op.bytes.len() as u64 <= 64);
            let span = (op.offset, op.offset + op.bytes.len() as u64);
            prop_assert!(spans.iter().all(|s| span.1 <= s.0 || span.0 >= s.1));
            spans.push(span);
        }

        let rejected = validation.report.rejected_rows();
        prop_assert_eq!(rejected.len() + validation.accepted.len(), rows.len());
    }
}
