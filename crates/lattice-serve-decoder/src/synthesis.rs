//! Hypothesis synthesizer
//!
//! Converts a finalized weighted lattice into ranked [`Alternative`]s and,
//! when requested and available, word-level timing and confidence on the
//! top-ranked alternative.

use lattice_serve_core::{Alternative, Word};

use crate::engine::{Lattice, WordAlignment};
use crate::model::ModelBundle;

/// Frame shift of the feature pipeline in seconds
const FRAME_SHIFT_SECONDS: f32 = 0.01;

/// Language-model scale applied before minimum-Bayes-risk decoding
const LM_SCALE: f32 = 1.0;

/// Bound on state expansion during word alignment; zero means unbounded
const ALIGN_MAX_STATES: u32 = 0;

/// Merge lm and am scores into a single confidence value.
///
/// An empirical scalar blend of the two score components, bounded to [0, 1].
/// A heuristic, not a calibrated probability.
pub(crate) fn calculate_confidence(lm_score: f32, am_score: f32, n_words: usize) -> f64 {
    let blended = 2.388449 * lm_score as f64 + am_score as f64;
    (-0.0001466488 * blended / (n_words as f64 + 1.0) + 0.956).clamp(0.0, 1.0)
}

/// Synthesize up to `n_best` ranked alternatives from a final lattice
///
/// Alternatives come out in n-best order (best total score first); no
/// re-sorting happens after confidence computation. Empty lattices and empty
/// n-best extractions yield an empty list, never an error.
pub fn synthesize(
    lattice: &dyn Lattice,
    bundle: &ModelBundle,
    n_best: usize,
    word_level: bool,
) -> Vec<Alternative> {
    if lattice.num_states() == 0 {
        tracing::info!("empty lattice");
        return Vec::new();
    }

    let paths = lattice.nbest_paths(n_best);
    if paths.is_empty() {
        tracing::warn!("no n-best entries");
        return Vec::new();
    }

    let mut results: Vec<Alternative> = paths
        .iter()
        .map(|path| {
            let words: Vec<&str> = path
                .word_ids
                .iter()
                .map(|id| bundle.symbols().find(*id).unwrap_or("<unk>"))
                .collect();
            Alternative::new(
                words.join(" "),
                calculate_confidence(path.lm_score, path.am_score, path.word_ids.len()),
                path.am_score,
                path.lm_score,
            )
        })
        .collect();

    if !(word_level && bundle.word_level_enabled()) {
        return results;
    }

    let aligned = match lattice.align_words(ALIGN_MAX_STATES) {
        WordAlignment::Full(aligned) => Some(aligned),
        WordAlignment::Partial(aligned) => {
            tracing::warn!("word alignment failed part-way, outputting partial lattice");
            Some(aligned)
        }
        WordAlignment::Empty => {
            tracing::warn!("aligned lattice is empty, producing no word-level output");
            None
        }
    };

    if let Some(aligned) = aligned {
        let time_unit = FRAME_SHIFT_SECONDS * bundle.spec.decode.frame_subsampling_factor as f32;
        let words: Vec<Word> = aligned
            .mbr_one_best(LM_SCALE, bundle.spec.decode.acoustic_scale)
            .into_iter()
            .map(|w| {
                Word::new(
                    bundle.symbols().find(w.word_id).unwrap_or("<unk>"),
                    w.begin_frame * time_unit,
                    w.end_frame * time_unit,
                    w.confidence,
                )
            })
            .collect();

        if !words.is_empty() {
            if let Some(top) = results.first_mut() {
                top.words = words;
            }
        }
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::stub::{StubAlignment, StubEngine, StubEngineConfig, StubLattice};
    use crate::engine::SymbolTable;
    use lattice_serve_config::{DecodeParams, ModelSpec};
    use std::sync::Arc;

    fn test_bundle(word_level_enabled: bool) -> Arc<ModelBundle> {
        let spec = ModelSpec {
            name: "stub".to_string(),
            language_code: "en".to_string(),
            path: "unused".to_string(),
            n_decoders: 1,
            decode: DecodeParams::default(),
        };
        let engine = Arc::new(StubEngine::new(spec.decode, StubEngineConfig::default()));
        let symbols = SymbolTable::from_entries((0..16u32).map(|i| (i, format!("w{i}"))));
        ModelBundle::from_parts(spec, engine, symbols, word_level_enabled)
    }

    #[test]
    fn test_confidence_bounds_over_score_grid() {
        let scores = [-1e6f32, -5000.0, -42.5, 0.0, 42.5, 5000.0, 1e6];
        for &lm in &scores {
            for &am in &scores {
                for n_words in [0usize, 1, 7, 500] {
                    let c = calculate_confidence(lm, am, n_words);
                    assert!((0.0..=1.0).contains(&c), "confidence {c} out of bounds");
                }
            }
        }
    }

    #[test]
    fn test_confidence_matches_reference_blend() {
        // hand-computed from the blend formula
        let c = calculate_confidence(10.0, -300.0, 2);
        let expected = -0.0001466488 * (2.388449 * 10.0 - 300.0) / 3.0 + 0.956;
        assert!((c - expected).abs() < 1e-9);
    }

    #[test]
    fn test_empty_lattice_yields_no_alternatives() {
        let bundle = test_bundle(true);
        let lattice = StubLattice::empty();
        assert!(synthesize(&lattice, &bundle, 5, true).is_empty());
    }

    #[test]
    fn test_ranking_order_is_preserved() {
        let bundle = test_bundle(false);
        let lattice = StubLattice::with_words(vec![1, 2, 3, 4], 120, StubAlignment::Full);
        let results = synthesize(&lattice, &bundle, 3, false);
        assert_eq!(results.len(), 3);
        // n-best order: total path weight grows with rank
        for pair in results.windows(2) {
            let total0 = pair[0].lm_score + pair[0].am_score;
            let total1 = pair[1].lm_score + pair[1].am_score;
            assert!(total0 <= total1);
        }
    }

    #[test]
    fn test_word_level_gated_on_bundle() {
        let lattice = StubLattice::with_words(vec![1, 2, 3], 90, StubAlignment::Full);

        let without = test_bundle(false);
        let results = synthesize(&lattice, &without, 1, true);
        assert!(results[0].words.is_empty());

        let with = test_bundle(true);
        let results = synthesize(&lattice, &with, 1, true);
        assert!(!results[0].words.is_empty());
        // words only on the top-ranked alternative
        let results = synthesize(&lattice, &with, 3, true);
        assert!(results.iter().skip(1).all(|alt| alt.words.is_empty()));
    }

    #[test]
    fn test_partial_alignment_degrades_gracefully() {
        let bundle = test_bundle(true);

        let partial = StubLattice::with_words(vec![1, 2, 3, 4], 120, StubAlignment::Partial);
        let results = synthesize(&partial, &bundle, 1, true);
        assert!(!results.is_empty());
        assert!(!results[0].transcript.is_empty());
        assert!(!results[0].words.is_empty());
        assert!(results[0].words.len() < 4, "partial alignment emits fewer words");

        let empty = StubLattice::with_words(vec![1, 2, 3, 4], 120, StubAlignment::Empty);
        let results = synthesize(&empty, &bundle, 1, true);
        assert!(!results.is_empty());
        assert!(results[0].words.is_empty());
    }

    #[test]
    fn test_unknown_symbol_falls_back() {
        let bundle = test_bundle(false);
        let lattice = StubLattice::with_words(vec![999], 30, StubAlignment::Full);
        let results = synthesize(&lattice, &bundle, 1, false);
        assert_eq!(results[0].transcript, "<unk>");
    }
}
