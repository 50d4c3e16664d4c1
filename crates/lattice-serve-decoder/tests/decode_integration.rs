//! Integration tests for the decoding core (pool -> session -> synthesis)
//!
//! These tests run the full acquire/feed/finalize/results flow against the
//! deterministic stub engine.

use std::collections::HashSet;
use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

use uuid::Uuid;

use lattice_serve_config::{DecodeParams, ModelSpec};
use lattice_serve_core::Alternative;
use lattice_serve_decoder::engine::stub::{
    StubAdaptationState, StubAlignment, StubEngine, StubEngineConfig, StubEngineLoader,
};
use lattice_serve_decoder::engine::SymbolTable;
use lattice_serve_decoder::{
    driver, DecoderPool, ModelBundle, ModelRegistry, SessionFactory, SessionHandle,
};

const SAMPLE_RATE: f32 = 16000.0;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn spec(n_decoders: usize) -> ModelSpec {
    ModelSpec {
        name: "general".to_string(),
        language_code: "en".to_string(),
        path: "unused".to_string(),
        n_decoders,
        decode: DecodeParams::default(),
    }
}

fn symbols() -> SymbolTable {
    let words = [
        "<eps>", "alpha", "bravo", "charlie", "delta", "echo", "foxtrot", "golf", "hotel",
    ];
    SymbolTable::from_entries(
        words
            .iter()
            .enumerate()
            .map(|(i, w)| (i as u32, w.to_string())),
    )
}

fn bundle(n_decoders: usize, word_level: bool, alignment: StubAlignment) -> Arc<ModelBundle> {
    init_tracing();
    let spec = spec(n_decoders);
    let engine = Arc::new(StubEngine::new(
        spec.decode,
        StubEngineConfig {
            alignment,
            ..StubEngineConfig::default()
        },
    ));
    ModelBundle::from_parts(spec, engine, symbols(), word_level)
}

/// 2.5 s of non-silence audio at 16 kHz
fn speech_buffer() -> Vec<f32> {
    (0..40_000).map(|i| ((i % 100) as f32) - 50.0).collect()
}

fn decode(
    handle: &mut SessionHandle,
    samples: &[f32],
    chunk_seconds: f32,
    n_best: usize,
    word_level: bool,
) -> Vec<Alternative> {
    handle.start(Uuid::new_v4());
    driver::feed_buffer(handle, SAMPLE_RATE, samples, chunk_seconds).unwrap();
    handle.finalize(false).unwrap();
    handle.results(n_best, word_level).unwrap()
}

/// Scenario: clear speech, n-best=1, word-level off
#[test]
fn test_single_alternative_without_word_level() {
    let pool = DecoderPool::new(bundle(1, true, StubAlignment::Full));
    let mut handle = pool.acquire();

    let results = decode(&mut handle, &speech_buffer(), 1.0, 1, false);
    assert_eq!(results.len(), 1);
    assert!(!results[0].transcript.is_empty());
    assert!(results[0].words.is_empty());
    assert!((0.0..=1.0).contains(&results[0].confidence));
}

/// Scenario: word-level on with word-boundary info present
#[test]
fn test_word_level_output_on_top_alternative() {
    let pool = DecoderPool::new(bundle(1, true, StubAlignment::Full));
    let mut handle = pool.acquire();

    let results = decode(&mut handle, &speech_buffer(), 1.0, 3, true);
    assert!(!results.is_empty());

    let top = &results[0];
    assert!(!top.words.is_empty());

    // spans fit the 2.5 s buffer and are monotonically non-decreasing
    let mut previous_start = 0.0f32;
    let mut total = 0.0f32;
    for word in &top.words {
        assert!(word.start_time <= word.end_time);
        assert!(word.start_time >= previous_start);
        assert!((0.0..=1.0).contains(&word.confidence));
        previous_start = word.start_time;
        total += word.end_time - word.start_time;
    }
    assert!(total <= 2.5 + 1e-3);

    for alt in results.iter().skip(1) {
        assert!(alt.words.is_empty());
    }
}

/// Scenario: silence buffer decodes zero frames
#[test]
fn test_empty_audio_returns_empty_alternatives() {
    let pool = DecoderPool::new(bundle(1, true, StubAlignment::Full));
    let mut handle = pool.acquire();

    handle.start(Uuid::new_v4());
    driver::feed_buffer(&mut handle, SAMPLE_RATE, &[], 1.0).unwrap();
    handle.finalize(false).unwrap();

    let results = handle.results(5, true).unwrap();
    assert!(results.is_empty());
}

/// Scenario: one chunk vs five 0.5 s chunks vs irregular incremental chunks
#[test]
fn test_chunk_boundary_invariance() {
    let pool = DecoderPool::new(bundle(1, true, StubAlignment::Full));
    let samples = speech_buffer();

    let mut handle = pool.acquire();
    let whole = decode(&mut handle, &samples, 0.0, 1, true);
    let halves = decode(&mut handle, &samples, 0.5, 1, true);

    // irregular incremental feed through the same path
    handle.start(Uuid::new_v4());
    for chunk in [&samples[..7_000], &samples[7_000..20_000], &samples[20_000..]] {
        handle.feed_chunk(SAMPLE_RATE, chunk).unwrap();
    }
    handle.finalize(false).unwrap();
    let incremental = handle.results(1, true).unwrap();

    for other in [&halves, &incremental] {
        assert_eq!(whole.len(), other.len());
        assert_eq!(whole[0].transcript, other[0].transcript);
        assert_eq!(whole[0].words.len(), other[0].words.len());
        for (a, b) in whole[0].words.iter().zip(other[0].words.iter()) {
            assert!((a.start_time - b.start_time).abs() < 1e-4);
            assert!((a.end_time - b.end_time).abs() < 1e-4);
        }
    }
}

/// Scenario: pool of 2, third acquire observably blocks until a release
#[test]
fn test_pool_blocks_caller_beyond_capacity() {
    let pool = Arc::new(DecoderPool::new(bundle(2, false, StubAlignment::Full)));

    let first = pool.acquire();
    let _second = pool.acquire();

    let (acquired_tx, acquired_rx) = mpsc::channel();
    let waiter = {
        let pool = Arc::clone(&pool);
        thread::spawn(move || {
            let handle = pool.acquire();
            acquired_tx.send(()).unwrap();
            drop(handle);
        })
    };

    // third caller stays blocked while both sessions are held
    assert!(acquired_rx.recv_timeout(Duration::from_millis(200)).is_err());

    drop(first);
    assert!(acquired_rx.recv_timeout(Duration::from_secs(2)).is_ok());
    waiter.join().unwrap();
}

/// Concurrent holders never share a session and never exceed capacity
#[test]
fn test_sessions_are_exclusively_owned() {
    let capacity = 3;
    let pool = Arc::new(DecoderPool::new(bundle(
        capacity,
        false,
        StubAlignment::Full,
    )));
    let held_addresses: Arc<Mutex<HashSet<usize>>> = Arc::new(Mutex::new(HashSet::new()));
    let concurrent = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    let workers: Vec<_> = (0..12)
        .map(|_| {
            let pool = Arc::clone(&pool);
            let held = Arc::clone(&held_addresses);
            let concurrent = Arc::clone(&concurrent);
            let peak = Arc::clone(&peak);
            thread::spawn(move || {
                let mut handle = pool.acquire();

                let address = &*handle as *const _ as usize;
                assert!(
                    held.lock().unwrap().insert(address),
                    "same session handed to two holders"
                );
                let now = concurrent.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);

                let results = decode(&mut handle, &speech_buffer(), 1.0, 1, false);
                assert_eq!(results.len(), 1);

                concurrent.fetch_sub(1, Ordering::SeqCst);
                held.lock().unwrap().remove(&address);
            })
        })
        .collect();

    for worker in workers {
        worker.join().unwrap();
    }

    assert!(peak.load(Ordering::SeqCst) <= capacity);
    assert_eq!(pool.idle_count(), capacity);
}

/// Requesting word-level output without word-boundary info never yields words
#[test]
fn test_word_level_gated_on_word_boundary_info() {
    let pool = DecoderPool::new(bundle(1, false, StubAlignment::Full));
    let mut handle = pool.acquire();

    let results = decode(&mut handle, &speech_buffer(), 1.0, 2, true);
    assert!(!results.is_empty());
    for alt in &results {
        assert!(alt.words.is_empty());
    }
}

/// Partial alignment degrades to fewer words; the transcript stays intact
#[test]
fn test_partial_alignment_keeps_transcript() {
    let pool = DecoderPool::new(bundle(1, true, StubAlignment::Partial));
    let mut handle = pool.acquire();

    let results = decode(&mut handle, &speech_buffer(), 1.0, 1, true);
    assert!(!results.is_empty());
    assert!(!results[0].transcript.is_empty());
}

/// Adaptation state is carried by the session slot across utterances
#[test]
fn test_adaptation_state_persists_across_utterances() {
    let factory = SessionFactory::new(bundle(1, false, StubAlignment::Full));
    let mut session = factory.produce();

    for _ in 0..2 {
        session.start(Uuid::new_v4());
        session.feed_chunk(SAMPLE_RATE, &speech_buffer()).unwrap();
        session.finalize(false).unwrap();
        session.results(1, false).unwrap();
    }

    let state = session
        .adaptation_state()
        .as_any()
        .downcast_ref::<StubAdaptationState>()
        .unwrap();
    assert_eq!(state.utterances_seen, 2);
    assert!(state.frames_seen > 0);
}

/// Full startup path: resolve model directories, load bundles, route by id
#[test]
fn test_registry_loads_from_model_directories() {
    let dir = tempfile::tempdir().unwrap();
    let model_dir = dir.path().join("general-en");
    let conf = model_dir.join("conf");
    fs::create_dir_all(&conf).unwrap();
    fs::write(model_dir.join("HCLG.fst"), b"fst").unwrap();
    fs::write(model_dir.join("final.mdl"), b"mdl").unwrap();
    fs::write(
        model_dir.join("words.txt"),
        "<eps> 0\nalpha 1\nbravo 2\ncharlie 3\n",
    )
    .unwrap();
    fs::write(conf.join("mfcc.conf"), "--sample-frequency=16000\n").unwrap();
    fs::write(conf.join("ivector_extractor.conf"), "--num-gselect=5\n").unwrap();
    // no word_boundary.int: word-level output must stay disabled

    let mut model_spec = spec(2);
    model_spec.path = model_dir.display().to_string();

    let registry =
        ModelRegistry::load_all(std::slice::from_ref(&model_spec), &StubEngineLoader::default())
            .unwrap();
    assert_eq!(registry.len(), 1);

    let pool = registry.pool("general", "en").unwrap();
    assert_eq!(pool.capacity(), 2);

    let mut handle = pool.acquire();
    let results = decode(&mut handle, &speech_buffer(), 1.0, 1, true);
    assert_eq!(results.len(), 1);
    assert!(results[0].words.is_empty());
}
