//! Ranked hypothesis types produced for one utterance

use serde::{Deserialize, Serialize};

/// One ranked transcription hypothesis for an utterance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alternative {
    /// Transcribed text (space-joined words)
    pub transcript: String,

    /// Confidence score (0.0 - 1.0), a heuristic blend of lm/am scores
    pub confidence: f64,

    /// Acoustic score of the underlying search path
    pub am_score: f32,

    /// Language-model score of the underlying search path
    pub lm_score: f32,

    /// Word-level timing and confidence
    ///
    /// Populated only on the top-ranked alternative, only when word-level
    /// output was requested and the model carries word-boundary info.
    #[serde(default)]
    pub words: Vec<Word>,
}

impl Alternative {
    /// Create an alternative with no word-level annotations
    pub fn new(transcript: String, confidence: f64, am_score: f32, lm_score: f32) -> Self {
        Self {
            transcript,
            confidence,
            am_score,
            lm_score,
            words: Vec::new(),
        }
    }

    /// Attach word-level annotations
    pub fn with_words(mut self, words: Vec<Word>) -> Self {
        self.words = words;
        self
    }

    /// Check if the transcript is empty
    pub fn is_empty(&self) -> bool {
        self.transcript.trim().is_empty()
    }

    /// Get word count of the transcript
    pub fn word_count(&self) -> usize {
        self.transcript.split_whitespace().count()
    }
}

/// Word-level timing and confidence information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Word {
    /// The word text
    pub word: String,

    /// Start time in seconds from utterance start
    pub start_time: f32,

    /// End time in seconds from utterance start
    pub end_time: f32,

    /// Confidence for this word (0.0 - 1.0)
    pub confidence: f32,
}

impl Word {
    pub fn new(word: impl Into<String>, start_time: f32, end_time: f32, confidence: f32) -> Self {
        Self {
            word: word.into(),
            start_time,
            end_time,
            confidence,
        }
    }

    /// Duration in seconds
    pub fn duration(&self) -> f32 {
        (self.end_time - self.start_time).max(0.0)
    }
}
