//! Lexical relevance over a fetched candidate set.

use std::collections::HashMap;

use crate::constants::{BM25_B, BM25_EPSILON, BM25_K1};

/// Splits text into lowercase alphanumeric runs of at least two characters.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|run| run.chars().count() >= 2)
        .map(str::to_string)
        .collect()
}

/// Optional lexical capability. Selected once, when the retriever is built.
pub trait LexicalScorer: Send + Sync {
    /// Scores every document against `query`, or `None` when lexical scoring is disabled.
    fn scores(&self, query: &str, documents: &[&str]) -> Option<Vec<f32>>;
}

/// Disables lexical scoring: fusion falls back to vector order.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullLexicalScorer;

impl LexicalScorer for NullLexicalScorer {
    fn scores(&self, _query: &str, _documents: &[&str]) -> Option<Vec<f32>> {
        None
    }
}

/// Okapi BM25 where the reference corpus is the document set passed to each call.
#[derive(Debug, Clone, Copy)]
pub struct Bm25Scorer {
    k1: f32,
    b: f32,
    epsilon: f32,
}

impl Default for Bm25Scorer {
    fn default() -> Self {
        Self {
            k1: BM25_K1,
            b: BM25_B,
            epsilon: BM25_EPSILON,
        }
    }
}

impl Bm25Scorer {
    pub fn new(k1: f32, b: f32) -> Self {
        Self {
            k1,
            b,
            ..Default::default()
        }
    }

    /// Floor for negative idf values, as a fraction of the average idf.
    pub fn with_epsilon(mut self, epsilon: f32) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// BM25 over pre-tokenized documents.
    pub fn score_tokens(&self, query: &[String], documents: &[Vec<String>]) -> Vec<f32> {
        let n = documents.len();
        if n == 0 {
            return Vec::new();
        }

        let total_len: usize = documents.iter().map(Vec::len).sum();
        if total_len == 0 {
            return vec![0.0; n];
        }
        let avgdl = total_len as f32 / n as f32;

        let term_freqs: Vec<HashMap<&str, usize>> = documents
            .iter()
            .map(|doc| {
                let mut tf = HashMap::new();
                for token in doc {
                    *tf.entry(token.as_str()).or_insert(0) += 1;
                }
                tf
            })
            .collect();

        let mut doc_freq: HashMap<&str, usize> = HashMap::new();
        for tf in &term_freqs {
            for &term in tf.keys() {
                *doc_freq.entry(term).or_insert(0) += 1;
            }
        }

        let mut idf: HashMap<&str, f32> = HashMap::with_capacity(doc_freq.len());
        let mut idf_sum = 0.0f32;
        let mut negative = Vec::new();
        for (&term, &df) in &doc_freq {
            let value = ((n as f32 - df as f32 + 0.5) / (df as f32 + 0.5)).ln();
            idf_sum += value;
            if value < 0.0 {
                negative.push(term);
            }
            idf.insert(term, value);
        }
        let floor = self.epsilon * idf_sum / idf.len() as f32;
        for term in negative {
            idf.insert(term, floor);
        }

        documents
            .iter()
            .zip(&term_freqs)
            .map(|(doc, tf)| {
                let norm = self.k1 * (1.0 - self.b + self.b * doc.len() as f32 / avgdl);
                query
                    .iter()
                    .map(|q| {
                        let freq = tf.get(q.as_str()).copied().unwrap_or(0) as f32;
                        if freq == 0.0 {
                            return 0.0;
                        }
                        let weight = idf.get(q.as_str()).copied().unwrap_or(0.0);
                        weight * (freq * (self.k1 + 1.0)) / (freq + norm)
                    })
                    .sum()
            })
            .collect()
    }
}

impl LexicalScorer for Bm25Scorer {
    fn scores(&self, query: &str, documents: &[&str]) -> Option<Vec<f32>> {
        let query_tokens = tokenize(query);
        let doc_tokens: Vec<Vec<String>> = documents.iter().map(|d| tokenize(d)).collect();
        Some(self.score_tokens(&query_tokens, &doc_tokens))
    }
}
