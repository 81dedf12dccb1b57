use log::debug;
use std::collections::{BTreeMap, HashMap, HashSet};

/// English stop words removed before weighting when `stop_words` is enabled.
const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "also", "am", "an", "and", "any",
    "are", "as", "at", "be", "because", "been", "before", "being", "below", "between", "both",
    "but", "by", "can", "could", "did", "do", "does", "doing", "down", "during", "each", "few",
    "for", "from", "further", "had", "has", "have", "having", "he", "her", "here", "hers",
    "herself", "him", "himself", "his", "how", "i", "if", "in", "into", "is", "it", "its",
    "itself", "me", "more", "most", "my", "myself", "no", "nor", "not", "of", "off", "on",
    "once", "only", "or", "other", "our", "ours", "ourselves", "out", "over", "own", "same",
    "she", "should", "so", "some", "such", "than", "that", "the", "their", "theirs", "them",
    "themselves", "then", "there", "these", "they", "this", "those", "through", "to", "too",
    "under", "until", "up", "very", "was", "we", "were", "what", "when", "where", "which",
    "while", "who", "whom", "why", "will", "with", "would", "you", "your", "yours", "yourself",
    "yourselves",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenMode {
    /// Lower-cased alphanumeric words of at least two characters.
    Words,
    /// Whole comma-separated tags, trimmed and lower-cased.
    Tags,
}

impl TokenMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "words" | "word" => Some(TokenMode::Words),
            "tags" | "tag" => Some(TokenMode::Tags),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenizerConfig {
    pub mode: TokenMode,
    pub stop_words: bool,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        TokenizerConfig {
            mode: TokenMode::Words,
            stop_words: true,
        }
    }
}

impl TokenizerConfig {
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        let raw: Vec<&str> = match self.mode {
            TokenMode::Words => lowered
                .split(|c: char| !c.is_alphanumeric())
                .filter(|w| w.chars().count() >= 2)
                .collect(),
            TokenMode::Tags => lowered
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .collect(),
        };

        raw.into_iter()
            .filter(|token| !(self.stop_words && STOP_WORDS.contains(token)))
            .map(str::to_string)
            .collect()
    }
}

/// A fitted vocabulary term and its inverse document frequency.
#[derive(Debug, Clone, PartialEq)]
pub struct VocabularyTerm {
    pub term: String,
    pub document_frequency: usize,
    pub idf: f64,
}

/// Sparse TF-IDF vector: `(term id, weight)` pairs sorted by term id.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GenreVector {
    weights: Vec<(u32, f64)>,
    norm: f64,
}

impl GenreVector {
    pub fn from_weights(mut weights: Vec<(u32, f64)>) -> Self {
        weights.retain(|(_, w)| *w != 0.0);
        weights.sort_by_key(|(id, _)| *id);
        let norm = weights.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
        GenreVector { weights, norm }
    }

    pub fn norm(&self) -> f64 {
        self.norm
    }

    pub fn is_zero(&self) -> bool {
        self.norm == 0.0
    }

    fn normalized(mut self) -> Self {
        if self.norm > 0.0 {
            for (_, w) in self.weights.iter_mut() {
                *w /= self.norm;
            }
            self.norm = 1.0;
        }
        self
    }

    pub fn dot(&self, other: &GenreVector) -> f64 {
        let (mut i, mut j) = (0, 0);
        let mut sum = 0.0;
        while i < self.weights.len() && j < other.weights.len() {
            let (a_id, a_w) = self.weights[i];
            let (b_id, b_w) = other.weights[j];
            match a_id.cmp(&b_id) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    sum += a_w * b_w;
                    i += 1;
                    j += 1;
                }
            }
        }
        sum
    }

    /// `1 - cos(a, b)`. A zero vector is treated as orthogonal to everything.
    pub fn cosine_distance(&self, other: &GenreVector) -> f64 {
        if self.is_zero() || other.is_zero() {
            return 1.0;
        }
        let cosine = self.dot(other) / (self.norm * other.norm);
        (1.0 - cosine).clamp(0.0, 2.0)
    }
}

/// TF-IDF model over genre strings. The vocabulary is fixed once fitted.
#[derive(Debug, Clone)]
pub struct GenreVectorizer {
    tokenizer: TokenizerConfig,
    terms: Vec<VocabularyTerm>,
    lookup: HashMap<String, u32>,
}

impl GenreVectorizer {
    /// Fit the vocabulary over `documents` and return one vector per document, in order.
    pub fn fit<S: AsRef<str>>(
        documents: &[S],
        tokenizer: TokenizerConfig,
    ) -> (Self, Vec<GenreVector>) {
        let tokenized: Vec<Vec<String>> = documents
            .iter()
            .map(|d| tokenizer.tokenize(d.as_ref()))
            .collect();

        let mut doc_freq: BTreeMap<&str, usize> = BTreeMap::new();
        for tokens in &tokenized {
            let unique: HashSet<&str> = tokens.iter().map(String::as_str).collect();
            for term in unique {
                *doc_freq.entry(term).or_insert(0) += 1;
            }
        }

        // Smoothed idf: ln((1 + n) / (1 + df)) + 1
        let n = documents.len() as f64;
        let terms: Vec<VocabularyTerm> = doc_freq
            .into_iter()
            .map(|(term, df)| VocabularyTerm {
                term: term.to_string(),
                document_frequency: df,
                idf: ((1.0 + n) / (1.0 + df as f64)).ln() + 1.0,
            })
            .collect();

        let lookup = terms
            .iter()
            .enumerate()
            .map(|(id, t)| (t.term.clone(), id as u32))
            .collect();

        let vectorizer = GenreVectorizer {
            tokenizer,
            terms,
            lookup,
        };

        let vectors = tokenized
            .iter()
            .map(|tokens| vectorizer.vectorize_tokens(tokens))
            .collect();

        debug!(
            "Fitted genre vocabulary: {} terms over {} documents",
            vectorizer.terms.len(),
            documents.len()
        );

        (vectorizer, vectors)
    }

    /// Vectorize arbitrary text against the fitted vocabulary.
    /// Unknown tokens are ignored.
    pub fn transform(&self, text: &str) -> GenreVector {
        self.vectorize_tokens(&self.tokenizer.tokenize(text))
    }

    pub fn vocabulary(&self) -> &[VocabularyTerm] {
        &self.terms
    }

    fn vectorize_tokens(&self, tokens: &[String]) -> GenreVector {
        let mut counts: HashMap<u32, f64> = HashMap::new();
        for token in tokens {
            if let Some(&id) = self.lookup.get(token.as_str()) {
                *counts.entry(id).or_insert(0.0) += 1.0;
            }
        }

        let weights = counts
            .into_iter()
            .map(|(id, tf)| (id, tf * self.terms[id as usize].idf))
            .collect();

        GenreVector::from_weights(weights).normalized()
    }
}
