//! Evidence-to-criteria text matching.
//!
//! Phrases are vectorized with term-frequency / inverse-document-frequency
//! weights over unigrams and bigrams (stop words excluded) and compared by
//! cosine similarity. `match_evidence` reports which *target criteria* were
//! best supported by the offered evidence; `suggest_from_keywords` goes the
//! other way, picking criterion phrases for seed keywords.
//!
//! There is deliberately no minimum-score threshold: a target with no
//! lexical overlap still gets its best (near-zero) candidate rather than
//! being filtered out.

use crate::normalize::normalise_space;
use std::collections::{HashMap, HashSet};

/// Common English words excluded from vectorization.
const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "all", "an", "and", "any", "are", "as", "at", "be",
    "been", "before", "being", "below", "between", "both", "but", "by", "can", "could", "did",
    "do", "does", "doing", "down", "during", "each", "few", "for", "from", "further", "had",
    "has", "have", "having", "he", "her", "here", "hers", "him", "his", "how", "i", "if", "in",
    "into", "is", "it", "its", "just", "me", "more", "most", "my", "no", "nor", "not", "of",
    "off", "on", "once", "only", "or", "other", "our", "out", "over", "own", "same", "she",
    "should", "so", "some", "such", "than", "that", "the", "their", "them", "then", "there",
    "these", "they", "this", "those", "through", "to", "too", "under", "until", "up", "very",
    "was", "we", "were", "what", "when", "where", "which", "while", "who", "whom", "why",
    "will", "with", "you", "your",
];

fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.contains(&token)
}

fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty() && !is_stop_word(t))
        .map(|t| t.to_string())
        .collect()
}

/// Unigrams plus bigrams of the non-stop-word token stream.
fn terms(text: &str) -> Vec<String> {
    let tokens = tokenize(text);
    let mut out = tokens.clone();
    for pair in tokens.windows(2) {
        out.push(format!("{} {}", pair[0], pair[1]));
    }
    out
}

/// Sparse TF-IDF vectorizer fitted over a phrase corpus.
struct TfidfVectorizer {
    vocab: HashMap<String, usize>,
    idf: Vec<f64>,
}

impl TfidfVectorizer {
    fn fit(corpus: &[String]) -> Self {
        let n_docs = corpus.len();
        let mut vocab: HashMap<String, usize> = HashMap::new();
        let mut doc_freq: Vec<usize> = Vec::new();

        for phrase in corpus {
            let unique: HashSet<String> = terms(phrase).into_iter().collect();
            for term in unique {
                let next = vocab.len();
                let idx = *vocab.entry(term).or_insert(next);
                if idx == doc_freq.len() {
                    doc_freq.push(0);
                }
                doc_freq[idx] += 1;
            }
        }

        // Smoothed idf, never zero, so every known term contributes
        let idf = doc_freq
            .iter()
            .map(|&df| ((1.0 + n_docs as f64) / (1.0 + df as f64)).ln() + 1.0)
            .collect();

        Self { vocab, idf }
    }

    /// L2-normalized sparse vector of a phrase. Unknown terms are dropped;
    /// an all-stop-word phrase yields the zero vector.
    fn transform(&self, phrase: &str) -> HashMap<usize, f64> {
        let mut counts: HashMap<usize, f64> = HashMap::new();
        for term in terms(phrase) {
            if let Some(&idx) = self.vocab.get(&term) {
                *counts.entry(idx).or_insert(0.0) += 1.0;
            }
        }
        for (idx, value) in counts.iter_mut() {
            *value *= self.idf[*idx];
        }
        let norm: f64 = counts.values().map(|v| v * v).sum::<f64>().sqrt();
        if norm > 0.0 {
            for value in counts.values_mut() {
                *value /= norm;
            }
        }
        counts
    }
}

fn cosine(a: &HashMap<usize, f64>, b: &HashMap<usize, f64>) -> f64 {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    small
        .iter()
        .filter_map(|(idx, va)| large.get(idx).map(|vb| va * vb))
        .sum()
}

fn cleaned(phrases: &[String]) -> Vec<String> {
    phrases
        .iter()
        .map(|p| normalise_space(p))
        .filter(|p| !p.is_empty())
        .collect()
}

/// Rank target criteria by how well the offered evidence supports them and
/// return the best-supported targets, at most `max`.
///
/// For each target the single best-scoring candidate is found; the
/// (target, candidate, score) triples are ranked by score descending and
/// walked, keeping each target the first time it appears.
pub fn match_evidence(targets: &[String], candidates: &[String], max: usize) -> Vec<String> {
    let targets = cleaned(targets);
    let candidates = cleaned(candidates);
    if targets.is_empty() || candidates.is_empty() || max == 0 {
        return Vec::new();
    }

    let mut corpus = targets.clone();
    corpus.extend(candidates.iter().cloned());
    let vectorizer = TfidfVectorizer::fit(&corpus);

    let target_vecs: Vec<_> = targets.iter().map(|t| vectorizer.transform(t)).collect();
    let candidate_vecs: Vec<_> = candidates.iter().map(|c| vectorizer.transform(c)).collect();

    // (target index, best score) — best candidate per target
    let mut ranked: Vec<(usize, f64)> = target_vecs
        .iter()
        .enumerate()
        .map(|(ti, tv)| {
            let best = candidate_vecs
                .iter()
                .map(|cv| cosine(tv, cv))
                .fold(0.0_f64, f64::max);
            (ti, best)
        })
        .collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    let mut seen: HashSet<usize> = HashSet::new();
    let mut out = Vec::new();
    for (ti, _score) in ranked {
        if out.len() >= max {
            break;
        }
        if seen.insert(ti) {
            out.push(targets[ti].clone());
        }
    }
    out
}

/// For each seed keyword pick the single best-matching criterion phrase,
/// deduplicated by criterion, at most `max`, normalized into bullet form.
pub fn suggest_from_keywords(seeds: &[String], criteria: &[String], max: usize) -> Vec<String> {
    let seeds = cleaned(seeds);
    let criteria = cleaned(criteria);
    if seeds.is_empty() || criteria.is_empty() || max == 0 {
        return Vec::new();
    }

    // Seeds are queries against the criteria corpus
    let vectorizer = TfidfVectorizer::fit(&criteria);
    let criterion_vecs: Vec<_> = criteria.iter().map(|c| vectorizer.transform(c)).collect();

    let mut picked: HashSet<usize> = HashSet::new();
    let mut out = Vec::new();
    for seed in &seeds {
        if out.len() >= max {
            break;
        }
        let sv = vectorizer.transform(seed);
        let best = criterion_vecs
            .iter()
            .enumerate()
            .map(|(ci, cv)| (ci, cosine(&sv, cv)))
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        if let Some((ci, _)) = best {
            if picked.insert(ci) {
                out.push(bulletize(&criteria[ci]));
            }
        }
    }
    out
}

/// Strip leading phrasing prefixes and trailing periods so a criterion reads
/// as a bullet.
fn bulletize(phrase: &str) -> String {
    let mut rest = phrase.trim();
    let lower = rest.to_lowercase();
    for prefix in ["capability to ", "ability to ", "to "] {
        if lower.starts_with(prefix) {
            rest = &rest[prefix.len()..];
            break;
        }
    }
    rest.trim().trim_end_matches('.').to_string()
}
