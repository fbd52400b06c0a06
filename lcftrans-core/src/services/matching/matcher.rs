use std::collections::{BTreeMap, HashMap};

use sha2::{Digest, Sha256};

use super::normalize::{levenshtein_within, normalize, tolerance};
use crate::model::catalog::Catalog;
use crate::model::entry::Entry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict<'a> {
    Exact(&'a str),
    /// Needs review: near-equal text, or exact text with conflicting answers.
    Fuzzy(&'a str),
    Unmatched,
}

struct Candidate<'a> {
    original: &'a str,
    normalized: String,
    chars: Vec<char>,
    answer: &'a str,
}

/// Lookup structure over the catalog that supplies the answers.
pub struct SourceIndex<'a> {
    candidates: Vec<Candidate<'a>>,
    by_original: HashMap<&'a str, Vec<usize>>,
    by_norm_hash: HashMap<String, Vec<usize>>,
    /// Candidates by normalized char count.
    by_len: BTreeMap<usize, Vec<usize>>,
}

fn hash_norm(norm: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(norm.as_bytes());
    hex::encode(hasher.finalize())
}

/// The text a source entry contributes: its translation when it has one,
/// otherwise its original.
pub fn answer(e: &Entry) -> &str {
    if e.is_translated() {
        &e.translation
    } else {
        &e.original
    }
}

impl<'a> SourceIndex<'a> {
    pub fn new(source: &'a Catalog) -> Self {
        let mut index = SourceIndex {
            candidates: Vec::with_capacity(source.len()),
            by_original: HashMap::new(),
            by_norm_hash: HashMap::new(),
            by_len: BTreeMap::new(),
        };

        for (i, e) in source.entries().enumerate() {
            let normalized = normalize(&e.original);
            index.by_original.entry(e.original.as_str()).or_default().push(i);
            let chars: Vec<char> = normalized.chars().collect();
            index.by_norm_hash.entry(hash_norm(&normalized)).or_default().push(i);
            index.by_len.entry(chars.len()).or_default().push(i);
            index.candidates.push(Candidate {
                original: &e.original,
                normalized,
                chars,
                answer: answer(e),
            });
        }

        index
    }

    pub fn lookup(&self, original: &str) -> Verdict<'a> {
        if let Some(ids) = self.by_original.get(original) {
            let first = self.candidates[ids[0]].answer;
            let agree = ids.iter().all(|&i| self.candidates[i].answer == first);
            return if agree { Verdict::Exact(first) } else { Verdict::Fuzzy(first) };
        }

        let norm = normalize(original);
        if norm.is_empty() {
            return Verdict::Unmatched;
        }

        if let Some(ids) = self.by_norm_hash.get(&hash_norm(&norm)) {
            if let Some(&i) = ids.iter().find(|&&i| self.candidates[i].normalized == norm) {
                return Verdict::Fuzzy(self.candidates[i].answer);
            }
        }

        self.closest(&norm)
            .map(|c| Verdict::Fuzzy(c.answer))
            .unwrap_or(Verdict::Unmatched)
    }

    /// Smallest edit distance within tolerance; earliest candidate on ties.
    fn closest(&self, norm: &str) -> Option<&Candidate<'a>> {
        let chars: Vec<char> = norm.chars().collect();
        let len = chars.len();

        // Outside these lengths the length difference alone exceeds the tolerance.
        let shortest = len - len / 10;
        let longest = len * 10 / 9 + 1;

        let mut best: Option<(usize, usize)> = None;
        for (_, ids) in self.by_len.range(shortest..=longest) {
            for &i in ids {
                let c = &self.candidates[i];
                let limit = tolerance(len, c.chars.len());
                if limit == 0 {
                    continue;
                }
                let bound = best.map_or(limit, |(bd, _)| bd.min(limit));
                let Some(d) = levenshtein_within(&chars, &c.chars, bound) else {
                    continue;
                };
                let better = match best {
                    None => true,
                    Some((bd, bi)) => d < bd || (d == bd && i < bi),
                };
                if better {
                    tracing::trace!(event = "fuzzy_candidate", original = c.original, distance = d);
                    best = Some((d, i));
                }
            }
        }

        best.map(|(_, i)| &self.candidates[i])
    }
}
