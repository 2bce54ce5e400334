//! Exercise name resolution against a live workout catalog.
//!
//! Resolution rules:
//! 1. Normalize both sides (case, brand names, punctuation, plural "s")
//! 2. Verbatim, normalized or same-words-reordered matches win outright
//! 3. Otherwise score every candidate on word overlap, positional
//!    character agreement and length difference
//! 4. Candidates on the other side of a confused pair are excluded
//! 5. The acceptance threshold tightens when the requested name belongs
//!    to any confused pair
//!
//! An unresolved result is a normal outcome. Callers must report it and
//! never substitute a guess.

use crate::config::{ConfusedPair, ResolverConfig};
use crate::types::split_alternatives;
use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

const WORD_WEIGHT: f64 = 0.7;
const POSITION_WEIGHT: f64 = 0.3;
const LENGTH_PENALTY: f64 = 0.2;

static DEFAULT_RESOLVER: Lazy<ExerciseResolver> =
    Lazy::new(|| ExerciseResolver::new(&ResolverConfig::default()));

/// Resolve a name against catalog names with the default configuration
pub fn resolve_exercise<S: AsRef<str>>(requested: &str, catalog: &[S]) -> Resolution {
    DEFAULT_RESOLVER.resolve(requested, catalog)
}

/// An accepted catalog match
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Match {
    /// Catalog name exactly as supplied
    pub name: String,
    pub score: f64,
    pub exact: bool,
}

/// Why the best candidate was not accepted
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    BelowThreshold,
    ConfusedPair,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::BelowThreshold => f.write_str("below threshold"),
            RejectReason::ConfusedPair => f.write_str("confused pair"),
        }
    }
}

/// The strongest candidate that was turned down
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Rejection {
    pub name: String,
    pub score: f64,
    pub reason: RejectReason,
}

/// Outcome of resolving one requested name
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Resolution {
    Resolved(Match),
    Unresolved { best_rejected: Option<Rejection> },
}

impl Resolution {
    pub fn name(&self) -> Option<&str> {
        match self {
            Resolution::Resolved(m) => Some(&m.name),
            Resolution::Unresolved { .. } => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved(_))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum Side {
    Left,
    Right,
}

/// Normalized fragment lists for one confused pair
#[derive(Clone, Debug)]
struct PairFragments {
    left: Vec<String>,
    right: Vec<String>,
}

/// Resolver configured with thresholds, brand tokens and confused pairs
#[derive(Clone, Debug)]
pub struct ExerciseResolver {
    threshold: f64,
    strict_threshold: f64,
    brand_tokens: Vec<String>,
    pairs: Vec<PairFragments>,
}

impl ExerciseResolver {
    pub fn new(config: &ResolverConfig) -> Self {
        let brand_tokens: Vec<String> = config
            .brand_tokens
            .iter()
            .map(|t| normalize_words(t))
            .filter(|t| !t.is_empty())
            .collect();
        let pairs = config
            .confused_pairs
            .iter()
            .map(|pair: &ConfusedPair| PairFragments {
                left: pair.left.iter().map(|f| normalize_words(f)).collect(),
                right: pair.right.iter().map(|f| normalize_words(f)).collect(),
            })
            .collect();

        Self {
            threshold: config.threshold,
            strict_threshold: config.strict_threshold,
            brand_tokens,
            pairs,
        }
    }

    /// Normalize a name the way both sides of a comparison are normalized
    pub fn normalize(&self, name: &str) -> String {
        let mut padded = format!(" {} ", normalize_words(name));
        for token in &self.brand_tokens {
            let pattern = format!(" {} ", token);
            while padded.contains(&pattern) {
                padded = padded.replace(&pattern, " ");
            }
        }
        let mut normalized = padded.trim().to_string();
        if normalized.ends_with('s') && !normalized.ends_with("ss") {
            normalized.pop();
        }
        normalized.trim().to_string()
    }

    /// Whether a name contains a fragment of any confused pair
    pub fn is_confusable(&self, name: &str) -> bool {
        !self.families(&self.normalize(name)).is_empty()
    }

    /// Resolve `requested` against the catalog names
    pub fn resolve<S: AsRef<str>>(&self, requested: &str, catalog: &[S]) -> Resolution {
        if let Some(entry) = catalog.iter().find(|c| c.as_ref() == requested) {
            tracing::debug!(requested, "resolver.verbatim");
            return Resolution::Resolved(Match {
                name: entry.as_ref().to_string(),
                score: 1.0,
                exact: true,
            });
        }

        let req = self.normalize(requested);
        if req.is_empty() {
            return Resolution::Unresolved {
                best_rejected: None,
            };
        }
        let req_words = sorted_words(&req);

        for entry in catalog {
            let exact = split_alternatives(entry.as_ref()).any(|alt| {
                let alt = self.normalize(alt);
                alt == req || sorted_words(&alt) == req_words
            });
            if exact {
                tracing::debug!(requested, matched = entry.as_ref(), "resolver.exact");
                return Resolution::Resolved(Match {
                    name: entry.as_ref().to_string(),
                    score: 1.0,
                    exact: true,
                });
            }
        }

        let req_families = self.families(&req);
        let threshold = if req_families.is_empty() {
            self.threshold
        } else {
            self.strict_threshold
        };

        let mut best: Option<(f64, &str)> = None;
        let mut best_excluded: Option<(f64, &str)> = None;

        for entry in catalog {
            let name = entry.as_ref();
            let mut kept: Option<f64> = None;
            let mut excluded: Option<f64> = None;

            for alt in split_alternatives(name) {
                let alt = self.normalize(alt);
                let score = score_names(&req, &alt);
                if conflicts(&req_families, &self.families(&alt)) {
                    excluded = Some(excluded.map_or(score, |s: f64| s.max(score)));
                } else {
                    kept = Some(kept.map_or(score, |s: f64| s.max(score)));
                }
            }

            tracing::trace!(requested, candidate = name, ?kept, ?excluded, "resolver.scored");

            if let Some(score) = kept {
                if best.map_or(true, |(s, _)| score > s) {
                    best = Some((score, name));
                }
            } else if let Some(score) = excluded {
                if best_excluded.map_or(true, |(s, _)| score > s) {
                    best_excluded = Some((score, name));
                }
            }
        }

        if let Some((score, name)) = best {
            if score >= threshold {
                tracing::debug!(requested, matched = name, score, threshold, "resolver.matched");
                return Resolution::Resolved(Match {
                    name: name.to_string(),
                    score,
                    exact: false,
                });
            }
        }

        let below = best.map(|(score, name)| Rejection {
            name: name.to_string(),
            score,
            reason: RejectReason::BelowThreshold,
        });
        let confused = best_excluded.map(|(score, name)| Rejection {
            name: name.to_string(),
            score,
            reason: RejectReason::ConfusedPair,
        });
        let best_rejected = match (below, confused) {
            (Some(b), Some(c)) => Some(if c.score >= b.score { c } else { b }),
            (b, c) => b.or(c),
        };

        tracing::debug!(requested, threshold, ?best_rejected, "resolver.unresolved");
        Resolution::Unresolved { best_rejected }
    }

    /// Pair memberships of a normalized name
    fn families(&self, normalized: &str) -> HashSet<(usize, Side)> {
        let haystack: Vec<&str> = normalized.split_whitespace().collect();
        let mut found = HashSet::new();
        for (i, pair) in self.pairs.iter().enumerate() {
            if pair.left.iter().any(|f| has_fragment(&haystack, f)) {
                found.insert((i, Side::Left));
            }
            if pair.right.iter().any(|f| has_fragment(&haystack, f)) {
                found.insert((i, Side::Right));
            }
        }
        found
    }
}

/// Similarity of two normalized names
///
/// `0.7 * word jaccard + 0.3 * positional char agreement - 0.2 * length gap`
pub fn score_names(a: &str, b: &str) -> f64 {
    let words_a: HashSet<&str> = a.split_whitespace().collect();
    let words_b: HashSet<&str> = b.split_whitespace().collect();
    let union = words_a.union(&words_b).count();
    let jaccard = if union == 0 {
        0.0
    } else {
        words_a.intersection(&words_b).count() as f64 / union as f64
    };

    let chars_a: Vec<char> = a.chars().collect();
    let chars_b: Vec<char> = b.chars().collect();
    let max_len = chars_a.len().max(chars_b.len());
    if max_len == 0 {
        return 0.0;
    }
    let same_position = chars_a
        .iter()
        .zip(chars_b.iter())
        .filter(|(x, y)| x == y)
        .count() as f64
        / max_len as f64;
    let length_gap = chars_a.len().abs_diff(chars_b.len()) as f64 / max_len as f64;

    WORD_WEIGHT * jaccard + POSITION_WEIGHT * same_position - LENGTH_PENALTY * length_gap
}

/// Names in a confused pair conflict when they sit only on opposite sides
fn conflicts(a: &HashSet<(usize, Side)>, b: &HashSet<(usize, Side)>) -> bool {
    a.iter().any(|(pair, _)| {
        let sides_a: HashSet<Side> = a.iter().filter(|(p, _)| p == pair).map(|(_, s)| *s).collect();
        let sides_b: HashSet<Side> = b.iter().filter(|(p, _)| p == pair).map(|(_, s)| *s).collect();
        !sides_b.is_empty() && sides_a.is_disjoint(&sides_b)
    })
}

/// Lowercase, punctuation (hyphens included) to spaces, whitespace collapsed
fn normalize_words(name: &str) -> String {
    let spaced: String = name
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    spaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn sorted_words(normalized: &str) -> Vec<&str> {
    let mut words: Vec<&str> = normalized.split_whitespace().collect();
    words.sort_unstable();
    words
}

/// Fragment words must appear as whole consecutive words; a plural "s" is allowed
fn has_fragment(haystack: &[&str], fragment: &str) -> bool {
    let parts: Vec<&str> = fragment.split_whitespace().collect();
    if parts.is_empty() {
        return false;
    }
    haystack.windows(parts.len()).any(|window| {
        window
            .iter()
            .zip(&parts)
            .all(|(word, part)| word == part || word.strip_suffix('s') == Some(*part))
    })
}
