//! Duplicate detection for import candidates
//!
//! Compares statement candidates against a point-in-time snapshot of the
//! ledger and writes a confidence score into each candidate. Confidence 0
//! flags a near-certain duplicate (auto-deselected in review); a mid score
//! flags a possible duplicate that needs human judgement; 100 means new.
//! Candidates are never removed or reordered.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    normalize_description, ParsedTransaction, Transaction, DUPLICATE_CONFIDENCE, FULL_CONFIDENCE,
};

/// Shortest normalized description allowed to count as contained within a
/// longer one. Below this, containment matches almost anything.
const MIN_CONTAINMENT_LEN: usize = 4;

/// Detector tuning knobs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DetectorConfig {
    /// Days of slack allowed between candidate and existing dates
    pub date_tolerance_days: i64,
    /// Confidence assigned to partial matches; must stay above the
    /// duplicate sentinel (0) so partials are not auto-deselected
    pub partial_confidence: u8,
    /// Minimum token overlap for a weak description match, in [0,1]
    pub weak_overlap: f64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            date_tolerance_days: 1,
            partial_confidence: 50,
            weak_overlap: 0.5,
        }
    }
}

/// How strongly a candidate matched an existing transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStrength {
    /// Date, amount and description all lined up
    Exact,
    /// Two of the three dimensions lined up
    Partial,
}

/// The existing transaction a candidate was matched against
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateMatch {
    pub existing_id: Uuid,
    pub existing_description: String,
    pub existing_date: NaiveDate,
    pub strength: MatchStrength,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum DescSimilarity {
    Strong,
    Weak,
    None,
}

/// Candidate/existing pairing considered during assignment
#[derive(Debug, Clone, Copy)]
struct Pairing {
    confidence: u8,
    similarity: DescSimilarity,
    candidate: usize,
    existing: usize,
}

/// Deterministic duplicate detector
pub struct DuplicateDetector {
    config: DetectorConfig,
}

impl Default for DuplicateDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl DuplicateDetector {
    pub fn new() -> Self {
        Self::with_config(DetectorConfig::default())
    }

    pub fn with_config(config: DetectorConfig) -> Self {
        Self { config }
    }

    /// Score every candidate against the ledger snapshot, writing the
    /// resulting confidence into each candidate in place.
    ///
    /// Each existing transaction is consumed by at most one candidate: when
    /// several candidates match the same existing row, the strongest pairing
    /// wins (ties resolve by input order) and the losers degrade one level,
    /// so one ledger entry never flags a whole batch as duplicates.
    ///
    /// Returns the match behind each candidate's score, aligned by index.
    pub fn detect(
        &self,
        candidates: &mut [ParsedTransaction],
        existing: &[Transaction],
    ) -> Vec<Option<DuplicateMatch>> {
        // Partial stays distinguishable from the duplicate sentinel
        let partial = self.config.partial_confidence.clamp(1, FULL_CONFIDENCE - 1);

        let candidate_norms: Vec<String> = candidates
            .iter()
            .map(|c| normalize_description(&c.description))
            .collect();
        let existing_norms: Vec<String> = existing
            .iter()
            .map(|e| normalize_description(&e.description))
            .collect();

        let mut pairings = Vec::new();
        for (ci, candidate) in candidates.iter().enumerate() {
            for (ei, record) in existing.iter().enumerate() {
                let (confidence, similarity) = self.score(
                    candidate,
                    record,
                    &candidate_norms[ci],
                    &existing_norms[ei],
                    partial,
                );
                if confidence < FULL_CONFIDENCE {
                    pairings.push(Pairing {
                        confidence,
                        similarity,
                        candidate: ci,
                        existing: ei,
                    });
                }
            }
        }

        // Strongest first. Equal-confidence pairings for the same row go to
        // the closer description; index order breaks remaining ties.
        pairings.sort_by_key(|p| (p.confidence, p.similarity, p.candidate, p.existing));

        let mut consumed = vec![false; existing.len()];
        let mut assigned: Vec<Option<Pairing>> = vec![None; candidates.len()];
        let mut best_lost: Vec<Option<u8>> = vec![None; candidates.len()];

        for pairing in &pairings {
            if assigned[pairing.candidate].is_some() {
                continue;
            }
            if consumed[pairing.existing] {
                let lost = &mut best_lost[pairing.candidate];
                if lost.map_or(true, |c| pairing.confidence < c) {
                    *lost = Some(pairing.confidence);
                }
                continue;
            }
            consumed[pairing.existing] = true;
            assigned[pairing.candidate] = Some(*pairing);
        }

        let mut matches = Vec::with_capacity(candidates.len());
        for (ci, candidate) in candidates.iter_mut().enumerate() {
            match assigned[ci] {
                Some(pairing) => {
                    candidate.confidence = pairing.confidence;
                    let record = &existing[pairing.existing];
                    matches.push(Some(DuplicateMatch {
                        existing_id: record.id,
                        existing_description: record.description.clone(),
                        existing_date: record.date,
                        strength: if pairing.confidence == DUPLICATE_CONFIDENCE {
                            MatchStrength::Exact
                        } else {
                            MatchStrength::Partial
                        },
                    }));
                }
                None => {
                    // A candidate whose only matches were consumed degrades
                    // one level instead of inheriting the duplicate flag
                    candidate.confidence = match best_lost[ci] {
                        Some(DUPLICATE_CONFIDENCE) => partial,
                        _ => FULL_CONFIDENCE,
                    };
                    matches.push(None);
                }
            }
        }
        matches
    }

    /// Score one candidate/existing pair.
    ///
    /// All three dimensions matched (description at strong level) flags a
    /// duplicate. Any two of the three flags a partial. Anything less is new.
    /// Weak description similarity never counts as a dimension; it is
    /// reported so equal partials can be ranked.
    fn score(
        &self,
        candidate: &ParsedTransaction,
        record: &Transaction,
        candidate_norm: &str,
        existing_norm: &str,
        partial: u8,
    ) -> (u8, DescSimilarity) {
        let date_ok =
            (candidate.date - record.date).num_days().abs() <= self.config.date_tolerance_days;
        let amount_ok = candidate.signed_cents() == record.signed_cents();
        let similarity =
            description_similarity(candidate_norm, existing_norm, self.config.weak_overlap);
        let desc_strong = similarity == DescSimilarity::Strong;

        if date_ok && amount_ok && desc_strong {
            return (DUPLICATE_CONFIDENCE, similarity);
        }
        let matched_dimensions =
            usize::from(date_ok) + usize::from(amount_ok) + usize::from(desc_strong);
        if matched_dimensions >= 2 {
            return (partial, similarity);
        }
        (FULL_CONFIDENCE, similarity)
    }
}

/// Compare two normalized descriptions.
///
/// Strong: equal, or one contains the other (the shorter side must carry
/// some substance). Weak: token overlap at or above the configured ratio.
fn description_similarity(a: &str, b: &str, weak_overlap: f64) -> DescSimilarity {
    if a == b {
        return DescSimilarity::Strong;
    }
    let (shorter, longer) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    if shorter.len() >= MIN_CONTAINMENT_LEN && longer.contains(shorter) {
        return DescSimilarity::Strong;
    }
    if token_overlap(a, b) >= weak_overlap {
        return DescSimilarity::Weak;
    }
    DescSimilarity::None
}

/// Jaccard overlap between the token sets of two normalized descriptions
fn token_overlap(a: &str, b: &str) -> f64 {
    let tokens_a: HashSet<&str> = a.split_whitespace().collect();
    let tokens_b: HashSet<&str> = b.split_whitespace().collect();
    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0.0;
    }
    let intersection = tokens_a.intersection(&tokens_b).count();
    let union = tokens_a.union(&tokens_b).count();
    intersection as f64 / union as f64
}
