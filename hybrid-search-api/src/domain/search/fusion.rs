//! Reciprocal Rank Fusion of a keyword ranking and a semantic ranking.
//!
//! ```text
//! rrf(d) = full_text_weight / (k + keyword_rank(d)) + semantic_weight / (k + semantic_rank(d))
//! ```
//!
//! A source that did not return `d` contributes nothing to the sum. This is
//! the same contract the engine-side `search_documents_hybrid` function
//! implements; running it here lets the service fuse raw candidates itself.

use std::collections::HashMap;

use super::types::{
    DocumentId, FusedResult, RankedHit, DEFAULT_MATCH_COUNT, DEFAULT_RRF_K, DEFAULT_WEIGHT,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusionParams {
    pub full_text_weight: f64,
    pub semantic_weight: f64,
    /// Smoothing constant; larger values flatten the gap between top and lower ranks.
    pub rrf_k: u32,
    pub match_count: u32,
}

impl Default for FusionParams {
    fn default() -> Self {
        Self {
            full_text_weight: DEFAULT_WEIGHT,
            semantic_weight: DEFAULT_WEIGHT,
            rrf_k: DEFAULT_RRF_K,
            match_count: DEFAULT_MATCH_COUNT,
        }
    }
}

/// Contribution of one source ranking to a document's fused score.
pub fn rrf_term(weight: f64, rrf_k: u32, rank: u32) -> f64 {
    // rank 0 is not a valid position; treat it as the top so k = 0 cannot divide by zero
    weight / (f64::from(rrf_k) + f64::from(rank.max(1)))
}

/// Fuse two rankings into one list ordered by descending RRF score.
///
/// Ties keep first-seen order (keyword list first, then semantic list), so the
/// output is fully determined by the inputs. At most `match_count` results are
/// returned.
pub fn fuse(keyword: &[RankedHit], semantic: &[RankedHit], params: &FusionParams) -> Vec<FusedResult> {
    let mut slots: HashMap<&DocumentId, usize> =
        HashMap::with_capacity(keyword.len() + semantic.len());
    let mut fused: Vec<FusedResult> = Vec::with_capacity(keyword.len() + semantic.len());

    for hit in keyword {
        let slot = slot_for(&mut slots, &mut fused, hit);
        let entry = &mut fused[slot];
        // a duplicate id within one source keeps its best rank
        if entry.keyword_rank.map_or(true, |rank| hit.rank < rank) {
            entry.keyword_rank = Some(hit.rank);
            entry.keyword_score = hit.score;
        }
    }

    for hit in semantic {
        let slot = slot_for(&mut slots, &mut fused, hit);
        let entry = &mut fused[slot];
        if entry.semantic_rank.map_or(true, |rank| hit.rank < rank) {
            entry.semantic_rank = Some(hit.rank);
            entry.similarity_score = hit.score;
        }
    }

    for entry in &mut fused {
        let keyword_term = entry
            .keyword_rank
            .map_or(0.0, |rank| rrf_term(params.full_text_weight, params.rrf_k, rank));
        let semantic_term = entry
            .semantic_rank
            .map_or(0.0, |rank| rrf_term(params.semantic_weight, params.rrf_k, rank));
        entry.rrf_score = keyword_term + semantic_term;
    }

    // sort_by is stable, which gives the first-seen tie-break
    fused.sort_by(|a, b| b.rrf_score.total_cmp(&a.rrf_score));
    fused.truncate(params.match_count as usize);
    fused
}

fn slot_for<'a>(
    slots: &mut HashMap<&'a DocumentId, usize>,
    fused: &mut Vec<FusedResult>,
    hit: &'a RankedHit,
) -> usize {
    *slots.entry(&hit.document.id).or_insert_with(|| {
        fused.push(FusedResult::unranked(hit.document.clone()));
        fused.len() - 1
    })
}

/// Whether `results` satisfies the output contract of [`fuse`].
pub fn is_fused_order(results: &[FusedResult]) -> bool {
    results
        .windows(2)
        .all(|pair| pair[0].rrf_score >= pair[1].rrf_score)
}
