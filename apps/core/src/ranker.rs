use std::collections::HashMap;
use std::path::PathBuf;

use crate::model::{Candidate, ResolvedTarget};

/// Picks the single best candidate: highest score, then shortest path,
/// then earliest position in `candidates`.
pub fn rank(candidates: Vec<Candidate>) -> Option<ResolvedTarget> {
    let merged = dedupe(candidates);

    merged
        .into_iter()
        .enumerate()
        .min_by(|(left_index, left), (right_index, right)| {
            right
                .score
                .cmp(&left.score)
                .then_with(|| left.path_len().cmp(&right.path_len()))
                .then_with(|| left_index.cmp(right_index))
        })
        .map(|(_, candidate)| candidate.into())
}

/// Drops non-matches and collapses repeated paths into their first
/// occurrence, keeping the best score seen for that path.
pub fn dedupe(candidates: Vec<Candidate>) -> Vec<Candidate> {
    let mut positions: HashMap<PathBuf, usize> = HashMap::new();
    let mut out: Vec<Candidate> = Vec::with_capacity(candidates.len());

    for candidate in candidates {
        if !candidate.score.is_match() {
            continue;
        }
        let key = path_key(&candidate);
        match positions.get(&key) {
            Some(&index) => {
                if candidate.score > out[index].score {
                    out[index].score = candidate.score;
                }
            }
            None => {
                positions.insert(key, out.len());
                out.push(candidate);
            }
        }
    }

    out
}

#[cfg(target_os = "windows")]
fn path_key(candidate: &Candidate) -> PathBuf {
    PathBuf::from(candidate.path.to_string_lossy().to_lowercase())
}

#[cfg(not(target_os = "windows"))]
fn path_key(candidate: &Candidate) -> PathBuf {
    candidate.path.clone()
}
