// SPDX-License-Identifier: GPL-3.0-or-later

//! Local-to-candidate track alignment.
//!
//! Pairing decides which local file corresponds to which candidate track
//! before any detailed comparison happens, so it has to survive reordered
//! tracklists, bonus tracks on the local side, and missing tracks on the
//! candidate side. The pairing cost is a cheap proxy (title distance plus a
//! small displacement nudge); the full metadata comparison runs afterwards
//! on the chosen pairs.

use quaver_domain::{CandidateTrack, LocalTrack};
use tracing::debug;

use crate::similarity::string_distance_opt;

/// Weight of the displacement term in the pairing cost. Small enough that
/// titles dominate, large enough to keep equal-cost pairings in the
/// original order.
const DISPLACEMENT_WEIGHT: f64 = 0.2;


/// A one-to-one pairing between local tracks and candidate tracks, by
/// position in the two input slices. Every index appears at most once
/// across `pairs` and its side's leftover list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Correspondence {
    pairs: Vec<(usize, usize)>,
    extra_local: Vec<usize>,
    missing_candidates: Vec<usize>,
}

impl Correspondence {
    /// Matched `(local index, candidate index)` pairs, ordered by local
    /// index.
    pub fn pairs(&self) -> &[(usize, usize)] {
        &self.pairs
    }

    /// Local tracks with no candidate counterpart, in disc/track/title
    /// order.
    pub fn extra_local(&self) -> &[usize] {
        &self.extra_local
    }

    /// Candidate tracks with no local counterpart, in index/title order.
    pub fn missing_candidates(&self) -> &[usize] {
        &self.missing_candidates
    }

    /// The candidate paired with a local track, if any.
    pub fn candidate_for(&self, local_index: usize) -> Option<usize> {
        self.pairs
            .iter()
            .find(|(local, _)| *local == local_index)
            .map(|(_, candidate)| *candidate)
    }

    /// True when every track on both sides found a counterpart.
    pub fn is_complete(&self) -> bool {
        self.extra_local.is_empty() && self.missing_candidates.is_empty()
    }
}

/// Pairs local tracks with candidate tracks at minimum total cost.
///
/// When both sides have the same length and every position already pairs
/// at zero cost the identity pairing is returned directly; otherwise a
/// minimum-cost assignment is solved over the full cost matrix. Unpaired tracks land in
/// [`Correspondence::extra_local`] and
/// [`Correspondence::missing_candidates`].
pub fn align(locals: &[LocalTrack], candidates: &[CandidateTrack]) -> Correspondence {
    if locals.is_empty() || candidates.is_empty() {
        return finish(
            locals,
            candidates,
            Vec::new(),
            (0..locals.len()).collect(),
            (0..candidates.len()).collect(),
        );
    }

    if let Some(correspondence) = in_order_alignment(locals, candidates) {
        debug!(
            target: "aligner",
            tracks = locals.len(),
            "tracklists already line up, skipping assignment solve"
        );
        return correspondence;
    }

    let span = locals.len().max(candidates.len());
    let mut costs = vec![vec![0.0; span]; span];
    for (local_index, local) in locals.iter().enumerate() {
        for (candidate_index, candidate) in candidates.iter().enumerate() {
            costs[local_index][candidate_index] =
                pairing_cost(local, candidate, local_index, candidate_index, span);
        }
    }

    let assignment = solve_assignment(&costs);

    let mut pairs = Vec::new();
    let mut extra_local = Vec::new();
    for (local_index, &candidate_index) in assignment.iter().enumerate().take(locals.len()) {
        if candidate_index < candidates.len() {
            pairs.push((local_index, candidate_index));
        } else {
            extra_local.push(local_index);
        }
    }
    let missing_candidates = (0..candidates.len())
        .filter(|candidate| !pairs.iter().any(|(_, paired)| paired == candidate))
        .collect();

    debug!(
        target: "aligner",
        local_tracks = locals.len(),
        candidate_tracks = candidates.len(),
        paired = pairs.len(),
        "assignment solve complete"
    );
    finish(locals, candidates, pairs, extra_local, missing_candidates)
}

/// Identity pairing for tracklists that already agree, position by
/// position. The pairing cost at every position must be exactly zero:
/// costs are non-negative, so a zero-cost identity is globally minimal and
/// skipping the solve cannot change the result. Any nonzero cost (a renamed
/// title, a displaced track number) falls through to the full solve.
fn in_order_alignment(
    locals: &[LocalTrack],
    candidates: &[CandidateTrack],
) -> Option<Correspondence> {
    if locals.len() != candidates.len() {
        return None;
    }
    let span = locals.len();
    let lined_up = locals
        .iter()
        .zip(candidates)
        .enumerate()
        .all(|(position, (local, candidate))| {
            pairing_cost(local, candidate, position, position, span) == 0.0
        });
    lined_up.then(|| Correspondence {
        pairs: (0..locals.len()).map(|index| (index, index)).collect(),
        extra_local: Vec::new(),
        missing_candidates: Vec::new(),
    })
}

fn pairing_cost(
    local: &LocalTrack,
    candidate: &CandidateTrack,
    local_position: usize,
    candidate_position: usize,
    span: usize,
) -> f64 {
    let title = string_distance_opt(local.title.as_deref(), candidate.title.as_deref());
    // Tagged numbers when present, slice positions otherwise.
    let local_number = local
        .track
        .map(f64::from)
        .unwrap_or((local_position + 1) as f64);
    let candidate_number = candidate
        .index
        .map(f64::from)
        .unwrap_or((candidate_position + 1) as f64);
    let displacement = ((local_number - candidate_number).abs() / span as f64).min(1.0);
    title + DISPLACEMENT_WEIGHT * displacement
}

fn finish(
    locals: &[LocalTrack],
    candidates: &[CandidateTrack],
    pairs: Vec<(usize, usize)>,
    mut extra_local: Vec<usize>,
    mut missing_candidates: Vec<usize>,
) -> Correspondence {
    extra_local.sort_by(|&left, &right| {
        let left = &locals[left];
        let right = &locals[right];
        (left.disc, left.track, left.title.as_deref()).cmp(&(
            right.disc,
            right.track,
            right.title.as_deref(),
        ))
    });
    missing_candidates.sort_by(|&left, &right| {
        let left = &candidates[left];
        let right = &candidates[right];
        (left.index, left.title.as_deref()).cmp(&(right.index, right.title.as_deref()))
    });
    Correspondence {
        pairs,
        extra_local,
        missing_candidates,
    }
}

/// Minimum-cost perfect assignment on a square cost matrix via shortest
/// augmenting paths over row/column potentials, O(n³). Returns the column
/// chosen for each row. Ties resolve to the lowest column index, which
/// keeps equal-cost pairings in input order.
fn solve_assignment(costs: &[Vec<f64>]) -> Vec<usize> {
    let n = costs.len();
    // 1-based working arrays; column 0 is the virtual start of each path.
    let mut row_potential = vec![0.0; n + 1];
    let mut col_potential = vec![0.0; n + 1];
    let mut col_owner = vec![0usize; n + 1];
    let mut col_parent = vec![0usize; n + 1];

    for row in 1..=n {
        col_owner[0] = row;
        let mut current_col = 0usize;
        let mut min_reduced = vec![f64::INFINITY; n + 1];
        let mut visited = vec![false; n + 1];

        loop {
            visited[current_col] = true;
            let owner = col_owner[current_col];
            let mut delta = f64::INFINITY;
            let mut next_col = 0usize;

            for col in 1..=n {
                if visited[col] {
                    continue;
                }
                let reduced = costs[owner - 1][col - 1] - row_potential[owner] - col_potential[col];
                if reduced < min_reduced[col] {
                    min_reduced[col] = reduced;
                    col_parent[col] = current_col;
                }
                if min_reduced[col] < delta {
                    delta = min_reduced[col];
                    next_col = col;
                }
            }

            for col in 0..=n {
                if visited[col] {
                    row_potential[col_owner[col]] += delta;
                    col_potential[col] -= delta;
                } else {
                    min_reduced[col] -= delta;
                }
            }

            current_col = next_col;
            if col_owner[current_col] == 0 {
                break;
            }
        }

        // Augment: walk the path back to the start, shifting ownership.
        while current_col != 0 {
            let parent = col_parent[current_col];
            col_owner[current_col] = col_owner[parent];
            current_col = parent;
        }
    }

    let mut assignment = vec![0usize; n];
    for col in 1..=n {
        if col_owner[col] > 0 {
            assignment[col_owner[col] - 1] = col - 1;
        }
    }
    assignment
}
