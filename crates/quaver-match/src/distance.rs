// SPDX-License-Identifier: GPL-3.0-or-later

//! Weighted penalty accumulation.
//!
//! A [`Distance`] collects the penalties that comparisons decide to charge,
//! each tagged with a dimension name and the configured weight of that
//! dimension. The scalar distance is the weighted average of everything
//! collected; dimensions that charged nothing stay out of the accumulator
//! entirely, so a perfect comparison is an empty accumulator with distance
//! zero.

use std::cmp::Ordering;
use std::collections::BTreeMap;

/// One charged penalty: dimension name, configured weight, and a value in
/// `(0.0, 1.0]`.
#[derive(Debug, Clone, PartialEq)]
pub struct PenaltyEntry {
    pub name: &'static str,
    pub weight: f64,
    pub value: f64,
}

/// Accumulated penalties for one candidate comparison.
///
/// Entries keep insertion order and per-track sub-distances are keyed by the
/// candidate track's position, so identical inputs always produce an
/// identical breakdown.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Distance {
    entries: Vec<PenaltyEntry>,
    track_breakdown: BTreeMap<usize, Distance>,
}

impl Distance {
    pub fn new() -> Self {
        Self::default()
    }

    /// Charges a penalty. Zero-valued penalties are discarded, values above
    /// 1.0 are capped, and entries with non-finite or non-positive weights
    /// are ignored.
    pub fn add(&mut self, name: &'static str, weight: f64, value: f64) {
        if !value.is_finite() || value <= 0.0 {
            return;
        }
        if !weight.is_finite() || weight <= 0.0 {
            return;
        }
        self.entries.push(PenaltyEntry {
            name,
            weight,
            value: value.min(1.0),
        });
    }

    /// Charges `amount / total`, capped at 1.0. Nothing is charged when the
    /// total is not positive.
    pub fn add_ratio(&mut self, name: &'static str, weight: f64, amount: f64, total: f64) {
        if total <= 0.0 {
            return;
        }
        self.add(name, weight, amount.clamp(0.0, total) / total);
    }

    /// Charges one full penalty per unit of difference between two counts,
    /// so larger disagreements carry more of the total weight.
    pub fn add_number(&mut self, name: &'static str, weight: f64, left: u32, right: u32) {
        let diff = left.abs_diff(right);
        for _ in 0..diff {
            self.add(name, weight, 1.0);
        }
    }

    /// Merges another accumulator into this one. Entries keep their own
    /// weights; sub-distances are carried over by track position.
    pub fn update(&mut self, other: Distance) {
        self.entries.extend(other.entries);
        self.track_breakdown.extend(other.track_breakdown);
    }

    /// Records the per-track breakdown for the candidate track at
    /// `candidate_index`.
    pub fn set_track_distance(&mut self, candidate_index: usize, distance: Distance) {
        self.track_breakdown.insert(candidate_index, distance);
    }

    /// Breakdown for a single candidate track, when one was recorded.
    pub fn track_distance(&self, candidate_index: usize) -> Option<&Distance> {
        self.track_breakdown.get(&candidate_index)
    }

    /// All per-track breakdowns, ordered by candidate track position.
    pub fn track_distances(&self) -> &BTreeMap<usize, Distance> {
        &self.track_breakdown
    }

    /// Every charged penalty in insertion order, one entry per `add` call.
    /// Unlike [`items`](Self::items), repeated dimensions are not folded
    /// together.
    pub fn entries(&self) -> &[PenaltyEntry] {
        &self.entries
    }

    /// True when no penalty has been charged.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The normalized weighted distance in `[0.0, 1.0]`: the weighted
    /// average over every charged penalty, or 0.0 when nothing was charged.
    pub fn distance(&self) -> f64 {
        let total = self.total_weight();
        if total <= 0.0 {
            return 0.0;
        }
        (self.weighted_sum() / total).clamp(0.0, 1.0)
    }

    /// Total ordering by scalar distance, for ranking candidates.
    pub fn total_cmp(&self, other: &Self) -> Ordering {
        self.distance().total_cmp(&other.distance())
    }

    /// Each contributing dimension with its share of the total distance,
    /// worst first; dimension name breaks ties. Dimensions that charged
    /// nothing never appear.
    pub fn items(&self) -> Vec<(&'static str, f64)> {
        let total = self.total_weight();
        if total <= 0.0 {
            return Vec::new();
        }

        let mut shares: Vec<(&'static str, f64)> = Vec::new();
        for entry in &self.entries {
            match shares.iter_mut().find(|(name, _)| *name == entry.name) {
                Some((_, sum)) => *sum += entry.weight * entry.value,
                None => shares.push((entry.name, entry.weight * entry.value)),
            }
        }
        for (_, sum) in &mut shares {
            *sum /= total;
        }
        shares.sort_by(|left, right| {
            right
                .1
                .partial_cmp(&left.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| left.0.cmp(right.0))
        });
        shares
    }

    /// Contributing dimension names, worst first.
    pub fn penalty_names(&self) -> Vec<&'static str> {
        self.items().into_iter().map(|(name, _)| name).collect()
    }

    /// Human-readable penalty list for match displays: dimension names with
    /// the `track_` prefix dropped and underscores spaced, worst first,
    /// truncated with an ellipsis beyond `limit`. `None` when nothing was
    /// charged.
    pub fn penalty_summary(&self, limit: Option<usize>) -> Option<String> {
        let mut names: Vec<String> = self
            .penalty_names()
            .into_iter()
            .map(|name| name.strip_prefix("track_").unwrap_or(name).replace('_', " "))
            .collect();
        if names.is_empty() {
            return None;
        }
        if let Some(limit) = limit {
            if names.len() > limit {
                names.truncate(limit);
                names.push("…".to_string());
            }
        }
        Some(names.join(", "))
    }

    /// The distance rendered as a similarity percentage, the way match
    /// listings present it.
    pub fn similarity_display(&self) -> String {
        format!("{:.1}%", (1.0 - self.distance()) * 100.0)
    }

    fn total_weight(&self) -> f64 {
        self.entries.iter().map(|entry| entry.weight).sum()
    }

    fn weighted_sum(&self) -> f64 {
        self.entries
            .iter()
            .map(|entry| entry.weight * entry.value)
            .sum()
    }
}
