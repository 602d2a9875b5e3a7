// SPDX-License-Identifier: GPL-3.0-or-later

//! Recommendation policy.
//!
//! Ranked candidates are only half the answer; the caller also needs to
//! know whether the best one is safe to apply without a human in the loop.
//! The policy reads the best distance against the configured ladder, then
//! downgrades one level when the runner-up sits too close for the ranking
//! to be conclusive.

use quaver_config::RecommendationConfig;
use tracing::{debug, warn};

use crate::evaluator::Scored;

/// How much the best candidate should be trusted, from worthless to safe
/// to apply unattended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Recommendation {
    /// No candidate is worth presenting as a default.
    None,
    /// Worth listing, but needs a human eye.
    Low,
    /// Probably right; confirm before applying.
    Medium,
    /// Safe to apply without asking.
    Strong,
}

/// Decides how to present the best of a ranked candidate list.
///
/// `matches` must be sorted best-first, the way the ranking entry points
/// return them. An empty list recommends nothing. When at least two
/// candidates exist and the runner-up is within the configured gap margin
/// of the best, the result drops one level, so an ambiguous ranking never
/// recommends applying anything unattended.
pub fn recommend<M: Scored>(matches: &[M], config: &RecommendationConfig) -> Recommendation {
    let Some(best) = matches.first() else {
        return Recommendation::None;
    };

    let strong = clamp_threshold("strong_threshold", config.strong_threshold, 0.0);
    let medium = clamp_threshold("medium_threshold", config.medium_threshold, 0.0);
    let low = clamp_threshold("low_threshold", config.low_threshold, 0.0);
    let gap = clamp_threshold("gap_margin", config.gap_margin, 1.0);

    let best_distance = best.total_distance();
    let base = if best_distance <= strong {
        Recommendation::Strong
    } else if best_distance <= medium {
        Recommendation::Medium
    } else if best_distance <= low {
        Recommendation::Low
    } else {
        Recommendation::None
    };

    let ambiguous = matches
        .get(1)
        .map(|runner_up| runner_up.total_distance() - best_distance < gap)
        .unwrap_or(false);
    let recommendation = if ambiguous { downgrade(base) } else { base };

    debug!(
        target: "recommend",
        distance = best_distance,
        ambiguous,
        recommendation = ?recommendation,
        "recommendation decided"
    );
    recommendation
}

/// One level down, for ambiguous rankings. Low and None stay put: they
/// never automate anything in the first place.
fn downgrade(level: Recommendation) -> Recommendation {
    match level {
        Recommendation::Strong => Recommendation::Medium,
        Recommendation::Medium => Recommendation::Low,
        other => other,
    }
}

fn clamp_threshold(name: &str, value: f64, non_finite_default: f64) -> f64 {
    if !value.is_finite() {
        warn!(target: "recommend", name, value, "threshold is not finite, using default {non_finite_default}");
        return non_finite_default;
    }
    if !(0.0..=1.0).contains(&value) {
        let clamped = value.clamp(0.0, 1.0);
        warn!(target: "recommend", name, value, clamped, "threshold out of [0.0, 1.0] range, clamping");
        return clamped;
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ScoredStub(f64);

    impl Scored for ScoredStub {
        fn total_distance(&self) -> f64 {
            self.0
        }
    }

    fn stubs(distances: &[f64]) -> Vec<ScoredStub> {
        distances.iter().copied().map(ScoredStub).collect()
    }

    #[test]
    fn no_candidates_recommend_nothing() {
        let config = RecommendationConfig::default();
        assert_eq!(recommend(&stubs(&[]), &config), Recommendation::None);
    }

    #[test]
    fn a_lone_excellent_candidate_is_strong() {
        let config = RecommendationConfig::default();
        assert_eq!(recommend(&stubs(&[0.01]), &config), Recommendation::Strong);
    }

    #[test]
    fn a_clear_winner_is_strong() {
        let config = RecommendationConfig::default();
        assert_eq!(
            recommend(&stubs(&[0.01, 0.6]), &config),
            Recommendation::Strong
        );
    }

    #[test]
    fn a_near_tie_caps_the_recommendation_at_medium() {
        let config = RecommendationConfig::default();
        assert_eq!(
            recommend(&stubs(&[0.01, 0.02]), &config),
            Recommendation::Medium
        );
    }

    #[test]
    fn an_ambiguous_medium_match_falls_to_low() {
        let config = RecommendationConfig::default();
        assert_eq!(
            recommend(&stubs(&[0.2, 0.21]), &config),
            Recommendation::Low
        );
    }

    #[test]
    fn low_band_matches_stay_low_even_when_ambiguous() {
        let config = RecommendationConfig::default();
        assert_eq!(
            recommend(&stubs(&[0.35, 0.36]), &config),
            Recommendation::Low
        );
        assert_eq!(recommend(&stubs(&[0.35, 0.9]), &config), Recommendation::Low);
    }

    #[test]
    fn hopeless_best_distance_recommends_nothing() {
        let config = RecommendationConfig::default();
        assert_eq!(recommend(&stubs(&[0.7]), &config), Recommendation::None);
        assert_eq!(recommend(&stubs(&[0.7, 0.71]), &config), Recommendation::None);
    }

    #[test]
    fn recommendation_never_improves_as_the_best_distance_grows() {
        let config = RecommendationConfig::default();
        let mut previous = Recommendation::Strong;
        for step in 0..=100 {
            let distance = step as f64 / 100.0;
            let current = recommend(&stubs(&[distance]), &config);
            assert!(current <= previous);
            previous = current;
        }
    }

    #[test]
    fn out_of_range_thresholds_are_clamped() {
        let config = RecommendationConfig {
            strong_threshold: 7.0, // clamps to 1.0
            medium_threshold: 0.25,
            low_threshold: 0.40,
            gap_margin: -2.0, // clamps to 0.0: nothing is ambiguous
        };
        assert_eq!(
            recommend(&stubs(&[0.99, 0.99]), &config),
            Recommendation::Strong
        );
    }

    #[test]
    fn levels_order_from_none_to_strong() {
        assert!(Recommendation::None < Recommendation::Low);
        assert!(Recommendation::Low < Recommendation::Medium);
        assert!(Recommendation::Medium < Recommendation::Strong);
    }
}
