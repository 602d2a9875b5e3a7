// SPDX-License-Identifier: GPL-3.0-or-later

//! Match engine for music autotagging.
//!
//! Given the tags already present on a group of local audio files and a set
//! of candidate releases fetched from a metadata source, this crate aligns
//! local tracks to candidate tracks, scores each candidate with a weighted
//! distance over everything the two sides disagree on, ranks the candidates,
//! and says how much the best one should be trusted.

pub mod aligner;
pub mod distance;
pub mod evaluator;
pub mod penalties;
pub mod recommend;
pub mod similarity;

pub use aligner::{align, Correspondence};
pub use distance::{Distance, PenaltyEntry};
pub use evaluator::{
    evaluate_release, evaluate_singleton, rank_releases, rank_singletons, AlbumAggregate,
    EvaluateError, EvaluateResult, ReleaseMatch, Scored, SingletonMatch,
};
pub use recommend::{recommend, Recommendation};
pub use similarity::{string_distance, string_distance_opt};
