// SPDX-License-Identifier: GPL-3.0-or-later

//! Candidate evaluation.
//!
//! This module turns a candidate release (or a single candidate track) into
//! a scored match against the local tracks: it aggregates the local tags
//! into an album-level profile, aligns the tracklists, charges every
//! configured penalty dimension, and bundles the result. Batch entry points
//! evaluate whole candidate lists in parallel and rank them best-first.

use quaver_config::MatchConfig;
use quaver_domain::{CandidateRelease, CandidateTrack, LocalTrack};
use rayon::prelude::*;
use thiserror::Error;
use tracing::debug;

use crate::aligner::{self, Correspondence};
use crate::distance::Distance;
use crate::penalties;
use crate::similarity::string_distance_opt;

/// A contract violation while scoring candidates.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EvaluateError {
    #[error("cannot score release candidates without local tracks")]
    NoLocalTracks,
}

pub type EvaluateResult<T> = Result<T, EvaluateError>;

/// A release candidate scored against a set of local tracks. The release is
/// held in canonical track order, so the correspondence and the per-track
/// breakdown index into it directly.
#[derive(Debug, Clone)]
pub struct ReleaseMatch {
    pub release: CandidateRelease,
    pub correspondence: Correspondence,
    pub distance: Distance,
}

/// A single candidate track scored against a single local track.
#[derive(Debug, Clone)]
pub struct SingletonMatch {
    pub track: CandidateTrack,
    pub distance: Distance,
}

/// Anything carrying a total match distance, for ranking and
/// recommendation.
pub trait Scored {
    fn total_distance(&self) -> f64;
}

impl Scored for ReleaseMatch {
    fn total_distance(&self) -> f64 {
        self.distance.distance()
    }
}

impl Scored for SingletonMatch {
    fn total_distance(&self) -> f64 {
        self.distance.distance()
    }
}

/// The most common value in `values` with its occurrence count. Ties go to
/// the value seen first; `None` only for an empty input.
pub fn plurality<T: PartialEq>(values: impl IntoIterator<Item = T>) -> Option<(T, usize)> {
    let mut counts: Vec<(T, usize)> = Vec::new();
    for value in values {
        match counts.iter_mut().find(|(existing, _)| *existing == value) {
            Some((_, count)) => *count += 1,
            None => counts.push((value, 1)),
        }
    }

    let mut best: Option<(T, usize)> = None;
    for (value, count) in counts {
        match &best {
            Some((_, best_count)) if count <= *best_count => {}
            _ => best = Some((value, count)),
        }
    }
    best
}

/// Album-level view of the local tracks: the plurality of each tagged
/// field, with a unanimous album artist overriding the per-track artist
/// vote.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlbumAggregate {
    pub artist: Option<String>,
    pub album: Option<String>,
    pub year: Option<i32>,
    pub disc_total: Option<u32>,
    pub country: Option<String>,
    pub label: Option<String>,
    pub catalog_number: Option<String>,
    pub media: Option<String>,
    pub release_id: Option<String>,
}

impl AlbumAggregate {
    pub fn from_tracks(locals: &[LocalTrack]) -> Self {
        let mut aggregate = Self {
            artist: plurality_field(locals, |track| track.artist.clone()),
            album: plurality_field(locals, |track| track.album.clone()),
            year: plurality_field(locals, |track| track.year),
            disc_total: plurality_field(locals, |track| track.disc_total),
            country: plurality_field(locals, |track| track.country.clone()),
            label: plurality_field(locals, |track| track.label.clone()),
            catalog_number: plurality_field(locals, |track| track.catalog_number.clone()),
            media: plurality_field(locals, |track| track.media.clone()),
            release_id: plurality_field(locals, |track| track.release_id.clone()),
        };

        // A unanimous album artist beats the per-track artist vote.
        if let Some(first) = locals.first().and_then(|track| track.album_artist.as_ref()) {
            if locals
                .iter()
                .all(|track| track.album_artist.as_deref() == Some(first.as_str()))
            {
                aggregate.artist = Some(first.clone());
            }
        }
        aggregate
    }
}

fn plurality_field<T: PartialEq>(
    locals: &[LocalTrack],
    field: impl Fn(&LocalTrack) -> Option<T>,
) -> Option<T> {
    plurality(locals.iter().filter_map(field)).map(|(value, _)| value)
}

/// Penalties between one local track and one candidate track.
///
/// The artist dimension is judged only when `include_artist` is set: on
/// various-artists releases and for singletons, where the per-track artist
/// actually discriminates. `multi_disc` relaxes the index comparison to
/// accept per-disc positions.
pub fn track_distance(
    local: &LocalTrack,
    candidate: &CandidateTrack,
    include_artist: bool,
    multi_disc: bool,
    config: &MatchConfig,
) -> Distance {
    let weights = &config.weights;
    let mut dist = Distance::new();

    dist.add(
        "track_title",
        weights.track_title,
        string_distance_opt(local.title.as_deref(), candidate.title.as_deref()),
    );

    if include_artist {
        if let Some(value) =
            penalties::track_artist_penalty(local.artist.as_deref(), candidate.artist.as_deref())
        {
            dist.add("track_artist", weights.track_artist, value);
        }
    }

    if let Some(value) = penalties::track_index_penalty(
        local.track,
        candidate,
        multi_disc,
        config.per_disc_numbering,
    ) {
        dist.add("track_index", weights.track_index, value);
    }

    if let Some(value) = penalties::track_length_penalty(
        local.length_secs,
        candidate.length_secs,
        config.track_length_grace_secs,
        config.track_length_max_secs,
    ) {
        dist.add("track_length", weights.track_length, value);
    }

    if let Some(value) = penalties::id_penalty(
        local.recording_id.as_deref(),
        candidate.recording_id.as_deref(),
    ) {
        dist.add("track_id", weights.track_id, value);
    }

    dist
}

/// Scores one release candidate against the local tracks.
///
/// The candidate's tracks are normalized into canonical order, aligned
/// against the local tracks, and every album-level and track-level penalty
/// dimension is charged into one accumulator. Per-track breakdowns are kept
/// alongside, keyed by candidate track position.
pub fn evaluate_release(
    locals: &[LocalTrack],
    mut release: CandidateRelease,
    config: &MatchConfig,
) -> EvaluateResult<ReleaseMatch> {
    if locals.is_empty() {
        return Err(EvaluateError::NoLocalTracks);
    }

    release.sort_tracks();
    let aggregate = AlbumAggregate::from_tracks(locals);
    let correspondence = aligner::align(locals, &release.tracks);
    let multi_disc = release.mediums.map(|count| count > 1).unwrap_or(false);
    let weights = &config.weights;

    let mut dist = Distance::new();

    if let Some(value) = penalties::artist_penalty(
        aggregate.artist.as_deref(),
        release.artist.as_deref(),
        release.va,
    ) {
        dist.add("artist", weights.artist, value);
    }
    if let Some(value) =
        penalties::album_penalty(aggregate.album.as_deref(), release.album.as_deref())
    {
        dist.add("album", weights.album, value);
    }
    if let Some(value) = penalties::id_penalty(
        aggregate.release_id.as_deref(),
        release.release_id.as_deref(),
    ) {
        dist.add("release_id", weights.release_id, value);
    }
    if let Some(value) =
        penalties::exact_match_penalty(aggregate.media.as_deref(), release.media.as_deref())
    {
        dist.add("media", weights.media, value);
    }
    if let (Some(disc_total), Some(mediums)) = (aggregate.disc_total, release.mediums) {
        dist.add_number("mediums", weights.mediums, disc_total, mediums);
    }
    if let Some(value) = penalties::year_penalty(aggregate.year, release.year) {
        dist.add("year", weights.year, value);
    }
    if let Some(value) =
        penalties::exact_match_penalty(aggregate.country.as_deref(), release.country.as_deref())
    {
        dist.add("country", weights.country, value);
    }
    if let Some(value) =
        penalties::exact_match_penalty(aggregate.label.as_deref(), release.label.as_deref())
    {
        dist.add("label", weights.label, value);
    }
    if let Some(value) = penalties::exact_match_penalty(
        aggregate.catalog_number.as_deref(),
        release.catalog_number.as_deref(),
    ) {
        dist.add("catalog_number", weights.catalog_number, value);
    }

    for &(local_index, candidate_index) in correspondence.pairs() {
        let track_dist = track_distance(
            &locals[local_index],
            &release.tracks[candidate_index],
            release.va,
            multi_disc,
            config,
        );
        dist.set_track_distance(candidate_index, track_dist.clone());
        dist.update(track_dist);
    }

    dist.add_ratio(
        "missing_tracks",
        weights.missing_tracks,
        correspondence.missing_candidates().len() as f64,
        release.tracks.len() as f64,
    );
    dist.add_ratio(
        "unmatched_tracks",
        weights.unmatched_tracks,
        correspondence.extra_local().len() as f64,
        locals.len() as f64,
    );

    debug!(
        target: "evaluator",
        album = release.album.as_deref().unwrap_or(""),
        distance = dist.distance(),
        "scored release candidate"
    );

    Ok(ReleaseMatch {
        release,
        correspondence,
        distance: dist,
    })
}

/// Scores one candidate track against one local track, for matching tracks
/// outside any album context.
pub fn evaluate_singleton(
    local: &LocalTrack,
    candidate: CandidateTrack,
    config: &MatchConfig,
) -> SingletonMatch {
    let distance = track_distance(local, &candidate, true, false, config);
    debug!(
        target: "evaluator",
        title = candidate.title.as_deref().unwrap_or(""),
        distance = distance.distance(),
        "scored singleton candidate"
    );
    SingletonMatch {
        track: candidate,
        distance,
    }
}

/// Scores every release candidate and ranks them best-first. Candidates at
/// the same distance keep their input order.
pub fn rank_releases(
    locals: &[LocalTrack],
    candidates: Vec<CandidateRelease>,
    config: &MatchConfig,
) -> EvaluateResult<Vec<ReleaseMatch>> {
    if locals.is_empty() {
        return Err(EvaluateError::NoLocalTracks);
    }
    let mut matches: Vec<ReleaseMatch> = candidates
        .into_par_iter()
        .map(|release| evaluate_release(locals, release, config))
        .collect::<EvaluateResult<_>>()?;
    matches.sort_by(|left, right| left.distance.total_cmp(&right.distance));
    Ok(matches)
}

/// Scores every singleton candidate and ranks them best-first.
pub fn rank_singletons(
    local: &LocalTrack,
    candidates: Vec<CandidateTrack>,
    config: &MatchConfig,
) -> Vec<SingletonMatch> {
    let mut matches: Vec<SingletonMatch> = candidates
        .into_par_iter()
        .map(|candidate| evaluate_singleton(local, candidate, config))
        .collect();
    matches.sort_by(|left, right| left.distance.total_cmp(&right.distance));
    matches
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local_track(title: &str, artist: &str, album: &str, track: u32, secs: f64) -> LocalTrack {
        LocalTrack {
            artist: Some(artist.to_string()),
            album: Some(album.to_string()),
            track: Some(track),
            length_secs: Some(secs),
            ..LocalTrack::new(title)
        }
    }

    fn candidate_track(title: &str, index: u32, secs: f64) -> CandidateTrack {
        CandidateTrack {
            index: Some(index),
            medium: Some(1),
            medium_index: Some(index),
            length_secs: Some(secs),
            ..CandidateTrack::new(title)
        }
    }

    fn unknown_pleasures_locals() -> Vec<LocalTrack> {
        vec![
            local_track("Disorder", "Joy Division", "Unknown Pleasures", 1, 209.0),
            local_track("Day of the Lords", "Joy Division", "Unknown Pleasures", 2, 286.0),
            local_track("Candidate", "Joy Division", "Unknown Pleasures", 3, 184.0),
        ]
    }

    fn unknown_pleasures_release() -> CandidateRelease {
        CandidateRelease {
            artist: Some("Joy Division".into()),
            year: Some(1979),
            mediums: Some(1),
            tracks: vec![
                candidate_track("Disorder", 1, 209.0),
                candidate_track("Day of the Lords", 2, 286.0),
                candidate_track("Candidate", 3, 184.0),
            ],
            ..CandidateRelease::new("Unknown Pleasures")
        }
    }

    #[test]
    fn plurality_picks_the_most_common_value() {
        let (value, count) = plurality(vec!["Factory", "Factory", "Strange Fruit"]).unwrap();
        assert_eq!(value, "Factory");
        assert_eq!(count, 2);
    }

    #[test]
    fn plurality_breaks_ties_in_favor_of_first_seen() {
        let (value, count) = plurality(vec!["b", "a", "a", "b"]).unwrap();
        assert_eq!(value, "b");
        assert_eq!(count, 2);
    }

    #[test]
    fn plurality_of_nothing_is_none() {
        assert_eq!(plurality(Vec::<u32>::new()), None);
    }

    #[test]
    fn aggregate_takes_the_majority_of_each_field() {
        let mut locals = unknown_pleasures_locals();
        locals[2].album = Some("Unknown Plesures".into()); // one typo loses the vote
        locals[0].year = Some(1979);
        locals[1].year = Some(1979);
        locals[2].year = Some(1980);

        let aggregate = AlbumAggregate::from_tracks(&locals);
        assert_eq!(aggregate.album.as_deref(), Some("Unknown Pleasures"));
        assert_eq!(aggregate.artist.as_deref(), Some("Joy Division"));
        assert_eq!(aggregate.year, Some(1979));
    }

    #[test]
    fn aggregate_prefers_a_unanimous_album_artist() {
        let mut locals = unknown_pleasures_locals();
        for track in &mut locals {
            track.album_artist = Some("Joy Division".into());
        }
        locals[0].artist = Some("Ian Curtis".into());
        locals[1].artist = Some("Ian Curtis".into());

        let aggregate = AlbumAggregate::from_tracks(&locals);
        assert_eq!(aggregate.artist.as_deref(), Some("Joy Division"));
    }

    #[test]
    fn aggregate_ignores_a_split_album_artist() {
        let mut locals = unknown_pleasures_locals();
        locals[0].album_artist = Some("Joy Division".into());
        // the other tracks never set album_artist

        let aggregate = AlbumAggregate::from_tracks(&locals);
        assert_eq!(aggregate.artist.as_deref(), Some("Joy Division")); // from the artist vote
    }

    #[test]
    fn track_distance_of_identical_tracks_is_empty() {
        let config = MatchConfig::default();
        let local = local_track("Disorder", "Joy Division", "Unknown Pleasures", 1, 209.0);
        let candidate = candidate_track("Disorder", 1, 209.0);
        let dist = track_distance(&local, &candidate, false, false, &config);
        assert!(dist.is_empty());
        assert_eq!(dist.distance(), 0.0);
    }

    #[test]
    fn track_distance_charges_title_and_length() {
        let config = MatchConfig::default();
        let local = local_track("Disordr", "Joy Division", "Unknown Pleasures", 1, 209.0);
        let candidate = candidate_track("Disorder", 1, 260.0);
        let dist = track_distance(&local, &candidate, false, false, &config);
        let names = dist.penalty_names();
        assert!(names.contains(&"track_title"));
        assert!(names.contains(&"track_length"));
        assert!(!names.contains(&"track_artist"));
    }

    #[test]
    fn track_distance_includes_artist_only_on_request() {
        let config = MatchConfig::default();
        let local = local_track("Disorder", "New Order", "Substance", 1, 209.0);
        let candidate = CandidateTrack {
            artist: Some("Joy Division".into()),
            ..candidate_track("Disorder", 1, 209.0)
        };
        let without = track_distance(&local, &candidate, false, false, &config);
        assert!(without.is_empty());
        let with = track_distance(&local, &candidate, true, false, &config);
        assert!(with.penalty_names().contains(&"track_artist"));
    }

    #[test]
    fn perfect_release_scores_zero() {
        let config = MatchConfig::default();
        let locals = unknown_pleasures_locals();
        let matched = evaluate_release(&locals, unknown_pleasures_release(), &config).unwrap();
        assert_eq!(matched.distance.distance(), 0.0);
        assert!(matched.correspondence.is_complete());
        for (_, candidate_index) in matched.correspondence.pairs() {
            assert!(matched.distance.track_distance(*candidate_index).is_some());
        }
    }

    #[test]
    fn empty_local_set_is_a_contract_violation() {
        let config = MatchConfig::default();
        let result = evaluate_release(&[], unknown_pleasures_release(), &config);
        assert_eq!(result.unwrap_err(), EvaluateError::NoLocalTracks);
        assert!(rank_releases(&[], vec![unknown_pleasures_release()], &config).is_err());
    }

    #[test]
    fn missing_candidate_tracks_charge_the_missing_ratio() {
        let config = MatchConfig::default();
        let locals = unknown_pleasures_locals()[..2].to_vec();
        let matched = evaluate_release(&locals, unknown_pleasures_release(), &config).unwrap();
        assert!(matched.distance.penalty_names().contains(&"missing_tracks"));
        assert!(matched.distance.distance() > 0.0);
    }

    #[test]
    fn extra_local_tracks_charge_the_unmatched_ratio() {
        let config = MatchConfig::default();
        let mut locals = unknown_pleasures_locals();
        locals.push(local_track(
            "Disorder (Live in Preston)",
            "Joy Division",
            "Unknown Pleasures",
            4,
            230.0,
        ));
        let matched = evaluate_release(&locals, unknown_pleasures_release(), &config).unwrap();
        assert!(matched
            .distance
            .penalty_names()
            .contains(&"unmatched_tracks"));
    }

    #[test]
    fn va_releases_skip_album_artist_and_judge_track_artists() {
        let config = MatchConfig::default();
        let mut locals = unknown_pleasures_locals();
        for track in &mut locals {
            track.artist = Some("Various Artists".into());
        }
        let mut release = unknown_pleasures_release();
        release.va = true;
        release.artist = Some("Various Artists".into());
        for (track, artist) in release.tracks.iter_mut().zip(["A", "B", "C"]) {
            track.artist = Some(artist.to_string());
        }

        let matched = evaluate_release(&locals, release, &config).unwrap();
        // Local placeholder artists cannot be judged, so no artist penalty
        // fires at either level.
        assert!(!matched.distance.penalty_names().contains(&"artist"));
        assert!(!matched.distance.penalty_names().contains(&"track_artist"));
    }

    #[test]
    fn remembered_release_id_anchors_the_match() {
        let config = MatchConfig::default();
        let mut locals = unknown_pleasures_locals();
        for track in &mut locals {
            track.release_id = Some("release-a".into());
        }
        let mut same = unknown_pleasures_release();
        same.release_id = Some("release-a".into());
        let mut other = unknown_pleasures_release();
        other.release_id = Some("release-b".into());

        let same = evaluate_release(&locals, same, &config).unwrap();
        let other = evaluate_release(&locals, other, &config).unwrap();
        assert_eq!(same.distance.distance(), 0.0);
        assert!(other.distance.penalty_names().contains(&"release_id"));
        assert!(other.distance.distance() > same.distance.distance());
    }

    #[test]
    fn evaluate_singleton_scores_track_dimensions() {
        let config = MatchConfig::default();
        let local = local_track("Atmosphere", "Joy Division", "", 1, 248.0);
        let candidate = CandidateTrack {
            artist: Some("Joy Division".into()),
            ..candidate_track("Atmosphere", 1, 249.0)
        };
        let matched = evaluate_singleton(&local, candidate, &config);
        assert_eq!(matched.distance.distance(), 0.0);
        assert_eq!(matched.total_distance(), 0.0);
    }

    #[test]
    fn rank_releases_orders_best_first_and_keeps_tied_input_order() {
        let config = MatchConfig::default();
        let mut locals = unknown_pleasures_locals();
        for track in &mut locals {
            track.year = Some(1979);
        }

        let good = unknown_pleasures_release();
        let mut tied_first = unknown_pleasures_release();
        tied_first.year = Some(1981);
        tied_first.release_id = Some("tie-1".into());
        let mut tied_second = unknown_pleasures_release();
        tied_second.year = Some(1981);
        tied_second.release_id = Some("tie-2".into());

        let ranked = rank_releases(
            &locals,
            vec![tied_first, good, tied_second],
            &config,
        )
        .unwrap();
        assert_eq!(ranked[0].distance.distance(), 0.0);
        assert_eq!(ranked[1].release.release_id.as_deref(), Some("tie-1"));
        assert_eq!(ranked[2].release.release_id.as_deref(), Some("tie-2"));
    }

    #[test]
    fn rank_singletons_orders_best_first() {
        let config = MatchConfig::default();
        let local = local_track("Atmosphere", "Joy Division", "", 1, 248.0);
        let close = candidate_track("Atmosphere", 1, 248.0);
        let far = candidate_track("Dead Souls", 1, 294.0);

        let ranked = rank_singletons(&local, vec![far, close], &config);
        assert_eq!(ranked[0].track.title.as_deref(), Some("Atmosphere"));
        assert!(ranked[0].total_distance() < ranked[1].total_distance());
    }

    #[test]
    fn evaluation_is_deterministic() {
        let config = MatchConfig::default();
        let locals = unknown_pleasures_locals();
        let first = evaluate_release(&locals, unknown_pleasures_release(), &config).unwrap();
        let second = evaluate_release(&locals, unknown_pleasures_release(), &config).unwrap();
        assert_eq!(first.distance, second.distance);
        assert_eq!(first.correspondence, second.correspondence);
    }
}
