// SPDX-License-Identifier: GPL-3.0-or-later

//! Per-dimension penalty policies.
//!
//! Each function judges one metadata dimension and returns a penalty value
//! in `[0.0, 1.0]`, or `None` when the dimension cannot be judged (usually
//! because the local side never recorded it). Callers pair the returned
//! value with the configured weight for the dimension and feed it into a
//! [`Distance`](crate::distance::Distance).

use quaver_domain::CandidateTrack;

use crate::similarity::{string_distance, string_distance_opt};

/// True for artist names that stand in for "no single artist": empty
/// strings and the usual various-artists placeholders.
pub fn is_various_artists(name: &str) -> bool {
    matches!(
        name.trim().to_lowercase().as_str(),
        "" | "various artists" | "various" | "va" | "unknown"
    )
}

/// Album title comparison. A candidate without an album title takes the
/// maximum penalty; a local side without one cannot be judged.
pub fn album_penalty(local: Option<&str>, candidate: Option<&str>) -> Option<f64> {
    let local = presence(local)?;
    match presence(candidate) {
        Some(candidate) => Some(string_distance(local, candidate)),
        None => Some(1.0),
    }
}

/// Album artist comparison. Skipped entirely for various-artists releases,
/// for placeholder artist names on either side, and when the local side has
/// no artist; a missing candidate artist on a single-artist release takes
/// the maximum penalty.
pub fn artist_penalty(
    local: Option<&str>,
    candidate: Option<&str>,
    candidate_is_va: bool,
) -> Option<f64> {
    if candidate_is_va {
        return None;
    }
    let local = presence(local)?;
    if is_various_artists(local) {
        return None;
    }
    match presence(candidate) {
        Some(candidate) if is_various_artists(candidate) => None,
        candidate => Some(string_distance_opt(Some(local), candidate)),
    }
}

/// Track artist comparison, judged only when both sides name a concrete
/// artist. Used on various-artists releases and for singletons, where the
/// per-track artist actually discriminates.
pub fn track_artist_penalty(local: Option<&str>, candidate: Option<&str>) -> Option<f64> {
    let candidate = presence(candidate)?;
    let local = presence(local)?;
    if is_various_artists(local) || is_various_artists(candidate) {
        return None;
    }
    Some(string_distance(local, candidate))
}

/// Release year comparison: exact is free, one year off costs half, more
/// costs everything.
pub fn year_penalty(local: Option<i32>, candidate: Option<i32>) -> Option<f64> {
    let local = local?;
    let candidate = candidate?;
    Some(match local.abs_diff(candidate) {
        0 => 0.0,
        1 => 0.5,
        _ => 1.0,
    })
}

/// Case-insensitive exact comparison for flag-like string fields (country,
/// label, media, catalog number). Judged only when both sides are present.
pub fn exact_match_penalty(local: Option<&str>, candidate: Option<&str>) -> Option<f64> {
    let local = presence(local)?;
    let candidate = presence(candidate)?;
    Some(if local.eq_ignore_ascii_case(candidate) {
        0.0
    } else {
        1.0
    })
}

/// Identifier comparison, judged only when the local side remembers an id
/// from a previous tagging run. Ids are opaque, so only exact equality
/// counts.
pub fn id_penalty(local: Option<&str>, candidate: Option<&str>) -> Option<f64> {
    let local = presence(local)?;
    Some(match presence(candidate) {
        Some(candidate) if candidate == local => 0.0,
        _ => 1.0,
    })
}

/// Track position comparison. The local track number matches when it equals
/// the candidate's absolute position, or its within-disc position when
/// per-disc numbering is configured or the release spans several discs
/// (tags written per-disc against a multi-disc release should not be
/// punished for the layout).
pub fn track_index_penalty(
    local_track: Option<u32>,
    candidate: &CandidateTrack,
    multi_disc: bool,
    per_disc_numbering: bool,
) -> Option<f64> {
    let local = local_track?;

    let mut judged = false;
    let mut matched = false;
    if let Some(index) = candidate.index {
        judged = true;
        matched |= local == index;
    }
    if per_disc_numbering || multi_disc {
        if let Some(medium_index) = candidate.medium_index {
            judged = true;
            matched |= local == medium_index;
        }
    }

    if !judged {
        return None;
    }
    Some(if matched { 0.0 } else { 1.0 })
}

/// Track duration comparison: differences inside the grace window are free,
/// beyond it the penalty ramps linearly over `max_secs` and caps at 1.0.
pub fn track_length_penalty(
    local_secs: Option<f64>,
    candidate_secs: Option<f64>,
    grace_secs: f64,
    max_secs: f64,
) -> Option<f64> {
    let local = local_secs?;
    let candidate = candidate_secs?;
    let overshoot = (local - candidate).abs() - grace_secs;
    if overshoot <= 0.0 {
        return Some(0.0);
    }
    if max_secs <= 0.0 {
        return Some(1.0);
    }
    Some((overshoot / max_secs).clamp(0.0, 1.0))
}

fn presence(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
