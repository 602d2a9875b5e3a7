// SPDX-License-Identifier: GPL-3.0-or-later

//! Core value objects for the quaver match engine.
//!
//! These types describe the two sides of a tagging decision: [`LocalTrack`]
//! carries the metadata observed on a user's files, while
//! [`CandidateRelease`] and [`CandidateTrack`] carry canonical metadata
//! retrieved from an external provider. Everything here is a plain record
//! with explicit optional fields; the matching machinery in `quaver-match`
//! consumes these values without mutating them.

use serde::{Deserialize, Serialize};

/// Data source name that needs no call-out in disambiguation strings.
pub const DEFAULT_DATA_SOURCE: &str = "MusicBrainz";

// ============================================================================
// Local (observed) metadata
// ============================================================================

/// Metadata observed on a single local audio file.
///
/// Every field is optional: tags on real files are incomplete, misspelled,
/// or absent, and the match engine degrades gracefully around the gaps. The
/// provider id fields are populated when the file has been tagged before
/// and remembers where its metadata came from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocalTrack {
    /// Track title as tagged.
    pub title: Option<String>,
    /// Track artist as tagged.
    pub artist: Option<String>,
    /// Album artist as tagged; wins over `artist` for album-level
    /// comparisons when every track agrees on it.
    pub album_artist: Option<String>,
    /// Album title as tagged.
    pub album: Option<String>,
    /// Track number as tagged. May be absolute or per-disc depending on
    /// whatever convention wrote the file.
    pub track: Option<u32>,
    /// Total track count as tagged.
    pub track_total: Option<u32>,
    /// Disc number as tagged.
    pub disc: Option<u32>,
    /// Total disc count as tagged.
    pub disc_total: Option<u32>,
    /// Title of the disc the track sits on, for multi-disc sets.
    pub disc_title: Option<String>,
    /// Duration in seconds.
    pub length_secs: Option<f64>,
    /// Release year as tagged.
    pub year: Option<i32>,
    /// Release country as tagged.
    pub country: Option<String>,
    /// Record label as tagged.
    pub label: Option<String>,
    /// Catalog number as tagged.
    pub catalog_number: Option<String>,
    /// Media the release was issued on ("CD", "Vinyl", ...).
    pub media: Option<String>,
    /// Provider release id remembered from a previous tagging run.
    pub release_id: Option<String>,
    /// Provider recording id remembered from a previous tagging run.
    pub recording_id: Option<String>,
}

impl LocalTrack {
    /// Creates a track carrying only a title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }
}

// ============================================================================
// Candidate (canonical) metadata
// ============================================================================

/// A track on a candidate release, as described by a metadata provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateTrack {
    /// Canonical track title.
    pub title: Option<String>,
    /// Track artist; usually only meaningful on various-artists releases.
    pub artist: Option<String>,
    /// Position across the whole release, starting at 1.
    pub index: Option<u32>,
    /// Disc the track appears on, starting at 1.
    pub medium: Option<u32>,
    /// Position within its disc, starting at 1.
    pub medium_index: Option<u32>,
    /// Number of tracks on the disc the track appears on.
    pub medium_total: Option<u32>,
    /// Duration in seconds.
    pub length_secs: Option<f64>,
    /// Provider id of the track as it appears on this release.
    pub release_track_id: Option<String>,
    /// Provider id of the underlying recording.
    pub recording_id: Option<String>,
}

impl CandidateTrack {
    /// Creates a candidate track carrying only a title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }
}

/// A complete release candidate fetched from a metadata provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateRelease {
    /// Album artist credited on the release.
    pub artist: Option<String>,
    /// Release title.
    pub album: Option<String>,
    /// Release year.
    pub year: Option<i32>,
    /// Release country code.
    pub country: Option<String>,
    /// Record label.
    pub label: Option<String>,
    /// Catalog number assigned by the label.
    pub catalog_number: Option<String>,
    /// Media format ("CD", "Vinyl", ...).
    pub media: Option<String>,
    /// Number of discs in the release.
    pub mediums: Option<u32>,
    /// Provider id of the release.
    pub release_id: Option<String>,
    /// Provider id of the release group the release belongs to.
    pub release_group_id: Option<String>,
    /// Provider-supplied text telling apart otherwise identical releases.
    pub disambiguation: Option<String>,
    /// Name of the provider the candidate came from.
    pub data_source: Option<String>,
    /// True when the release is credited to various artists rather than a
    /// single album artist.
    pub va: bool,
    /// Tracks on the release.
    pub tracks: Vec<CandidateTrack>,
}

impl CandidateRelease {
    /// Creates a release carrying only an album title.
    pub fn new(album: impl Into<String>) -> Self {
        Self {
            album: Some(album.into()),
            ..Self::default()
        }
    }

    /// Reorders `tracks` into canonical playback order: by disc, then by
    /// position within the disc, then by absolute position. Unnumbered
    /// tracks sort after numbered ones, keeping their relative order.
    pub fn sort_tracks(&mut self) {
        self.tracks.sort_by_key(|track| {
            (
                track.medium.unwrap_or(u32::MAX),
                track.medium_index.unwrap_or(u32::MAX),
                track.index.unwrap_or(u32::MAX),
            )
        });
    }

    /// Builds a short comma-joined context string for telling similar
    /// candidates apart: data source (when not the default provider), disc
    /// count with media, year, country, label, and the provider's own
    /// disambiguation text. Empty when nothing distinguishes the release.
    pub fn disambig_string(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        if let Some(source) = &self.data_source {
            if source != DEFAULT_DATA_SOURCE {
                parts.push(source.clone());
            }
        }
        if let Some(media) = &self.media {
            match self.mediums {
                Some(count) if count > 1 => parts.push(format!("{}x{}", count, media)),
                _ => parts.push(media.clone()),
            }
        }
        if let Some(year) = self.year {
            parts.push(year.to_string());
        }
        if let Some(country) = &self.country {
            parts.push(country.clone());
        }
        if let Some(label) = &self.label {
            parts.push(label.clone());
        }
        if let Some(disambiguation) = &self.disambiguation {
            if !disambiguation.is_empty() {
                parts.push(disambiguation.clone());
            }
        }
        parts.join(", ")
    }
}
