// SPDX-License-Identifier: GPL-3.0-or-later
use std::path::Path;

use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Weight of each distance dimension. A dimension's weight scales how much
/// its penalty contributes relative to the other dimensions that fired.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistanceWeights {
    pub artist: f64,
    pub album: f64,
    pub release_id: f64,
    pub media: f64,
    pub mediums: f64,
    pub year: f64,
    pub country: f64,
    pub label: f64,
    pub catalog_number: f64,
    pub missing_tracks: f64,
    pub unmatched_tracks: f64,
    pub track_title: f64,
    pub track_artist: f64,
    pub track_index: f64,
    pub track_length: f64,
    pub track_id: f64,
}

impl Default for DistanceWeights {
    fn default() -> Self {
        Self {
            artist: 3.0,
            album: 3.0,
            release_id: 5.0,
            media: 1.0,
            mediums: 1.0,
            year: 1.0,
            country: 0.5,
            label: 0.5,
            catalog_number: 0.5,
            missing_tracks: 0.9,
            unmatched_tracks: 0.6,
            track_title: 3.0,
            track_artist: 2.0,
            track_index: 1.0,
            track_length: 2.0,
            track_id: 5.0,
        }
    }
}

/// Distance cutoffs for the recommendation ladder, plus the separation
/// margin below which a runner-up makes the result ambiguous.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationConfig {
    pub strong_threshold: f64,
    pub medium_threshold: f64,
    pub low_threshold: f64,
    pub gap_margin: f64,
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            strong_threshold: 0.04,
            medium_threshold: 0.25,
            low_threshold: 0.40,
            gap_margin: 0.25,
        }
    }
}

/// Tunables for the match engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchConfig {
    pub weights: DistanceWeights,
    pub recommendation: RecommendationConfig,
    /// Track length differences up to this many seconds carry no penalty.
    pub track_length_grace_secs: f64,
    /// Track length differences reaching grace plus this many seconds carry
    /// the maximum penalty; the ramp between is linear.
    pub track_length_max_secs: f64,
    /// Compare local track numbers against per-disc positions instead of
    /// absolute release positions.
    pub per_disc_numbering: bool,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            weights: DistanceWeights::default(),
            recommendation: RecommendationConfig::default(),
            track_length_grace_secs: 10.0,
            track_length_max_secs: 30.0,
            per_disc_numbering: false,
        }
    }
}

/// Load configuration from defaults, optional TOML file, and environment overrides (prefix: QUAVER_).
pub fn load(config_path: Option<&Path>) -> Result<MatchConfig> {
    let mut figment = Figment::from(Serialized::defaults(MatchConfig::default()));

    if let Some(path) = config_path {
        figment = figment.merge(Toml::file(path));
    }

    figment = figment.merge(Env::prefixed("QUAVER_").split("__"));

    let config: MatchConfig = figment.extract()?;
    info!(target: "config", "configuration loaded");
    Ok(config)
}
