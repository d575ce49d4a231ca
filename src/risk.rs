// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Aggregate risk scoring
//!
//! Event frequency and peak magnitude each contribute up to 40 points and the
//! two are added, so a swarm of moderate shocks can raise the verdict without
//! any single large event.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::event::ClassifiedEvent;
use crate::tier::RiskTier;
use crate::{QuakeGuardError, Result};

/// Highest reachable combined score
pub const MAX_SCORE: u32 = 80;

/// Message reported when there is nothing to score
pub const NO_ACTIVITY: &str = "No recent seismic activity";

/// Combined-score breakpoints, highest first
const VERDICT_BREAKPOINTS: [(u32, RiskTier); 4] = [
    (60, RiskTier::Extreme),
    (40, RiskTier::Severe),
    (25, RiskTier::High),
    (10, RiskTier::Moderate),
];

/// One row of the threshold table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierThreshold {
    pub count: usize,
    pub max_magnitude: f64,
}

/// Per-tier thresholds for event count and peak magnitude
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskThresholds {
    pub low: TierThreshold,
    pub moderate: TierThreshold,
    pub high: TierThreshold,
    pub severe: TierThreshold,
    pub extreme: TierThreshold,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            low: TierThreshold { count: 5, max_magnitude: 3.0 },
            moderate: TierThreshold { count: 10, max_magnitude: 4.5 },
            high: TierThreshold { count: 20, max_magnitude: 5.5 },
            severe: TierThreshold { count: 30, max_magnitude: 6.5 },
            extreme: TierThreshold { count: 50, max_magnitude: 7.0 },
        }
    }
}

impl RiskThresholds {
    pub fn row(&self, tier: RiskTier) -> TierThreshold {
        match tier {
            RiskTier::Low => self.low,
            RiskTier::Moderate => self.moderate,
            RiskTier::High => self.high,
            RiskTier::Severe => self.severe,
            RiskTier::Extreme => self.extreme,
        }
    }

    /// Both columns must be finite and strictly ascending from low to extreme
    pub fn validate(&self) -> Result<()> {
        for pair in RiskTier::ALL.windows(2) {
            let (lower, upper) = (self.row(pair[0]), self.row(pair[1]));
            if lower.count >= upper.count {
                return Err(QuakeGuardError::Config(format!(
                    "thresholds.{}.count ({}) must be below thresholds.{}.count ({})",
                    pair[0].key(), lower.count, pair[1].key(), upper.count
                )));
            }
            if !(lower.max_magnitude < upper.max_magnitude) {
                return Err(QuakeGuardError::Config(format!(
                    "thresholds.{}.max_magnitude ({}) must be below thresholds.{}.max_magnitude ({})",
                    pair[0].key(), lower.max_magnitude, pair[1].key(), upper.max_magnitude
                )));
            }
        }
        Ok(())
    }

    /// Points contributed by the number of events
    pub fn count_points(&self, count: usize) -> u32 {
        if count >= self.extreme.count {
            40
        } else if count >= self.severe.count {
            30
        } else if count >= self.high.count {
            20
        } else if count >= self.moderate.count {
            10
        } else {
            0
        }
    }

    /// Points contributed by the largest magnitude
    pub fn magnitude_points(&self, max_magnitude: f64) -> u32 {
        if max_magnitude >= self.extreme.max_magnitude {
            40
        } else if max_magnitude >= self.severe.max_magnitude {
            30
        } else if max_magnitude >= self.high.max_magnitude {
            20
        } else if max_magnitude >= self.moderate.max_magnitude {
            10
        } else {
            0
        }
    }

    /// Combined score for a count and peak magnitude
    pub fn score(&self, count: usize, max_magnitude: f64) -> u32 {
        (self.count_points(count) + self.magnitude_points(max_magnitude)).min(MAX_SCORE)
    }
}

/// Map a combined score onto a tier
pub fn verdict(score: u32) -> RiskTier {
    VERDICT_BREAKPOINTS
        .iter()
        .find(|(floor, _)| score >= *floor)
        .map(|(_, tier)| *tier)
        .unwrap_or(RiskTier::Low)
}

/// Overall assessment of a fetched window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub risk_score: u32,
    pub risk_level: RiskTier,
    pub count: usize,
    pub max_magnitude: Option<f64>,
    pub message: String,
    pub protocol: String,
}

impl RiskAssessment {
    /// Assessment for an empty or unusable window
    pub fn no_activity() -> Self {
        Self {
            risk_score: 0,
            risk_level: RiskTier::Low,
            count: 0,
            max_magnitude: None,
            message: NO_ACTIVITY.to_string(),
            protocol: RiskTier::Low.protocol().to_string(),
        }
    }
}

/// Score a set of classified events
pub fn assess(events: &[ClassifiedEvent], thresholds: &RiskThresholds) -> RiskAssessment {
    if events.is_empty() {
        return RiskAssessment::no_activity();
    }

    let max_magnitude = events
        .iter()
        .map(|e| e.event.magnitude)
        .filter(|m| m.is_finite())
        .fold(None, |acc: Option<f64>, m| Some(acc.map_or(m, |a| a.max(m))));

    let Some(max_magnitude) = max_magnitude else {
        warn!("No usable magnitudes among {} events, reporting no activity", events.len());
        return RiskAssessment::no_activity();
    };

    let count = events.len();
    let risk_score = thresholds.score(count, max_magnitude);
    let risk_level = verdict(risk_score);

    RiskAssessment {
        risk_score,
        risk_level,
        count,
        max_magnitude: Some(max_magnitude),
        message: format!("Risk Score: {}/{}", risk_score, MAX_SCORE),
        protocol: risk_level.protocol().to_string(),
    }
}
