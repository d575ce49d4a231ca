// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Severity tiers and per-event classification
//!
//! Every bucket here uses inclusive lower bounds: a value sitting exactly on a
//! breakpoint belongs to the higher bucket.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::QuakeGuardError;

/// Ordered severity tier shared by per-event and aggregate classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTier {
    Low,
    Moderate,
    High,
    Severe,
    Extreme,
}

impl RiskTier {
    /// All tiers in ascending order
    pub const ALL: [RiskTier; 5] = [
        RiskTier::Low,
        RiskTier::Moderate,
        RiskTier::High,
        RiskTier::Severe,
        RiskTier::Extreme,
    ];

    /// Lower-case key used in configuration and JSON
    pub fn key(self) -> &'static str {
        match self {
            RiskTier::Low => "low",
            RiskTier::Moderate => "moderate",
            RiskTier::High => "high",
            RiskTier::Severe => "severe",
            RiskTier::Extreme => "extreme",
        }
    }

    /// Capitalised label used in tables and exports
    pub fn label(self) -> &'static str {
        match self {
            RiskTier::Low => "Low",
            RiskTier::Moderate => "Moderate",
            RiskTier::High => "High",
            RiskTier::Severe => "Severe",
            RiskTier::Extreme => "Extreme",
        }
    }

    /// Recommended public action for this tier
    pub fn protocol(self) -> &'static str {
        match self {
            RiskTier::Low => "Monitor situation. No immediate action required.",
            RiskTier::Moderate => "Stay alert. Review emergency plans.",
            RiskTier::High => "Prepare emergency kit. Stay informed.",
            RiskTier::Severe => "Follow evacuation orders if issued. Seek shelter.",
            RiskTier::Extreme => "IMMEDIATE EVACUATION. Follow emergency services.",
        }
    }

    /// Display color for charts and badges
    pub fn color(self) -> &'static str {
        match self {
            RiskTier::Low => "#00ff00",
            RiskTier::Moderate => "#ffff00",
            RiskTier::High => "#ff8000",
            RiskTier::Severe => "#ff0000",
            RiskTier::Extreme => "#800000",
        }
    }

    /// Whether the tier calls for active monitoring
    pub fn requires_monitoring(self) -> bool {
        self >= RiskTier::High
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

impl FromStr for RiskTier {
    type Err = QuakeGuardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RiskTier::ALL
            .into_iter()
            .find(|t| t.key().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| QuakeGuardError::InvalidQuery(format!("unknown risk tier '{}'", s)))
    }
}

/// Descriptive magnitude bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MagnitudeCategory {
    Minor,
    Light,
    Moderate,
    Strong,
    Major,
}

impl MagnitudeCategory {
    pub const ALL: [MagnitudeCategory; 5] = [
        MagnitudeCategory::Minor,
        MagnitudeCategory::Light,
        MagnitudeCategory::Moderate,
        MagnitudeCategory::Strong,
        MagnitudeCategory::Major,
    ];

    pub fn key(self) -> &'static str {
        match self {
            MagnitudeCategory::Minor => "minor",
            MagnitudeCategory::Light => "light",
            MagnitudeCategory::Moderate => "moderate",
            MagnitudeCategory::Strong => "strong",
            MagnitudeCategory::Major => "major",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MagnitudeCategory::Minor => "Minor (<4.0)",
            MagnitudeCategory::Light => "Light (4.0-4.9)",
            MagnitudeCategory::Moderate => "Moderate (5.0-5.9)",
            MagnitudeCategory::Strong => "Strong (6.0-6.9)",
            MagnitudeCategory::Major => "Major (≥7.0)",
        }
    }
}

impl fmt::Display for MagnitudeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

impl FromStr for MagnitudeCategory {
    type Err = QuakeGuardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MagnitudeCategory::ALL
            .into_iter()
            .find(|c| c.key().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| QuakeGuardError::InvalidQuery(format!("unknown magnitude category '{}'", s)))
    }
}

/// Focal depth bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DepthCategory {
    Shallow,
    Intermediate,
    Deep,
}

impl DepthCategory {
    pub fn label(self) -> &'static str {
        match self {
            DepthCategory::Shallow => "Shallow (<70km)",
            DepthCategory::Intermediate => "Intermediate (70-300km)",
            DepthCategory::Deep => "Deep (>300km)",
        }
    }
}

impl fmt::Display for DepthCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

/// Map marker style for an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MarkerStyle {
    pub color: &'static str,
    pub radius: u8,
}

/// Classify a single event's magnitude into a risk tier
pub fn classify_magnitude(magnitude: f64) -> RiskTier {
    if magnitude >= 7.0 {
        RiskTier::Extreme
    } else if magnitude >= 6.0 {
        RiskTier::Severe
    } else if magnitude >= 5.0 {
        RiskTier::High
    } else if magnitude >= 4.0 {
        RiskTier::Moderate
    } else {
        RiskTier::Low
    }
}

/// Bucket a magnitude into its descriptive category
pub fn categorize_magnitude(magnitude: f64) -> MagnitudeCategory {
    match classify_magnitude(magnitude) {
        RiskTier::Low => MagnitudeCategory::Minor,
        RiskTier::Moderate => MagnitudeCategory::Light,
        RiskTier::High => MagnitudeCategory::Moderate,
        RiskTier::Severe => MagnitudeCategory::Strong,
        RiskTier::Extreme => MagnitudeCategory::Major,
    }
}

/// Bucket a focal depth (km)
pub fn classify_depth(depth_km: f64) -> DepthCategory {
    if depth_km >= 300.0 {
        DepthCategory::Deep
    } else if depth_km >= 70.0 {
        DepthCategory::Intermediate
    } else {
        DepthCategory::Shallow
    }
}

/// Marker color and radius by magnitude
pub fn marker_style(magnitude: f64) -> MarkerStyle {
    let (color, radius) = if magnitude >= 6.0 {
        ("red", 15)
    } else if magnitude >= 5.0 {
        ("orange", 12)
    } else if magnitude >= 4.0 {
        ("yellow", 10)
    } else {
        ("green", 8)
    };
    MarkerStyle { color, radius }
}

/// Human readable age of an event, floored to the largest whole unit
pub fn recency_string(event_time: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff = now.signed_duration_since(event_time);

    let days = diff.num_days();
    if days > 0 {
        return format!("{} day(s) ago", days);
    }
    let hours = diff.num_hours();
    if hours > 0 {
        return format!("{} hour(s) ago", hours);
    }
    let minutes = diff.num_minutes();
    if minutes > 0 {
        return format!("{} minute(s) ago", minutes);
    }
    "Just now".to_string()
}
