// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Descriptive pattern analysis over a fetched window
//!
//! Each statistic is independent. A statistic whose input is missing is left
//! as `None` and skipped on serialization, so callers must check presence.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::event::ClassifiedEvent;
use crate::tier::RiskTier;

const WEEKDAY_ORDER: [&str; 7] = [
    "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MagnitudeStats {
    pub mean: f64,
    pub median: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub std: Option<f64>,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepthStats {
    pub mean: f64,
    pub median: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub std: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoCenter {
    pub lat: f64,
    pub lon: f64,
}

/// Result of [`analyze`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatternAnalysis {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hourly_distribution: Option<BTreeMap<u32, usize>>,
    /// Day name and count, most active first
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily_distribution: Option<Vec<(String, usize)>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub magnitude_stats: Option<MagnitudeStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depth_stats: Option<DepthStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_distribution: Option<BTreeMap<RiskTier, usize>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geographic_center: Option<GeoCenter>,
}

impl PatternAnalysis {
    /// True when no statistic could be computed
    pub fn is_empty(&self) -> bool {
        self.hourly_distribution.is_none()
            && self.daily_distribution.is_none()
            && self.magnitude_stats.is_none()
            && self.depth_stats.is_none()
            && self.risk_distribution.is_none()
            && self.geographic_center.is_none()
    }
}

/// Summarize hourly/daily activity, magnitude and depth spread, tier mix and
/// the geographic centroid of `events`
pub fn analyze(events: &[ClassifiedEvent]) -> PatternAnalysis {
    if events.is_empty() {
        return PatternAnalysis::default();
    }

    let mut analysis = PatternAnalysis::default();

    let mut hourly = BTreeMap::new();
    for e in events {
        *hourly.entry(e.hour_of_day).or_insert(0) += 1;
    }
    analysis.hourly_distribution = Some(hourly);
    analysis.daily_distribution = Some(daily_distribution(events));

    let magnitudes = finite(events.iter().map(|e| e.event.magnitude));
    if let Some(summary) = Summary::of(&magnitudes) {
        analysis.magnitude_stats = Some(MagnitudeStats {
            mean: summary.mean,
            median: summary.median,
            std: summary.std,
            min: summary.min,
            max: summary.max,
        });
    }

    let depths = finite(events.iter().map(|e| e.event.depth));
    if let Some(summary) = Summary::of(&depths) {
        analysis.depth_stats = Some(DepthStats {
            mean: summary.mean,
            median: summary.median,
            std: summary.std,
        });
    }

    let mut tiers = BTreeMap::new();
    for e in events {
        *tiers.entry(e.risk_level).or_insert(0) += 1;
    }
    analysis.risk_distribution = Some(tiers);

    let points: Vec<(f64, f64)> = events
        .iter()
        .map(|e| (e.event.latitude, e.event.longitude))
        .filter(|(lat, lon)| lat.is_finite() && lon.is_finite())
        .collect();
    if points.len() >= 2 {
        let n = points.len() as f64;
        analysis.geographic_center = Some(GeoCenter {
            lat: points.iter().map(|p| p.0).sum::<f64>() / n,
            lon: points.iter().map(|p| p.1).sum::<f64>() / n,
        });
    }

    analysis
}

fn daily_distribution(events: &[ClassifiedEvent]) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for e in events {
        *counts.entry(e.day_of_week.as_str()).or_insert(0) += 1;
    }

    let rank = |day: &str| WEEKDAY_ORDER.iter().position(|d| *d == day).unwrap_or(WEEKDAY_ORDER.len());
    let mut days: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(day, count)| (day.to_string(), count))
        .collect();
    days.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| rank(a.0.as_str()).cmp(&rank(b.0.as_str()))));
    days
}

fn finite(values: impl Iterator<Item = f64>) -> Vec<f64> {
    values.filter(|v| v.is_finite()).collect()
}

struct Summary {
    mean: f64,
    median: f64,
    std: Option<f64>,
    min: f64,
    max: f64,
}

impl Summary {
    fn of(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let n = sorted.len();
        let mean = sorted.iter().sum::<f64>() / n as f64;
        let median = if n % 2 == 0 {
            (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
        } else {
            sorted[n / 2]
        };
        // Sample deviation, undefined for a single value
        let std = (n > 1).then(|| {
            let var = sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
            var.sqrt()
        });

        Some(Self {
            mean,
            median,
            std,
            min: sorted[0],
            max: sorted[n - 1],
        })
    }
}
