// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Seismic event records

use chrono::{DateTime, Datelike, Timelike, Utc, Weekday};
use serde::{Deserialize, Serialize};

use crate::tier::{
    categorize_magnitude, classify_depth, classify_magnitude, recency_string, DepthCategory,
    MagnitudeCategory, RiskTier,
};

/// A single catalog reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub time: DateTime<Utc>,
    pub place: String,
    pub magnitude: f64,
    pub longitude: f64,
    pub latitude: f64,
    /// Focal depth in km
    pub depth: f64,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub tsunami: bool,
    #[serde(default)]
    pub significance: Option<u32>,
    #[serde(default)]
    pub felt: Option<u32>,
    #[serde(default)]
    pub alert: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

impl Event {
    /// Minimal event with only the required catalog fields
    pub fn new(
        time: DateTime<Utc>,
        place: impl Into<String>,
        magnitude: f64,
        longitude: f64,
        latitude: f64,
        depth: f64,
    ) -> Self {
        Self {
            time,
            place: place.into(),
            magnitude,
            longitude,
            latitude,
            depth,
            url: None,
            tsunami: false,
            significance: None,
            felt: None,
            alert: None,
            status: None,
            kind: None,
        }
    }
}

/// An event annotated with its derived fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedEvent {
    #[serde(flatten)]
    pub event: Event,
    pub risk_level: RiskTier,
    pub time_ago: String,
    pub magnitude_category: MagnitudeCategory,
    pub depth_category: DepthCategory,
    pub hour_of_day: u32,
    pub day_of_week: String,
}

impl ClassifiedEvent {
    /// Derive every annotation for `event` relative to `now`
    pub fn classify(event: Event, now: DateTime<Utc>) -> Self {
        Self {
            risk_level: classify_magnitude(event.magnitude),
            time_ago: recency_string(event.time, now),
            magnitude_category: categorize_magnitude(event.magnitude),
            depth_category: classify_depth(event.depth),
            hour_of_day: event.time.hour(),
            day_of_week: weekday_name(event.time.weekday()).to_string(),
            event,
        }
    }
}

/// Classify a whole fetch, preserving order
pub fn classify_all(events: Vec<Event>, now: DateTime<Utc>) -> Vec<ClassifiedEvent> {
    events
        .into_iter()
        .map(|e| ClassifiedEvent::classify(e, now))
        .collect()
}

/// Full English day name
pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}
