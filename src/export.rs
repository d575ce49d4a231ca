// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Delimited-text export of classified events

use chrono::{DateTime, Local, SecondsFormat};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::str::FromStr;

use crate::event::ClassifiedEvent;
use crate::tier::{MagnitudeCategory, RiskTier};
use crate::{QuakeGuardError, Result};

/// Narrow a window down to selected categories and tiers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventFilter {
    /// Keep only these magnitude categories (all when `None`)
    #[serde(default)]
    pub magnitude_categories: Option<Vec<MagnitudeCategory>>,
    /// Keep only these risk tiers (all when `None`)
    #[serde(default)]
    pub risk_levels: Option<Vec<RiskTier>>,
}

impl EventFilter {
    /// Build a filter from category and tier keys; an empty list means "all"
    pub fn from_keys<M, R>(magnitudes: M, risks: R) -> Result<Self>
    where
        M: IntoIterator,
        M::Item: AsRef<str>,
        R: IntoIterator,
        R::Item: AsRef<str>,
    {
        Ok(Self {
            magnitude_categories: parse_keys(magnitudes)?,
            risk_levels: parse_keys(risks)?,
        })
    }

    pub fn matches(&self, event: &ClassifiedEvent) -> bool {
        let category_ok = self
            .magnitude_categories
            .as_ref()
            .map_or(true, |c| c.contains(&event.magnitude_category));
        let tier_ok = self
            .risk_levels
            .as_ref()
            .map_or(true, |t| t.contains(&event.risk_level));
        category_ok && tier_ok
    }

    pub fn apply<'a>(&self, events: &'a [ClassifiedEvent]) -> Vec<&'a ClassifiedEvent> {
        events.iter().filter(|e| self.matches(e)).collect()
    }
}

fn parse_keys<T, I>(keys: I) -> Result<Option<Vec<T>>>
where
    T: FromStr<Err = QuakeGuardError>,
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let parsed = keys
        .into_iter()
        .filter(|k| !k.as_ref().trim().is_empty())
        .map(|k| k.as_ref().parse())
        .collect::<Result<Vec<T>>>()?;
    Ok(if parsed.is_empty() { None } else { Some(parsed) })
}

#[derive(Serialize)]
struct CsvRow<'a> {
    time: String,
    place: &'a str,
    magnitude: f64,
    longitude: f64,
    latitude: f64,
    depth: f64,
    url: &'a str,
    tsunami: bool,
    significance: Option<u32>,
    felt: Option<u32>,
    alert: &'a str,
    status: &'a str,
    #[serde(rename = "type")]
    kind: &'a str,
    risk_level: &'static str,
    time_ago: &'a str,
    magnitude_category: &'static str,
    depth_category: &'static str,
    hour_of_day: u32,
    day_of_week: &'a str,
}

impl<'a> From<&'a ClassifiedEvent> for CsvRow<'a> {
    fn from(c: &'a ClassifiedEvent) -> Self {
        let e = &c.event;
        Self {
            time: e.time.to_rfc3339_opts(SecondsFormat::Secs, true),
            place: &e.place,
            magnitude: e.magnitude,
            longitude: e.longitude,
            latitude: e.latitude,
            depth: e.depth,
            url: e.url.as_deref().unwrap_or(""),
            tsunami: e.tsunami,
            significance: e.significance,
            felt: e.felt,
            alert: e.alert.as_deref().unwrap_or(""),
            status: e.status.as_deref().unwrap_or(""),
            kind: e.kind.as_deref().unwrap_or(""),
            risk_level: c.risk_level.label(),
            time_ago: &c.time_ago,
            magnitude_category: c.magnitude_category.label(),
            depth_category: c.depth_category.label(),
            hour_of_day: c.hour_of_day,
            day_of_week: &c.day_of_week,
        }
    }
}

/// Write a header and one row per event
pub fn write_csv<'a, W, I>(events: I, writer: W) -> Result<()>
where
    W: Write,
    I: IntoIterator<Item = &'a ClassifiedEvent>,
{
    let mut wtr = csv::Writer::from_writer(writer);
    let mut wrote_any = false;

    for event in events {
        wtr.serialize(CsvRow::from(event))?;
        wrote_any = true;
    }

    // serde-driven headers only appear with the first row
    if !wrote_any {
        wtr.write_record(HEADERS)?;
    }

    wtr.flush()?;
    Ok(())
}

/// Render events as a CSV string
pub fn to_csv_string<'a, I>(events: I) -> Result<String>
where
    I: IntoIterator<Item = &'a ClassifiedEvent>,
{
    let mut buf = Vec::new();
    write_csv(events, &mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Default download name, e.g. `earthquakes_20250301_120000.csv`
pub fn export_file_name(at: DateTime<Local>) -> String {
    format!("earthquakes_{}.csv", at.format("%Y%m%d_%H%M%S"))
}

const HEADERS: [&str; 19] = [
    "time",
    "place",
    "magnitude",
    "longitude",
    "latitude",
    "depth",
    "url",
    "tsunami",
    "significance",
    "felt",
    "alert",
    "status",
    "type",
    "risk_level",
    "time_ago",
    "magnitude_category",
    "depth_category",
    "hour_of_day",
    "day_of_week",
];
