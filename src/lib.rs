// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! QuakeGuard: Seismic Risk Monitor
//!
//! Fetches recent earthquakes from a public catalog, classifies each event,
//! scores the window as a whole and serves the result as a web dashboard.

pub mod briefing;
pub mod catalog;
pub mod config;
pub mod error;
pub mod event;
pub mod export;
pub mod patterns;
pub mod risk;
pub mod tier;
pub mod web;

pub use config::AppConfig;
pub use error::{QuakeGuardError, Result};
