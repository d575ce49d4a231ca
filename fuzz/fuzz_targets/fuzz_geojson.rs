// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

#![no_main]

use libfuzzer_sys::fuzz_target;

use quakeguard::catalog::parse_feature_collection;
use quakeguard::event::classify_all;
use quakeguard::patterns::analyze;
use quakeguard::risk::{assess, RiskThresholds};

fuzz_target!(|data: &[u8]| {
    let Ok(body) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(events) = parse_feature_collection(body) {
        let classified = classify_all(events, chrono::Utc::now());
        let assessment = assess(&classified, &RiskThresholds::default());
        assert!(assessment.risk_score <= 80);
        let _ = analyze(&classified);
    }
});
