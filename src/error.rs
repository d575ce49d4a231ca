// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Error types for QuakeGuard

use thiserror::Error;

/// Result type alias for QuakeGuard operations
pub type Result<T> = std::result::Result<T, QuakeGuardError>;

/// QuakeGuard error types
#[derive(Error, Debug)]
pub enum QuakeGuardError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File system error: {0}")]
    FileSystem(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Catalog returned status {0}")]
    CatalogStatus(u16),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Unknown region: {0}")]
    UnknownRegion(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),

    #[error("Language model error: {0}")]
    Llm(String),
}
