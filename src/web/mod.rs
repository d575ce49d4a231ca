// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Web dashboard and JSON API

mod templates;

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Json, Response},
    routing::get,
    Router,
};
use chrono::{DateTime, Local, Utc};
use minijinja::{context, Environment};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};

use crate::briefing::BriefingClient;
use crate::catalog::{BoundingBox, EventQuery, EventSource};
use crate::config::AppConfig;
use crate::event::{classify_all, ClassifiedEvent, Event};
use crate::export::{export_file_name, to_csv_string, EventFilter};
use crate::patterns::{analyze, PatternAnalysis};
use crate::risk::{assess, RiskAssessment};
use crate::tier::{marker_style, RiskTier};
use crate::{QuakeGuardError, Result};

/// Last successful fetch, kept for the life of the process
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub query: EventQuery,
    pub fetched_at: DateTime<Utc>,
    pub events: Vec<Event>,
}

/// Shared application state
pub struct AppState {
    pub config: AppConfig,
    pub source: Box<dyn EventSource>,
    pub briefing: BriefingClient,
    templates: Environment<'static>,
    cache: Mutex<Option<Snapshot>>,
}

impl AppState {
    pub fn new(config: AppConfig, source: Box<dyn EventSource>) -> Result<Self> {
        let briefing = BriefingClient::new(config.llm.clone())?;
        Ok(Self {
            config,
            source,
            briefing,
            templates: templates::environment()?,
            cache: Mutex::new(None),
        })
    }

    /// Classified events for `query`, reusing the cached fetch when the query
    /// is unchanged. A failed fetch yields an empty window and is not cached.
    pub async fn window(&self, query: &EventQuery, refresh: bool) -> Window {
        if !refresh {
            let cache = self.cache.lock().await;
            if let Some(snapshot) = cache.as_ref().filter(|s| &s.query == query) {
                debug!("Serving {} cached events", snapshot.events.len());
                return Window::from_snapshot(snapshot);
            }
        }

        // The cache lock is not held across the fetch; concurrent misses may each fetch and the
        // last one to finish wins the cache.
        match self.source.fetch(query).await {
            Ok(events) => {
                let snapshot = Snapshot {
                    query: query.clone(),
                    fetched_at: Utc::now(),
                    events,
                };
                let window = Window::from_snapshot(&snapshot);
                *self.cache.lock().await = Some(snapshot);
                window
            }
            Err(e) => {
                error!("Fetch from {} failed: {}", self.source.name(), e);
                Window {
                    fetched_at: Utc::now(),
                    events: Vec::new(),
                }
            }
        }
    }
}

/// A classified window ready for rendering
pub struct Window {
    pub fetched_at: DateTime<Utc>,
    pub events: Vec<ClassifiedEvent>,
}

impl Window {
    fn from_snapshot(snapshot: &Snapshot) -> Self {
        Self {
            fetched_at: snapshot.fetched_at,
            events: classify_all(snapshot.events.clone(), Utc::now()),
        }
    }
}

/// Create the web application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index_page))
        .route("/api/events", get(api_events))
        .route("/api/assessment", get(api_assessment))
        .route("/api/patterns", get(api_patterns))
        .route("/api/export.csv", get(api_export))
        .route("/api/regions", get(api_regions))
        .route("/api/briefing", get(api_briefing))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// === Request parameters ===

#[derive(Debug, Default, Deserialize)]
pub struct WindowParams {
    min_magnitude: Option<f64>,
    hours: Option<u32>,
    region: Option<String>,
    detailed: Option<bool>,
    #[serde(default)]
    refresh: bool,
    /// Comma separated tier keys, e.g. `high,severe`
    risk: Option<String>,
    /// Comma separated magnitude category keys, e.g. `strong,major`
    magnitude: Option<String>,
}

impl WindowParams {
    fn to_query(&self, config: &AppConfig) -> Result<EventQuery> {
        let region = match self.region.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => Some(
                config
                    .lookup_region(name)
                    .ok_or_else(|| QuakeGuardError::UnknownRegion(name.to_string()))?,
            ),
            _ => None,
        };

        let query = EventQuery {
            min_magnitude: self.min_magnitude.unwrap_or(config.query.min_magnitude),
            hours: self.hours.unwrap_or(config.query.hours),
            region,
            limit: config.limit_for(self.detailed.unwrap_or(config.query.detailed)),
        };
        query.validate()?;
        Ok(query)
    }

    fn filter(&self) -> Result<EventFilter> {
        let split = |list: &Option<String>| -> Vec<String> {
            list.iter().flat_map(|l| l.split(',')).map(str::to_string).collect()
        };
        EventFilter::from_keys(split(&self.magnitude), split(&self.risk))
    }

    fn query_string(&self) -> String {
        let mut parts = Vec::new();
        if let Some(m) = self.min_magnitude {
            parts.push(format!("min_magnitude={}", m));
        }
        if let Some(h) = self.hours {
            parts.push(format!("hours={}", h));
        }
        if let Some(r) = self.region.as_deref().filter(|r| !r.trim().is_empty()) {
            parts.push(format!("region={}", r.trim().replace(' ', "+")));
        }
        parts.join("&")
    }
}

/// API error body
pub struct ApiError(QuakeGuardError);

impl From<QuakeGuardError> for ApiError {
    fn from(e: QuakeGuardError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            QuakeGuardError::InvalidQuery(_) | QuakeGuardError::UnknownRegion(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(serde_json::json!({ "error": self.0.to_string() }))).into_response()
    }
}

type ApiResult<T> = std::result::Result<T, ApiError>;

async fn load(state: &AppState, params: &WindowParams) -> ApiResult<(EventQuery, Window)> {
    let query = params.to_query(&state.config)?;
    let window = state.window(&query, params.refresh).await;
    Ok((query, window))
}

// === Page Handlers ===

#[derive(Serialize)]
struct EventRow<'a> {
    time: String,
    place: &'a str,
    url: Option<&'a str>,
    magnitude: String,
    depth: String,
    risk_level: &'static str,
    time_ago: &'a str,
    color: &'static str,
    radius: u8,
}

#[derive(Serialize)]
struct Metrics {
    max_magnitude: String,
    avg_magnitude: String,
    avg_depth: String,
}

#[derive(Serialize)]
struct FormView {
    region: String,
    min_magnitude: f64,
    hours: u32,
}

async fn index_page(
    State(state): State<Arc<AppState>>,
    Query(params): Query<WindowParams>,
) -> ApiResult<Html<String>> {
    let (query, window) = load(&state, &params).await?;
    let assessment = assess(&window.events, &state.config.thresholds);
    let patterns = analyze(&window.events);

    let html = render_index(&state.templates, &params, &query, &window, &assessment, &patterns)?;
    Ok(Html(html))
}

fn render_index(
    env: &Environment<'static>,
    params: &WindowParams,
    query: &EventQuery,
    window: &Window,
    assessment: &RiskAssessment,
    patterns: &PatternAnalysis,
) -> Result<String> {
    let rows: Vec<EventRow> = window
        .events
        .iter()
        .map(|c| {
            let style = marker_style(c.event.magnitude);
            EventRow {
                time: c.event.time.format("%Y-%m-%d %H:%M:%S").to_string(),
                place: &c.event.place,
                url: c.event.url.as_deref(),
                magnitude: format!("{:.1}", c.event.magnitude),
                depth: format!("{:.1}", c.event.depth),
                risk_level: c.risk_level.label(),
                time_ago: &c.time_ago,
                color: style.color,
                radius: style.radius,
            }
        })
        .collect();

    let metrics = Metrics {
        max_magnitude: patterns.magnitude_stats.as_ref().map_or("-".into(), |s| format!("{:.1}", s.max)),
        avg_magnitude: patterns.magnitude_stats.as_ref().map_or("-".into(), |s| format!("{:.2}", s.mean)),
        avg_depth: patterns.depth_stats.as_ref().map_or("-".into(), |s| format!("{:.1}", s.mean)),
    };

    let tiers: Vec<(&str, usize)> = patterns
        .risk_distribution
        .iter()
        .flatten()
        .map(|(tier, n)| (tier.label(), *n))
        .collect();
    let hourly: Vec<(u32, usize)> = patterns
        .hourly_distribution
        .iter()
        .flatten()
        .map(|(h, n)| (*h, *n))
        .collect();

    let form = FormView {
        region: params.region.clone().unwrap_or_default(),
        min_magnitude: query.min_magnitude,
        hours: query.hours,
    };

    let template = env.get_template("index.html")?;
    let html = template.render(context! {
        query => form,
        query_string => params.query_string(),
        fetched_at => window.fetched_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        count => window.events.len(),
        assessment => assessment,
        tier_name => assessment.risk_level.key().to_uppercase(),
        tier_color => assessment.risk_level.color(),
        monitoring => assessment.risk_level.requires_monitoring(),
        metrics => metrics,
        tiers => tiers,
        hourly => hourly,
        events => rows,
    })?;

    Ok(html)
}

// === API Handlers ===

async fn api_events(
    State(state): State<Arc<AppState>>,
    Query(params): Query<WindowParams>,
) -> ApiResult<Json<Vec<ClassifiedEvent>>> {
    let filter = params.filter()?;
    let (_, window) = load(&state, &params).await?;
    let events = window.events.into_iter().filter(|e| filter.matches(e)).collect();
    Ok(Json(events))
}

async fn api_assessment(
    State(state): State<Arc<AppState>>,
    Query(params): Query<WindowParams>,
) -> ApiResult<Json<RiskAssessment>> {
    let (_, window) = load(&state, &params).await?;
    Ok(Json(assess(&window.events, &state.config.thresholds)))
}

async fn api_patterns(
    State(state): State<Arc<AppState>>,
    Query(params): Query<WindowParams>,
) -> ApiResult<Json<PatternAnalysis>> {
    let (_, window) = load(&state, &params).await?;
    Ok(Json(analyze(&window.events)))
}

async fn api_export(
    State(state): State<Arc<AppState>>,
    Query(params): Query<WindowParams>,
) -> ApiResult<Response> {
    let filter = params.filter()?;
    let (_, window) = load(&state, &params).await?;
    let csv = to_csv_string(filter.apply(&window.events))?;

    let disposition = format!("attachment; filename=\"{}\"", export_file_name(Local::now()));
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        csv,
    )
        .into_response())
}

async fn api_regions(State(state): State<Arc<AppState>>) -> Json<BTreeMap<String, BoundingBox>> {
    Json(state.config.regions.clone())
}

#[derive(Serialize)]
struct BriefingResponse {
    risk_level: RiskTier,
    text: String,
}

async fn api_briefing(
    State(state): State<Arc<AppState>>,
    Query(params): Query<WindowParams>,
) -> ApiResult<Json<BriefingResponse>> {
    let (query, window) = load(&state, &params).await?;
    let assessment = assess(&window.events, &state.config.thresholds);
    let patterns = analyze(&window.events);
    let text = state
        .briefing
        .summarize(&window.events, &assessment, &patterns, query.hours)
        .await;

    Ok(Json(BriefingResponse {
        risk_level: assessment.risk_level,
        text,
    }))
}

/// Start the web server
pub async fn start_server(config: AppConfig, source: Box<dyn EventSource>) -> Result<()> {
    let addr = format!("{}:{}", config.web.host, config.web.port);
    let state = Arc::new(AppState::new(config, source)?);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Dashboard available at http://{}", addr);

    let router = create_router(state);
    axum::serve(listener, router).await
        .map_err(|e| QuakeGuardError::Config(format!("Server error: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use chrono::Duration;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;
    use tower::ServiceExt;

    struct FixedSource {
        events: Vec<Event>,
        calls: Arc<AtomicUsize>,
        fail: bool,
    }

    #[async_trait]
    impl EventSource for FixedSource {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn fetch(&self, _query: &EventQuery) -> Result<Vec<Event>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(QuakeGuardError::CatalogStatus(503));
            }
            Ok(self.events.clone())
        }
    }

    fn state_with(events: Vec<Event>, fail: bool) -> (Arc<AppState>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let source = FixedSource { events, calls: calls.clone(), fail };
        let state = AppState::new(AppConfig::default(), Box::new(source)).unwrap();
        (Arc::new(state), calls)
    }

    fn sample_events() -> Vec<Event> {
        let now = Utc::now();
        let mut events: Vec<Event> = (0..11)
            .map(|i| Event::new(now - Duration::minutes(i * 5), format!("swarm {}", i), 3.0, -118.0, 34.0, 8.0))
            .collect();
        events.push(Event::new(now - Duration::hours(2), "main shock", 5.8, -117.9, 34.1, 12.0));
        events
    }

    async fn get(router: Router, uri: &str) -> (StatusCode, String) {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_assessment_endpoint() {
        let (state, _) = state_with(sample_events(), false);
        let (status, body) = get(create_router(state), "/api/assessment").await;

        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["risk_score"], 30);
        assert_eq!(json["risk_level"], "high");
        assert_eq!(json["count"], 12);
    }

    #[tokio::test]
    async fn test_cache_reused_until_refresh() {
        let (state, calls) = state_with(sample_events(), false);

        get(create_router(state.clone()), "/api/events").await;
        get(create_router(state.clone()), "/api/patterns").await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        get(create_router(state.clone()), "/api/events?refresh=true").await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        get(create_router(state), "/api/events?hours=48").await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_failed_fetch_is_empty_and_not_cached() {
        let (state, calls) = state_with(Vec::new(), true);

        let (status, body) = get(create_router(state.clone()), "/api/assessment").await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["risk_level"], "low");
        assert_eq!(json["message"], "No recent seismic activity");

        get(create_router(state), "/api/assessment").await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_unknown_region_is_bad_request() {
        let (state, calls) = state_with(sample_events(), false);
        let (status, body) = get(create_router(state), "/api/events?region=Atlantis").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("Atlantis"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_risk_filter() {
        let (state, _) = state_with(sample_events(), false);
        let (_, body) = get(create_router(state), "/api/events?risk=high,severe").await;

        let events: Vec<serde_json::Value> = serde_json::from_str(&body).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0]["place"], "main shock");
    }

    #[tokio::test]
    async fn test_magnitude_category_filter() {
        let (state, _) = state_with(sample_events(), false);

        let (_, body) = get(create_router(state.clone()), "/api/events?magnitude=moderate").await;
        let events: Vec<serde_json::Value> = serde_json::from_str(&body).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0]["place"], "main shock");

        let (_, body) = get(create_router(state.clone()), "/api/events?magnitude=strong,major").await;
        let events: Vec<serde_json::Value> = serde_json::from_str(&body).unwrap();
        assert!(events.is_empty());

        let (status, _) = get(create_router(state), "/api/events?magnitude=enormous").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_csv_export_magnitude_filter() {
        let (state, _) = state_with(sample_events(), false);
        let (status, body) = get(create_router(state), "/api/export.csv?magnitude=minor").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.lines().count(), 12);
        assert!(!body.contains("main shock"));
    }

    #[tokio::test]
    async fn test_oversized_lookback_is_bad_request() {
        let (state, calls) = state_with(sample_events(), false);
        let (status, _) = get(create_router(state), "/?hours=4294967295").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    struct GatedSource {
        release: Arc<Notify>,
    }

    #[async_trait]
    impl EventSource for GatedSource {
        fn name(&self) -> &str {
            "gated"
        }

        async fn fetch(&self, query: &EventQuery) -> Result<Vec<Event>> {
            if query.hours == 48 {
                self.release.notified().await;
            }
            Ok(sample_events())
        }
    }

    #[tokio::test]
    async fn test_slow_fetch_does_not_block_cache_hits() {
        let release = Arc::new(Notify::new());
        let source = GatedSource { release: release.clone() };
        let state = Arc::new(AppState::new(AppConfig::default(), Box::new(source)).unwrap());

        get(create_router(state.clone()), "/api/events").await;

        let slow = tokio::spawn(get(create_router(state.clone()), "/api/events?hours=48"));
        tokio::task::yield_now().await;

        let cached = tokio::time::timeout(
            std::time::Duration::from_secs(2),
            get(create_router(state), "/api/assessment"),
        )
        .await;
        assert!(cached.is_ok());

        release.notify_one();
        let (status, _) = slow.await.unwrap();
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_csv_export() {
        let (state, _) = state_with(sample_events(), false);
        let (status, body) = get(create_router(state), "/api/export.csv").await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.starts_with("time,place,magnitude"));
        assert_eq!(body.lines().count(), 13);
    }

    #[tokio::test]
    async fn test_dashboard_renders() {
        let (state, _) = state_with(sample_events(), false);
        let (status, body) = get(create_router(state), "/?region=california").await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Current Risk Level: HIGH"));
        assert!(body.contains("Risk Score:</strong> 30/80"));
        assert!(!body.contains("Risk Score: Risk Score"));
        assert!(body.contains("main shock"));
        assert!(body.contains("Monitoring Required:</strong> Yes"));
    }

    #[tokio::test]
    async fn test_dashboard_renders_empty_window() {
        let (state, _) = state_with(Vec::new(), false);
        let (status, body) = get(create_router(state), "/").await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Current Risk Level: LOW"));
        assert!(body.contains("No recent earthquakes found"));
    }

    #[tokio::test]
    async fn test_briefing_without_key() {
        let (state, _) = state_with(sample_events(), false);
        let (_, body) = get(create_router(state), "/api/briefing").await;
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["text"], "API key not configured");
    }
}
