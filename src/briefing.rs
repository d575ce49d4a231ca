// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Language-model briefing over a fetched window
//!
//! Talks to any OpenAI-compatible chat completions endpoint. The key comes
//! from [`LlmConfig`]; nothing here reads the environment.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::LlmConfig;
use crate::event::ClassifiedEvent;
use crate::patterns::PatternAnalysis;
use crate::risk::RiskAssessment;
use crate::{QuakeGuardError, Result};

const SYSTEM_PROMPT: &str = "You are an expert seismologist, emergency response specialist, \
    and public safety advisor. Provide detailed, accurate, and actionable information.";

/// Rows of event data included in the prompt
const PROMPT_ROWS: usize = 20;

/// Chat completions client
pub struct BriefingClient {
    client: Client,
    config: LlmConfig,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
    top_p: f32,
    presence_penalty: f32,
    frequency_penalty: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: String,
}

impl BriefingClient {
    /// Create a new briefing client
    pub fn new(config: LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    pub fn is_configured(&self) -> bool {
        self.config.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }

    /// Send one prompt and return the model's reply
    pub async fn complete(&self, prompt: &str) -> Result<String> {
        let key = match self.config.api_key.as_deref() {
            Some(k) if !k.trim().is_empty() => k,
            _ => return Err(QuakeGuardError::Llm("API key not configured".to_string())),
        };

        let url = format!("{}/chat/completions", self.config.url.trim_end_matches('/'));
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage { role: "system", content: SYSTEM_PROMPT },
                ChatMessage { role: "user", content: prompt },
            ],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            top_p: self.config.top_p,
            presence_penalty: 0.1,
            frequency_penalty: 0.1,
        };

        debug!("Sending briefing request: model={}", self.config.model);

        let response = self.client
            .post(&url)
            .bearer_auth(key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(QuakeGuardError::Llm(format!(
                "provider returned status {}",
                response.status()
            )));
        }

        let result: ChatResponse = response.json().await?;
        result
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| QuakeGuardError::Llm("empty completion".to_string()))
    }

    /// Briefing text for display; failures become a readable message
    pub async fn summarize(
        &self,
        events: &[ClassifiedEvent],
        assessment: &RiskAssessment,
        patterns: &PatternAnalysis,
        hours: u32,
    ) -> String {
        if !self.is_configured() {
            return "API key not configured".to_string();
        }
        if events.is_empty() {
            return "No earthquake data available for AI analysis".to_string();
        }

        let prompt = build_prompt(events, assessment, patterns, hours);
        match self.complete(&prompt).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Briefing failed: {}", e);
                format!("AI Analysis Error: {}", e)
            }
        }
    }
}

/// Prompt with summary statistics and the most recent events
pub fn build_prompt(
    events: &[ClassifiedEvent],
    assessment: &RiskAssessment,
    patterns: &PatternAnalysis,
    hours: u32,
) -> String {
    let mut prompt = String::from(
        "As an expert seismologist and emergency response specialist, provide a \
         comprehensive analysis of the following earthquake data:\n\nSUMMARY STATISTICS:\n",
    );

    let _ = writeln!(prompt, "- Total earthquakes: {}", events.len());
    let _ = writeln!(prompt, "- Time period: {} hours", hours);
    if let Some(stats) = &patterns.magnitude_stats {
        let _ = writeln!(prompt, "- Magnitude range: {:.1} - {:.1}", stats.min, stats.max);
        let _ = writeln!(prompt, "- Average magnitude: {:.2}", stats.mean);
    }
    let _ = writeln!(prompt, "- Risk level: {}", assessment.risk_level.key().to_uppercase());
    let _ = writeln!(prompt, "- Risk score: {}", assessment.message);

    prompt.push_str("\nEARTHQUAKE DATA:\ntime | place | magnitude | depth\n");
    for e in events.iter().take(PROMPT_ROWS) {
        let _ = writeln!(
            prompt,
            "{} | {} | {:.1} | {:.1}",
            e.event.time.format("%Y-%m-%d %H:%M:%S"),
            e.event.place,
            e.event.magnitude,
            e.event.depth
        );
    }

    prompt.push_str(
        "\nPlease provide:\n\
         1. **Risk Assessment**: Detailed evaluation of current seismic risk\n\
         2. **Pattern Analysis**: Identification of any concerning patterns or trends\n\
         3. **Regional Impact**: Specific implications for affected areas\n\
         4. **Safety Recommendations**: Detailed safety advice for the public\n\
         5. **Emergency Preparedness**: Specific actions people should take\n\
         6. **Monitoring Recommendations**: What to watch for in coming hours/days\n\n\
         Be thorough, specific, and actionable in your response.\n",
    );

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Event;
    use crate::patterns::analyze;
    use crate::risk::{assess, RiskThresholds};
    use chrono::{Duration, TimeZone, Utc};

    fn window(n: usize) -> Vec<ClassifiedEvent> {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        (0..n)
            .map(|i| {
                let e = Event::new(now - Duration::minutes(i as i64), format!("place {}", i), 4.0 + i as f64 * 0.1, 0.0, 0.0, 10.0);
                ClassifiedEvent::classify(e, now)
            })
            .collect()
    }

    #[test]
    fn test_prompt_truncates_rows() {
        let events = window(30);
        let assessment = assess(&events, &RiskThresholds::default());
        let prompt = build_prompt(&events, &assessment, &analyze(&events), 24);

        assert!(prompt.contains("- Total earthquakes: 30"));
        assert!(prompt.contains("- Time period: 24 hours"));
        assert!(prompt.contains("- Magnitude range: 4.0 - 6.9"));
        assert!(prompt.contains("place 19 |"));
        assert!(!prompt.contains("place 20 |"));
        assert!(prompt.contains("Risk Score: "));
    }

    #[tokio::test]
    async fn test_unconfigured_client_reports_missing_key() {
        let client = BriefingClient::new(LlmConfig::default()).unwrap();
        assert!(!client.is_configured());

        let events = window(3);
        let assessment = assess(&events, &RiskThresholds::default());
        let text = client.summarize(&events, &assessment, &analyze(&events), 24).await;
        assert_eq!(text, "API key not configured");
        assert!(client.complete("hi").await.is_err());
    }
}
