//! Gemini `generateContent` client.

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use vitalwatch_core::insight::{prompt, Insight, InsightCategory};
use vitalwatch_core::patient::VitalsSnapshot;

use super::{InsightError, InsightGenerator};

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-lite";
pub const DEFAULT_API_URL: &str = "https://generativelanguage.googleapis.com";

/// Text used when the model answers with an empty candidate list.
const EMPTY_TEXT_FALLBACK: &str = "Vitals monitored. Consult a doctor for detailed analysis.";

const SYSTEM_INSTRUCTION: &str = "You are a medical assistant for an elderly care monitoring dashboard. \
Your audience is the patient and their family caregivers. \
Keep responses concise (under 40 words), empathetic, and clear. \
Analyze the provided vitals (Heart Rate, BP, SpO2, Temperature) and give a specific health insight or recommendation. \
If vitals are normal, give positive reinforcement. \
If vitals are abnormal, suggest a safe, non-medical immediate action (e.g. \"Sit down\", \"Drink water\") and suggest checking with a doctor.";

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GenerateResponse {
    fn text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .filter_map(|p| p.text)
            .map(|t| t.trim().to_string())
            .find(|t| !t.is_empty())
    }
}

pub struct GeminiInsightGenerator {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl GeminiInsightGenerator {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: DEFAULT_API_URL.into(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_url.trim_end_matches('/'),
            self.model
        )
    }
}

#[async_trait]
impl InsightGenerator for GeminiInsightGenerator {
    async fn generate(&self, snapshot: &VitalsSnapshot) -> Result<Insight, InsightError> {
        let body = serde_json::json!({
            "systemInstruction": { "parts": [{ "text": SYSTEM_INSTRUCTION }] },
            "contents": [{ "parts": [{ "text": prompt(snapshot) }] }],
            "generationConfig": { "temperature": 0.7, "maxOutputTokens": 100 },
        });

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(InsightError::HttpStatus(response.status().as_u16()));
        }

        let parsed: GenerateResponse = response.json().await?;
        let content = parsed
            .text()
            .unwrap_or_else(|| EMPTY_TEXT_FALLBACK.to_string());

        Ok(Insight {
            category: InsightCategory::classify(snapshot.status, &content),
            content,
            timestamp: Utc::now(),
        })
    }
}
