use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::Deserialize;

use super::SearchProvider;
use crate::errors::ChatError;

const PROVIDER: &str = "serpapi";

/// Returned when the payload carries no usable answer field at all.
pub const NO_RESULT: &str = "No real-time results found.";

pub struct SerpApiClient {
    http: HttpClient,
    api_key: String,
    base_url: String,
    engine: String,
}

#[derive(Deserialize, Debug, Default)]
pub struct SearchResults {
    #[serde(default)]
    pub answer_box: Option<AnswerBox>,
    #[serde(default)]
    pub organic_results: Vec<OrganicResult>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct AnswerBox {
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub snippet: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct OrganicResult {
    #[serde(default)]
    pub snippet: Option<String>,
}

/// Extraction priority: direct answer, then answer-box snippet, then the
/// first organic result's snippet, then the sentinel.
pub fn extract_answer(results: &SearchResults) -> String {
    if let Some(answer_box) = &results.answer_box {
        if let Some(answer) = &answer_box.answer {
            return answer.clone();
        }
        if let Some(snippet) = &answer_box.snippet {
            return snippet.clone();
        }
    }
    if let Some(first) = results.organic_results.first() {
        if let Some(snippet) = &first.snippet {
            return snippet.clone();
        }
    }
    NO_RESULT.to_string()
}

impl SerpApiClient {
    pub fn new(api_key: String, base_url: String, engine: String) -> Self {
        Self {
            http: HttpClient::new(),
            api_key,
            base_url,
            engine,
        }
    }
}

#[async_trait]
impl SearchProvider for SerpApiClient {
    async fn search(&self, query: &str) -> Result<String, ChatError> {
        let url = format!("{}/search", self.base_url.trim_end_matches('/'));

        let resp = self.http
            .get(&url)
            .query(&[
                ("q", query),
                ("api_key", self.api_key.as_str()),
                ("engine", self.engine.as_str()),
            ])
            .send()
            .await
            .map_err(|e| ChatError::upstream(PROVIDER, e.status().map(|s| s.as_u16()), e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<SearchResults>(&body)
                .ok()
                .and_then(|r| r.error)
                .unwrap_or_else(|| format!("unexpected response: {}", body));
            return Err(ChatError::upstream(PROVIDER, Some(status.as_u16()), message));
        }

        let results = resp
            .json::<SearchResults>()
            .await
            .map_err(|e| ChatError::upstream(PROVIDER, None, format!("malformed search payload: {}", e)))?;

        // SerpAPI sometimes reports errors inside a 200 body.
        if let Some(error) = results.error {
            return Err(ChatError::upstream(PROVIDER, None, error));
        }

        Ok(extract_answer(&results))
    }
}
