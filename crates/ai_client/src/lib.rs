pub mod analysis;
pub mod prompt;

use anyhow::{anyhow, Context, Result};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Url;
use serde::{Deserialize, Serialize};

use models::AnalysisPayload;

pub use analysis::{
    parse_analysis, AnalysisError, AnalysisReport, Diagnosis, Recommendation, Scenario, Simulation,
};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Configuration for the Gemini `generateContent` endpoint.
#[derive(Debug, Clone)]
pub struct GeminiClientConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: String,
}

impl GeminiClientConfig {
    /// Loads config from env vars:
    /// - `GEMINI_API_KEY`  (required)
    /// - `GEMINI_MODEL`    (default: `gemini-2.5-flash`)
    /// - `GEMINI_BASE_URL` (default: `https://generativelanguage.googleapis.com`)
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| anyhow!("GEMINI_API_KEY is not set"))?;
        let base_url =
            std::env::var("GEMINI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let model = std::env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        Ok(Self {
            base_url,
            model,
            api_key,
        })
    }
}

/// A grounding source returned alongside the generated text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Source {
    pub uri: String,
    pub title: Option<String>,
}

/// Raw model output: concatenated text plus web sources.
#[derive(Debug, Clone, Default)]
pub struct Generation {
    pub text: String,
    pub sources: Vec<Source>,
}

/// Parsed analysis together with the sources the model searched.
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub report: AnalysisReport,
    pub sources: Vec<Source>,
}

/// Minimal Gemini client (blocking HTTP) with Google Search grounding.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: Client,
    base_url: Url,
    model: String,
}

impl GeminiClient {
    pub fn new(config: GeminiClientConfig) -> Result<Self> {
        let base_url = validate_base_url(&config.base_url)?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let mut key = HeaderValue::from_str(config.api_key.trim())
            .context("GEMINI_API_KEY contains characters not allowed in a header")?;
        key.set_sensitive(true);
        headers.insert("x-goog-api-key", key);

        let http = Client::builder()
            .default_headers(headers)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url,
            model: config.model,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Single-turn generation with web search enabled.
    pub fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<Generation> {
        let endpoint = self
            .base_url
            .join(&format!("v1beta/models/{}:generateContent", self.model))
            .context("Failed to build generateContent URL")?;

        let request = GenerateContentRequest::new(system_prompt, user_prompt);

        tracing::info!(model = %self.model, "requesting analysis");
        let response: GenerateContentResponse = self
            .http
            .post(endpoint.clone())
            .json(&request)
            .send()
            .with_context(|| format!("POST {endpoint} failed"))?
            .error_for_status()
            .with_context(|| format!("POST {endpoint} returned non-success status"))?
            .json()
            .with_context(|| format!("Failed to parse JSON response from {endpoint}"))?;

        let generation = response.into_generation();
        tracing::debug!(
            chars = generation.text.len(),
            sources = generation.sources.len(),
            "analysis received"
        );
        Ok(generation)
    }

    /// Sends the payload with the advisor prompts and parses the answer.
    pub fn analyze(&self, payload: &AnalysisPayload) -> Result<Analysis> {
        let user_prompt = prompt::build_user_prompt(payload)?;
        let generation = self.generate(prompt::SYSTEM_PROMPT, &user_prompt)?;
        let report = parse_analysis(&generation.text)?;
        Ok(Analysis {
            report,
            sources: generation.sources,
        })
    }
}

fn validate_base_url(base_url: &str) -> Result<Url> {
    let mut url =
        Url::parse(base_url).with_context(|| format!("Invalid GEMINI_BASE_URL: {base_url}"))?;

    let host = url
        .host_str()
        .ok_or_else(|| anyhow!("GEMINI_BASE_URL is missing a host"))?;
    let is_local = host.eq_ignore_ascii_case("localhost") || host == "127.0.0.1" || host == "[::1]";

    match url.scheme() {
        "https" => {}
        "http" if is_local => {}
        other => {
            return Err(anyhow!(
                "Unsupported scheme '{other}' for GEMINI_BASE_URL (https is required for non-local hosts)"
            ))
        }
    }

    // `join` replaces the last segment unless the path ends in a slash.
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Ok(url)
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct GoogleSearch {}

#[derive(Debug, Serialize)]
struct Tool {
    google_search: GoogleSearch,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    system_instruction: Content,
    contents: Vec<Content>,
    tools: Vec<Tool>,
}

impl GenerateContentRequest {
    fn new(system_prompt: &str, user_prompt: &str) -> Self {
        Self {
            system_instruction: Content {
                role: None,
                parts: vec![Part {
                    text: Some(system_prompt.to_string()),
                }],
            },
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(user_prompt.to_string()),
                }],
            }],
            tools: vec![Tool {
                google_search: GoogleSearch {},
            }],
        }
    }
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Deserialize)]
struct GroundingChunk {
    web: Option<WebChunk>,
}

#[derive(Debug, Deserialize)]
struct WebChunk {
    uri: Option<String>,
    title: Option<String>,
}

impl GenerateContentResponse {
    fn into_generation(self) -> Generation {
        let Some(candidate) = self.candidates.into_iter().next() else {
            return Generation::default();
        };

        let text = candidate
            .content
            .map(|c| {
                c.parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        let sources = candidate
            .grounding_metadata
            .map(|m| {
                m.grounding_chunks
                    .into_iter()
                    .filter_map(|chunk| chunk.web)
                    .filter_map(|web| {
                        let uri = web.uri.filter(|u| !u.is_empty())?;
                        Some(Source {
                            uri,
                            title: web.title.filter(|t| !t.is_empty()),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        Generation {
            text: text.trim().to_string(),
            sources,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_validate_base_url() {
        let url = validate_base_url("https://generativelanguage.googleapis.com").unwrap();
        let endpoint = url
            .join("v1beta/models/gemini-2.5-flash:generateContent")
            .unwrap();
        assert_eq!(
            endpoint.as_str(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent"
        );

        let proxied = validate_base_url("https://proxy.example.com/gemini").unwrap();
        assert_eq!(
            proxied.join("v1beta/x").unwrap().as_str(),
            "https://proxy.example.com/gemini/v1beta/x"
        );

        assert!(validate_base_url("http://localhost:8080").is_ok());
        assert!(validate_base_url("http://example.com").is_err());
        assert!(validate_base_url("not a url").is_err());
    }

    #[test]
    fn test_request_shape() {
        let request = GenerateContentRequest::new("sys", "user");
        let v = serde_json::to_value(&request).unwrap();
        assert_eq!(
            v,
            json!({
                "systemInstruction": {"parts": [{"text": "sys"}]},
                "contents": [{"role": "user", "parts": [{"text": "user"}]}],
                "tools": [{"google_search": {}}]
            })
        );
    }

    #[test]
    fn test_response_text_and_sources() {
        let raw = json!({
            "candidates": [{
                "content": {"parts": [{"text": "{\"resumoAnalise\": "}, {"text": "\"ok\"}"}]},
                "groundingMetadata": {
                    "groundingChunks": [
                        {"web": {"uri": "https://a.example", "title": "A"}},
                        {"web": {"uri": "", "title": "empty"}},
                        {"retrievedContext": {}},
                        {"web": {"uri": "https://b.example"}}
                    ]
                }
            }]
        });

        let response: GenerateContentResponse = serde_json::from_value(raw).unwrap();
        let generation = response.into_generation();
        assert_eq!(generation.text, "{\"resumoAnalise\": \"ok\"}");
        assert_eq!(
            generation.sources,
            vec![
                Source {
                    uri: "https://a.example".to_string(),
                    title: Some("A".to_string())
                },
                Source {
                    uri: "https://b.example".to_string(),
                    title: None
                },
            ]
        );
    }

    #[test]
    fn test_response_without_candidates() {
        let response: GenerateContentResponse = serde_json::from_value(json!({})).unwrap();
        let generation = response.into_generation();
        assert!(generation.text.is_empty());
        assert!(generation.sources.is_empty());
    }
}
