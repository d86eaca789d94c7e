// Paraphrase Model Provider
// Text-to-text generation capability and its HTTP inference implementation

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::env;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info};

use super::config_store::ParaphraseConfig;

pub const DEFAULT_MODEL: &str = "Vamsi/T5_Paraphrase_Paws";
pub const DEFAULT_INFERENCE_URL: &str = "https://api-inference.huggingface.co/models";
pub const DEFAULT_MAX_LENGTH: u32 = 256;

/// Field names that may carry generated text, highest priority first
const TEXT_FIELD_PRIORITY: [&str; 2] = ["generated_text", "summary_text"];

const WARMUP_PROMPT: &str = "paraphrase: hello there.";

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },
    #[error("JSON parse error: {0}")]
    JsonError(String),
    #[error("model error: {0}")]
    ModelError(String),
    #[error("generation timed out after {0:?}")]
    Timeout(Duration),
    #[error("paraphrase model unavailable: {0}")]
    Unavailable(String),
    #[error("invalid model configuration: {0}")]
    InvalidConfig(String),
}

/// Decoding knobs sent with every generation call
#[derive(Debug, Clone, Serialize)]
pub struct GenerationParams {
    pub max_length: u32,
    pub num_return_sequences: u32,
    pub truncation: bool,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_length: DEFAULT_MAX_LENGTH,
            num_return_sequences: 1,
            truncation: true,
        }
    }
}

/// A text-to-text generation service (the paraphrase model)
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String, ProviderError>;

    fn model_name(&self) -> &str;
}

/// Brings a [`TextGenerator`] up. Called lazily on first use.
#[async_trait]
pub trait ModelLoader: Send + Sync {
    async fn load(&self) -> Result<Arc<dyn TextGenerator>, ProviderError>;
}

/// One result record from a text2text-generation response
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct GenerationRecord(Map<String, Value>);

impl GenerationRecord {
    /// First non-empty text field in priority order
    pub fn text(&self) -> Option<&str> {
        TEXT_FIELD_PRIORITY.iter().find_map(|field| match self.0.get(*field) {
            Some(Value::String(s)) if !s.is_empty() => Some(s.as_str()),
            _ => None,
        })
    }

    pub fn error(&self) -> Option<&str> {
        self.0.get("error").and_then(Value::as_str)
    }
}

/// Response shapes a text2text-generation endpoint may return
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum GenerationResponse {
    Batch(Vec<GenerationRecord>),
    Single(GenerationRecord),
    Unrecognized(Value),
}

impl GenerationResponse {
    /// Extract the generated text, defaulting to an empty string.
    ///
    /// A record that reports an `error` field is a generation failure.
    pub fn into_text(self) -> Result<String, ProviderError> {
        let record = match self {
            GenerationResponse::Batch(records) => records.into_iter().next(),
            GenerationResponse::Single(record) => Some(record),
            GenerationResponse::Unrecognized(_) => None,
        };

        match record {
            Some(r) => {
                if let Some(err) = r.error() {
                    return Err(ProviderError::ModelError(err.to_string()));
                }
                Ok(r.text().unwrap_or_default().trim().to_string())
            }
            None => Ok(String::new()),
        }
    }
}

#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    parameters: &'a GenerationParams,
    options: InferenceOptions,
}

#[derive(Debug, Serialize)]
struct InferenceOptions {
    wait_for_model: bool,
}

/// Client for a hosted text2text-generation inference endpoint
pub struct InferenceClient {
    client: Client,
    url: Url,
    model: String,
    api_key: Option<String>,
}

impl InferenceClient {
    pub fn new(config: &ParaphraseConfig) -> Result<Self, ProviderError> {
        let model = config.model.trim();
        if model.is_empty() {
            return Err(ProviderError::InvalidConfig("model id is empty".to_string()));
        }

        let base = config.api_url.trim_end_matches('/');
        let url = Url::parse(&format!("{}/{}", base, model))
            .map_err(|e| ProviderError::InvalidConfig(format!("bad api url `{}`: {}", base, e)))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()?;

        Ok(Self {
            client,
            url,
            model: model.to_string(),
            api_key: get_api_key(config),
        })
    }
}

#[async_trait]
impl TextGenerator for InferenceClient {
    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String, ProviderError> {
        let request = InferenceRequest {
            inputs: prompt,
            parameters: params,
            options: InferenceOptions { wait_for_model: true },
        };

        let start = Instant::now();

        let mut builder = self
            .client
            .post(self.url.clone())
            .header("Content-Type", "application/json")
            .json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.header("Authorization", format!("Bearer {}", key));
        }
        let response = builder.send().await?;

        let latency_ms = start.elapsed().as_millis() as i64;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        let data: GenerationResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::JsonError(e.to_string()))?;

        debug!(model = %self.model, latency_ms, "paraphrase.generated");
        data.into_text()
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Loads an [`InferenceClient`] and checks that the model answers
pub struct InferenceLoader {
    config: ParaphraseConfig,
}

impl InferenceLoader {
    pub fn new(config: ParaphraseConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl ModelLoader for InferenceLoader {
    async fn load(&self) -> Result<Arc<dyn TextGenerator>, ProviderError> {
        let start = Instant::now();
        let client = InferenceClient::new(&self.config)?;

        // Warm-up call: hosted models may need to be loaded before first use
        let params = GenerationParams {
            max_length: self.config.max_length,
            ..GenerationParams::default()
        };
        client.generate(WARMUP_PROMPT, &params).await?;

        info!(
            model = %client.model,
            load_ms = start.elapsed().as_millis() as u64,
            "paraphrase.model_loaded"
        );
        Ok(Arc::new(client))
    }
}

/// Get API key from environment or config file
pub fn get_api_key(config: &ParaphraseConfig) -> Option<String> {
    for key in ["PARAPHRASE_API_KEY", "HF_API_TOKEN"] {
        if let Ok(val) = env::var(key) {
            let v = val.trim();
            if !v.is_empty() {
                return Some(v.to_string());
            }
        }
    }

    config
        .api_key
        .as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(|k| k.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(json: &str) -> Result<String, ProviderError> {
        let resp: GenerationResponse = serde_json::from_str(json).unwrap();
        resp.into_text()
    }

    #[test]
    fn test_decode_list_of_records() {
        assert_eq!(decode(r#"[{"generated_text": " Hi there. "}]"#).unwrap(), "Hi there.");
    }

    #[test]
    fn test_decode_single_record() {
        assert_eq!(decode(r#"{"generated_text": "Hello."}"#).unwrap(), "Hello.");
    }

    #[test]
    fn test_decode_prefers_generated_over_summary() {
        let json = r#"[{"summary_text": "short", "generated_text": "long form"}]"#;
        assert_eq!(decode(json).unwrap(), "long form");
    }

    #[test]
    fn test_decode_falls_back_to_summary() {
        assert_eq!(decode(r#"[{"summary_text": "short"}]"#).unwrap(), "short");
        assert_eq!(
            decode(r#"[{"generated_text": "", "summary_text": "short"}]"#).unwrap(),
            "short"
        );
    }

    #[test]
    fn test_decode_defaults_to_empty() {
        assert_eq!(decode(r#"[]"#).unwrap(), "");
        assert_eq!(decode(r#"[{"score": 0.5}]"#).unwrap(), "");
        assert_eq!(decode(r#""plain string""#).unwrap(), "");
        assert_eq!(decode(r#"[[{"generated_text": "nested"}]]"#).unwrap(), "");
    }

    #[test]
    fn test_decode_error_record() {
        let err = decode(r#"{"error": "Model is currently loading"}"#).unwrap_err();
        assert!(matches!(err, ProviderError::ModelError(_)));
    }

    #[test]
    fn test_client_rejects_empty_model() {
        let config = ParaphraseConfig {
            model: "  ".to_string(),
            ..ParaphraseConfig::default()
        };
        assert!(matches!(
            InferenceClient::new(&config),
            Err(ProviderError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_client_builds_model_url() {
        let config = ParaphraseConfig {
            api_url: "http://127.0.0.1:9/models/".to_string(),
            ..ParaphraseConfig::default()
        };
        let client = InferenceClient::new(&config).unwrap();
        assert_eq!(client.url.as_str(), "http://127.0.0.1:9/models/Vamsi/T5_Paraphrase_Paws");
        assert_eq!(client.model_name(), DEFAULT_MODEL);
    }

    #[tokio::test]
    async fn test_loader_fails_when_endpoint_unreachable() {
        let config = ParaphraseConfig {
            api_url: "http://127.0.0.1:9/models".to_string(),
            timeout_secs: 2,
            ..ParaphraseConfig::default()
        };
        let loader = InferenceLoader::new(config);
        assert!(loader.load().await.is_err());
    }
}
