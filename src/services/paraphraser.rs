// Paraphrase Service
// Lazily loaded model handle with per-chunk failure isolation

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{info, warn};

use super::config_store::ParaphraseConfig;
use super::providers::{GenerationParams, InferenceLoader, ModelLoader, ProviderError, TextGenerator};

const PARAPHRASE_PREFIX: &str = "paraphrase: ";

enum ModelState {
    Uninitialized,
    Ready(Arc<dyn TextGenerator>),
    Unavailable { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum ServiceStatus {
    Uninitialized,
    Ready { model: String },
    Unavailable { reason: String },
}

pub struct ParaphraseService {
    loader: Option<Arc<dyn ModelLoader>>,
    state: Mutex<ModelState>,
    /// Finished load attempts; only written while `state` is locked
    load_attempts: AtomicU64,
    params: GenerationParams,
    chunk_timeout: Duration,
    retry_failed_load: bool,
}

impl ParaphraseService {
    pub fn new(loader: Arc<dyn ModelLoader>, config: &ParaphraseConfig) -> Self {
        Self {
            loader: Some(loader),
            state: Mutex::new(ModelState::Uninitialized),
            load_attempts: AtomicU64::new(0),
            params: GenerationParams {
                max_length: config.max_length,
                ..GenerationParams::default()
            },
            chunk_timeout: Duration::from_secs(config.timeout_secs.max(1)),
            retry_failed_load: config.retry_failed_load,
        }
    }

    /// Service backed by the HTTP inference endpoint, or a disabled one
    pub fn from_config(config: &ParaphraseConfig) -> Self {
        if !config.enabled {
            info!("paraphrase model disabled by configuration");
            return Self::disabled();
        }
        Self::new(Arc::new(InferenceLoader::new(config.clone())), config)
    }

    /// A service that never becomes ready
    pub fn disabled() -> Self {
        let config = ParaphraseConfig::default();
        Self {
            loader: None,
            state: Mutex::new(ModelState::Unavailable {
                reason: "paraphrasing disabled".to_string(),
            }),
            load_attempts: AtomicU64::new(0),
            params: GenerationParams::default(),
            chunk_timeout: Duration::from_secs(config.timeout_secs),
            retry_failed_load: false,
        }
    }

    /// A service that is ready from the start with the given generator
    pub fn with_generator(generator: Arc<dyn TextGenerator>, config: &ParaphraseConfig) -> Self {
        Self {
            loader: None,
            state: Mutex::new(ModelState::Ready(generator)),
            load_attempts: AtomicU64::new(0),
            params: GenerationParams {
                max_length: config.max_length,
                ..GenerationParams::default()
            },
            chunk_timeout: Duration::from_secs(config.timeout_secs.max(1)),
            retry_failed_load: false,
        }
    }

    /// Make sure the model is loaded. Returns false when it is unavailable.
    ///
    /// The state lock is held across the load so concurrent callers wait for
    /// a single attempt. A caller that queued behind an attempt which failed
    /// takes that failure as its answer; only a later call retries.
    pub async fn ensure_ready(&self) -> bool {
        let seen_attempts = self.load_attempts.load(Ordering::Acquire);
        let mut state = self.state.lock().await;

        match &*state {
            ModelState::Ready(_) => return true,
            ModelState::Uninitialized => {}
            ModelState::Unavailable { .. }
                if self.retry_failed_load
                    && self.load_attempts.load(Ordering::Acquire) == seen_attempts => {}
            ModelState::Unavailable { .. } => return false,
        }

        let Some(loader) = &self.loader else {
            return false;
        };

        let start = Instant::now();
        let result = loader.load().await;
        self.load_attempts.fetch_add(1, Ordering::AcqRel);

        match result {
            Ok(generator) => {
                info!(
                    model = generator.model_name(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "paraphrase.ready"
                );
                *state = ModelState::Ready(generator);
                true
            }
            Err(e) => {
                warn!(error = %e, "Paraphraser model not loaded, using rule-based fallback");
                *state = ModelState::Unavailable {
                    reason: e.to_string(),
                };
                false
            }
        }
    }

    /// Forget a failed or loaded model so the next call loads again
    pub async fn reset(&self) {
        if self.loader.is_none() {
            return;
        }
        *self.state.lock().await = ModelState::Uninitialized;
    }

    pub async fn status(&self) -> ServiceStatus {
        match &*self.state.lock().await {
            ModelState::Uninitialized => ServiceStatus::Uninitialized,
            ModelState::Ready(g) => ServiceStatus::Ready {
                model: g.model_name().to_string(),
            },
            ModelState::Unavailable { reason } => ServiceStatus::Unavailable {
                reason: reason.clone(),
            },
        }
    }

    async fn generator(&self) -> Option<Arc<dyn TextGenerator>> {
        match &*self.state.lock().await {
            ModelState::Ready(g) => Some(Arc::clone(g)),
            _ => None,
        }
    }

    /// Paraphrase one chunk. Does not trigger a model load.
    pub async fn paraphrase(&self, chunk: &str) -> Result<String, ProviderError> {
        let generator = self
            .generator()
            .await
            .ok_or_else(|| ProviderError::Unavailable("model not loaded".to_string()))?;

        let prompt = format!("{}{}", PARAPHRASE_PREFIX, chunk);
        match tokio::time::timeout(self.chunk_timeout, generator.generate(&prompt, &self.params)).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout(self.chunk_timeout)),
        }
    }

    /// Paraphrase chunks in order. A failed chunk is replaced by its original
    /// text, so the output always has one entry per input chunk.
    pub async fn paraphrase_chunks(&self, chunks: &[String]) -> Vec<String> {
        let mut outputs = Vec::with_capacity(chunks.len());
        for (idx, chunk) in chunks.iter().enumerate() {
            let text = self.paraphrase(chunk).await.unwrap_or_else(|e| {
                warn!(chunk_index = idx, error = %e, "paraphrase.chunk_failed");
                chunk.clone()
            });
            outputs.push(text);
        }
        outputs
    }
}
