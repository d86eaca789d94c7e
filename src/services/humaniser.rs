// Humaniser Pipeline
// normalize -> paraphrase per sentence -> rule-based fallback

use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use super::paraphraser::ParaphraseService;
use super::rule_rewriter::rewrite;
use super::text_processor::{normalize_text, split_sentences};

/// Which path produced the output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HumaniseMethod {
    Empty,
    Paraphrase,
    Rules,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Humanised {
    pub text: String,
    pub method: HumaniseMethod,
}

#[derive(Clone)]
pub struct HumaniserPipeline {
    paraphraser: Arc<ParaphraseService>,
}

impl HumaniserPipeline {
    pub fn new(paraphraser: Arc<ParaphraseService>) -> Self {
        Self { paraphraser }
    }

    pub fn paraphraser(&self) -> &Arc<ParaphraseService> {
        &self.paraphraser
    }

    /// Rewrite `text` into a humanised form. Never fails.
    pub async fn humanise(&self, text: &str) -> String {
        self.humanise_detailed(text).await.text
    }

    /// Same as [`humanise`](Self::humanise) but also reports which path was taken.
    ///
    /// The paraphrase result is accepted as soon as the joined output has any
    /// non-blank text, even when some chunks fell back to their original
    /// wording. Those chunks get no rule-based touch-up.
    pub async fn humanise_detailed(&self, text: &str) -> Humanised {
        if text.is_empty() {
            return Humanised {
                text: String::new(),
                method: HumaniseMethod::Empty,
            };
        }

        let start = Instant::now();
        let clean = normalize_text(text);
        let chunks = split_sentences(&clean);

        // nothing to paraphrase: don't pay for a model load
        if !chunks.is_empty() && self.paraphraser.ensure_ready().await {
            let outputs = self.paraphraser.paraphrase_chunks(&chunks).await;
            let joined = outputs.join(" ");
            if !joined.trim().is_empty() {
                info!(
                    chunks = chunks.len(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "humanise.paraphrased"
                );
                return Humanised {
                    text: joined,
                    method: HumaniseMethod::Paraphrase,
                };
            }
            debug!("paraphrase produced no text, falling back to rules");
        }

        let out = rewrite(&clean);
        info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            "humanise.rule_based"
        );
        Humanised {
            text: out,
            method: HumaniseMethod::Rules,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::config_store::ParaphraseConfig;
    use crate::services::paraphraser::testing::{CountingLoader, EchoGenerator};

    fn echo_pipeline() -> HumaniserPipeline {
        let service = ParaphraseService::with_generator(Arc::new(EchoGenerator), &ParaphraseConfig::default());
        HumaniserPipeline::new(Arc::new(service))
    }

    fn rules_pipeline() -> HumaniserPipeline {
        HumaniserPipeline::new(Arc::new(ParaphraseService::disabled()))
    }

    #[tokio::test]
    async fn test_empty_input() {
        let out = echo_pipeline().humanise_detailed("").await;
        assert_eq!(out.text, "");
        assert_eq!(out.method, HumaniseMethod::Empty);
    }

    #[tokio::test]
    async fn test_unavailable_service_matches_rule_rewrite() {
        let input = "u are the best";
        let out = rules_pipeline().humanise(input).await;
        assert_eq!(out, rewrite(&normalize_text(input)));
        assert_eq!(out, "You are the best");
    }

    #[tokio::test]
    async fn test_whitespace_only_goes_through_rules() {
        let out = rules_pipeline().humanise_detailed("   ").await;
        assert_eq!(out.text, "");
        assert_eq!(out.method, HumaniseMethod::Rules);
    }

    #[tokio::test]
    async fn test_whitespace_only_skips_model_load() {
        use std::sync::atomic::Ordering;

        let loader = Arc::new(CountingLoader::new(0));
        let service = ParaphraseService::new(loader.clone(), &ParaphraseConfig::default());
        let pipeline = HumaniserPipeline::new(Arc::new(service));

        let out = pipeline.humanise_detailed(" \t\n ").await;
        assert_eq!(out.text, "");
        assert_eq!(out.method, HumaniseMethod::Rules);
        assert_eq!(loader.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_paraphrase_path_joins_chunks() {
        let out = echo_pipeline().humanise_detailed("thx for this. u rock!").await;
        assert_eq!(out.method, HumaniseMethod::Paraphrase);
        assert_eq!(out.text, "THANKS FOR THIS. YOU ROCK!");
    }

    #[tokio::test]
    async fn test_failed_chunk_keeps_original_text() {
        let out = echo_pipeline()
            .humanise_detailed("first one. boom  goes u. last one")
            .await;
        assert_eq!(out.method, HumaniseMethod::Paraphrase);
        let segments = split_sentences(&out.text);
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0], "FIRST ONE.");
        // failed chunk comes back normalized but not capitalized
        assert_eq!(segments[1], "boom goes you.");
        assert_eq!(segments[2], "LAST ONE");
    }

    #[tokio::test]
    async fn test_blank_paraphrase_falls_back_to_rules() {
        let out = echo_pipeline().humanise_detailed("blank reply. blank again").await;
        assert_eq!(out.method, HumaniseMethod::Rules);
        assert_eq!(out.text, "Blank reply. Blank again");
    }

    #[tokio::test]
    async fn test_partial_blank_is_still_paraphrase() {
        let out = echo_pipeline().humanise_detailed("blank reply. real text").await;
        assert_eq!(out.method, HumaniseMethod::Paraphrase);
        assert_eq!(out.text, " REAL TEXT");
    }

    #[tokio::test]
    async fn test_lazy_load_failure_falls_back() {
        let loader = Arc::new(CountingLoader::new(usize::MAX));
        let service = ParaphraseService::new(loader, &ParaphraseConfig::default());
        let pipeline = HumaniserPipeline::new(Arc::new(service));
        let out = pipeline.humanise_detailed("idk. maybe").await;
        assert_eq!(out.method, HumaniseMethod::Rules);
        assert_eq!(out.text, "I don't know. Maybe");
    }
}
