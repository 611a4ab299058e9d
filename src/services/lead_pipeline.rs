use std::cmp::Ordering;
use std::sync::Arc;

use serde::Serialize;

use crate::domain::lead::{normalize, LeadRecord, NormalizedCandidate};

use super::{
    is_extraction_failure, lead_extractor, parse_leads, ChatClient, ConfidenceScorer, RetryPolicy,
    SearchProvider,
};

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub max_candidates: usize,
    pub min_confidence: f32,
    pub retry: RetryPolicy,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        PipelineSettings {
            max_candidates: 10,
            min_confidence: 0.7,
            retry: RetryPolicy::default(),
        }
    }
}

/// Ranked pipeline output. Leads under the confidence threshold are kept
/// aside so a caller can relax the threshold without re-querying.
#[derive(Debug, Default, Serialize)]
pub struct PipelineReport {
    pub qualified: Vec<LeadRecord>,
    pub below_threshold: Vec<LeadRecord>,
    pub diagnostic: Option<String>,
}

/// One full pipeline run: search every provider in list order, normalize,
/// one extraction call, parse, score, rank. Degrades to an empty report
/// plus diagnostic, never an error.
pub async fn run(
    intent: &str,
    providers: &[Arc<dyn SearchProvider>],
    chat_client: &dyn ChatClient,
    scorer: &dyn ConfidenceScorer,
    settings: &PipelineSettings,
) -> PipelineReport {
    // Provider-list order, duplicates across providers passed through
    // uncollapsed.
    let mut candidates: Vec<NormalizedCandidate> = vec![];
    for provider in providers {
        let raw_results = provider.search(intent).await;
        candidates.extend(raw_results.into_iter().map(normalize));
    }

    if candidates.is_empty() {
        return PipelineReport {
            diagnostic: Some("No search results from any provider.".to_string()),
            ..PipelineReport::default()
        };
    }
    log::info!("Merged {} candidates from {} providers", candidates.len(), providers.len());

    let raw_output = lead_extractor::extract(
        chat_client,
        intent,
        &candidates,
        settings.max_candidates,
        &settings.retry,
    )
    .await;

    if is_extraction_failure(&raw_output) {
        return PipelineReport {
            diagnostic: Some(raw_output),
            ..PipelineReport::default()
        };
    }

    let parsed = parse_leads(&raw_output);
    log::info!("Parsed {} leads from extractor output", parsed.len());

    let mut leads: Vec<LeadRecord> = parsed
        .into_iter()
        .map(|lead| {
            // A confidence the extraction model committed to wins; the
            // classifier fills the gaps.
            let confidence = match lead.confidence {
                Some(confidence) => confidence,
                None => scorer.score(&format!("{} {}", lead.name, lead.details)),
            };
            LeadRecord::from_parsed(lead, confidence)
        })
        .collect();

    rank(&mut leads);

    let (qualified, below_threshold) = leads
        .into_iter()
        .partition(|lead| lead.confidence >= settings.min_confidence);

    PipelineReport {
        qualified,
        below_threshold,
        diagnostic: None,
    }
}

/// Descending by confidence; stable, so ties keep parse order.
fn rank(leads: &mut [LeadRecord]) {
    leads.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(Ordering::Equal)
    });
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use crate::domain::lead::{LeadRecord, RawResult, SearchSource};
    use crate::services::{
        ChatClient, ChatError, ChatMessage, ConfidenceScorer, RetryPolicy, SearchProvider,
    };

    use super::{rank, run, PipelineSettings};

    struct OneResultProvider {
        title: &'static str,
        url: &'static str,
    }

    #[async_trait]
    impl SearchProvider for OneResultProvider {
        async fn search(&self, _query: &str) -> Vec<RawResult> {
            vec![RawResult {
                title: self.title.to_string(),
                snippet: "".to_string(),
                url: self.url.to_string(),
                source: SearchSource::Web,
            }]
        }
    }

    struct EmptyProvider;

    #[async_trait]
    impl SearchProvider for EmptyProvider {
        async fn search(&self, _query: &str) -> Vec<RawResult> {
            vec![]
        }
    }

    /// Returns a canned reply and records the prompt it saw.
    struct CannedChat {
        reply: String,
        seen_prompt: Mutex<String>,
    }

    impl CannedChat {
        fn new(reply: &str) -> Self {
            CannedChat {
                reply: reply.to_string(),
                seen_prompt: Mutex::new(String::new()),
            }
        }
    }

    #[async_trait]
    impl ChatClient for CannedChat {
        async fn generate(&self, messages: &[ChatMessage]) -> Result<String, ChatError> {
            *self.seen_prompt.lock().unwrap() = messages.last().unwrap().content.clone();
            Ok(self.reply.clone())
        }
    }

    struct DeadChat;

    #[async_trait]
    impl ChatClient for DeadChat {
        async fn generate(&self, _messages: &[ChatMessage]) -> Result<String, ChatError> {
            Err(ChatError::Timeout)
        }
    }

    struct FixedScorer(f32);

    impl ConfidenceScorer for FixedScorer {
        fn score(&self, _text: &str) -> f32 {
            self.0
        }
    }

    fn settings() -> PipelineSettings {
        PipelineSettings {
            max_candidates: 10,
            min_confidence: 0.7,
            retry: RetryPolicy {
                max_attempts: 3,
                base_delay: std::time::Duration::from_millis(1),
            },
        }
    }

    fn record(name: &str, confidence: f32) -> LeadRecord {
        LeadRecord {
            name: name.to_string(),
            details: "".to_string(),
            source_url: None,
            industry: None,
            confidence,
        }
    }

    #[tokio::test]
    async fn end_to_end_qualifies_the_genuine_lead() {
        let providers: Vec<Arc<dyn SearchProvider>> = vec![
            Arc::new(OneResultProvider {
                title: "ACME needs IoT help",
                url: "http://a",
            }),
            Arc::new(OneResultProvider {
                title: "Student sensor project",
                url: "http://b",
            }),
        ];
        let chat = CannedChat::new(
            "[ACME needs IoT help]\nIndustry: Manufacturing\nNeed: IoT consulting\nURL: http://a",
        );
        let scorer = FixedScorer(0.8);

        let report = run("IoT consulting", &providers, &chat, &scorer, &settings()).await;

        assert_eq!(report.qualified.len(), 1);
        assert_eq!(report.qualified[0].name, "ACME needs IoT help");
        assert_eq!(report.qualified[0].confidence, 0.8);
        assert!(report.below_threshold.is_empty());
        assert_eq!(report.diagnostic, None);
    }

    #[tokio::test]
    async fn candidates_merge_in_provider_list_order_without_dedup() {
        let providers: Vec<Arc<dyn SearchProvider>> = vec![
            Arc::new(OneResultProvider {
                title: "first provider hit",
                url: "http://same",
            }),
            Arc::new(OneResultProvider {
                title: "second provider hit",
                url: "http://same",
            }),
        ];
        let chat = CannedChat::new("[Whatever]\nNeed: x");

        run("query", &providers, &chat, &FixedScorer(0.8), &settings()).await;

        let prompt = chat.seen_prompt.lock().unwrap().clone();
        let first = prompt.find("first provider hit").unwrap();
        let second = prompt.find("second provider hit").unwrap();
        assert!(first < second);
    }

    #[tokio::test]
    async fn failing_extractor_degrades_to_empty_report_with_diagnostic() {
        let providers: Vec<Arc<dyn SearchProvider>> = vec![Arc::new(OneResultProvider {
            title: "anything",
            url: "http://a",
        })];

        let report = run("query", &providers, &DeadChat, &FixedScorer(0.8), &settings()).await;

        assert!(report.qualified.is_empty());
        assert!(report.below_threshold.is_empty());
        assert!(report.diagnostic.unwrap().starts_with("Error processing leads:"));
    }

    #[tokio::test]
    async fn no_search_results_short_circuits_before_extraction() {
        let providers: Vec<Arc<dyn SearchProvider>> = vec![Arc::new(EmptyProvider)];

        let report = run("query", &providers, &DeadChat, &FixedScorer(0.8), &settings()).await;

        assert!(report.qualified.is_empty());
        assert_eq!(
            report.diagnostic.as_deref(),
            Some("No search results from any provider.")
        );
    }

    #[tokio::test]
    async fn model_confidence_wins_and_threshold_splits() {
        let providers: Vec<Arc<dyn SearchProvider>> = vec![Arc::new(OneResultProvider {
            title: "seed",
            url: "http://a",
        })];
        let chat = CannedChat::new(
            r#"[{"company": "Hot Lead", "confidence": "High"}, {"company": "Cold Lead", "confidence": "Low"}]"#,
        );

        let report = run("query", &providers, &chat, &FixedScorer(0.0), &settings()).await;

        assert_eq!(report.qualified.len(), 1);
        assert_eq!(report.qualified[0].name, "Hot Lead");
        assert_eq!(report.below_threshold.len(), 1);
        assert_eq!(report.below_threshold[0].name, "Cold Lead");
    }

    #[test]
    fn ranking_is_stable_and_idempotent() {
        let mut leads = vec![
            record("a", 0.6),
            record("b", 0.9),
            record("c", 0.6),
            record("d", 0.3),
        ];

        rank(&mut leads);
        let once: Vec<String> = leads.iter().map(|l| l.name.clone()).collect();
        rank(&mut leads);
        let twice: Vec<String> = leads.iter().map(|l| l.name.clone()).collect();

        assert_eq!(once, vec!["b", "a", "c", "d"]);
        assert_eq!(once, twice);
    }
}
