use std::time::Duration;

use itertools::Itertools;

use crate::domain::lead::NormalizedCandidate;

use super::{ChatClient, ChatError, ChatMessage};

/// Failure sentinel. Downstream stages always receive a string from the
/// extractor; this prefix is how they tell a reply from a dead provider.
pub const EXTRACTION_FAILED_PREFIX: &str = "Error processing leads:";

pub fn is_extraction_failure(output: &str) -> bool {
    output.starts_with(EXTRACTION_FAILED_PREFIX)
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

/// Sends the candidate set through the filtering model once, retrying
/// transient failures with exponential backoff. Never returns an error:
/// exhausted retries degrade to the sentinel string.
pub async fn extract(
    chat_client: &dyn ChatClient,
    intent: &str,
    candidates: &[NormalizedCandidate],
    max_candidates: usize,
    policy: &RetryPolicy,
) -> String {
    let messages = build_messages(intent, candidates, max_candidates);

    let mut attempt = 0;
    loop {
        match chat_client.generate(&messages).await {
            Ok(reply) => return reply,
            Err(e) => {
                attempt += 1;

                if !e.is_transient() || attempt >= policy.max_attempts {
                    log::error!("Lead extraction failed after {} attempt(s): {}", attempt, e);
                    return format!("{} {}", EXTRACTION_FAILED_PREFIX, e);
                }

                let delay = match e {
                    // A server-provided wait beats the exponential schedule;
                    // one base-delay unit of slack on top.
                    ChatError::RateLimited {
                        retry_after: Some(wait),
                    } => wait + policy.base_delay,
                    _ => policy.base_delay * 2_u32.pow(attempt - 1),
                };

                log::warn!(
                    "Transient extraction failure ({}), retrying in {:?}",
                    e,
                    delay
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

fn build_messages(
    intent: &str,
    candidates: &[NormalizedCandidate],
    max_candidates: usize,
) -> Vec<ChatMessage> {
    // Stable prefix, not a sample: bounds prompt size and keeps reruns
    // comparable.
    let capped = &candidates[..candidates.len().min(max_candidates)];
    let context = capped
        .iter()
        .map(|c| format!("Title: {}\nSnippet: {}\nURL: {}", c.title, c.snippet, c.url))
        .join("\n\n");

    let system = "You are a lead generation expert. You qualify raw search results \
                  into genuine B2B sales leads."
        .to_string();

    let user = format!(
        r#"Based on this user need:
"{intent}"

Filter the following search results and keep only entries that look like genuine business opportunities: people wanting to buy products or posting freelance job requests. Exclude student projects, academic requests and sellers.

For each surviving entry reply with exactly this four-line block, blocks separated by a blank line:
[Company/Contact]
Industry: ...
Need: ...
URL: ...

Results:
{context}"#
    );

    vec![ChatMessage::system(system), ChatMessage::user(user)]
}
