use serde::{Deserialize, Serialize};

/// Placeholder url stored when a provider returns a result without one.
pub const SENTINEL_URL: &str = "#";

pub const DEFAULT_TITLE: &str = "No title";
pub const DEFAULT_SNIPPET: &str = "No description";
pub const DEFAULT_COMPANY: &str = "Unknown Company";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchSource {
    Web,
    Directory,
}

/// Provider output, discarded after normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResult {
    pub title: String,
    pub snippet: String,
    pub url: String,
    pub source: SearchSource,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedCandidate {
    pub title: String,
    pub snippet: String,
    pub url: String,
    pub source: SearchSource,
}

/// Cleans one raw provider result. Infallible: missing fields become fixed
/// defaults, the url is never left empty.
pub fn normalize(raw: RawResult) -> NormalizedCandidate {
    let title = collapse_whitespace(&raw.title);
    let snippet = collapse_whitespace(&strip_bracket_annotations(&raw.snippet));
    let url = raw.url.trim();

    NormalizedCandidate {
        title: match title.is_empty() {
            true => DEFAULT_TITLE.to_string(),
            false => title,
        },
        snippet: match snippet.is_empty() {
            true => DEFAULT_SNIPPET.to_string(),
            false => snippet,
        },
        url: match url.is_empty() {
            true => SENTINEL_URL.to_string(),
            false => url.to_string(),
        },
        source: raw.source,
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<&str>>().join(" ")
}

/// Drops `[...]` annotations search engines splice into snippets, like
/// `[PDF]` markers or `[continue reading]` links. Unclosed brackets are kept
/// as ordinary text.
fn strip_bracket_annotations(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find('[') {
        match rest[start..].find(']') {
            Some(end) => {
                result.push_str(&rest[..start]);
                rest = &rest[start + end + 1..];
            }
            None => break,
        }
    }
    result.push_str(rest);

    result
}

/// Confidence levels the extraction model is allowed to emit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    pub fn from_label(label: &str) -> Option<Confidence> {
        match label {
            "High" => Some(Confidence::High),
            "Medium" => Some(Confidence::Medium),
            "Low" => Some(Confidence::Low),
            _ => None,
        }
    }

    pub fn score(&self) -> f32 {
        match self {
            Confidence::High => 0.9,
            Confidence::Medium => 0.6,
            Confidence::Low => 0.3,
        }
    }
}

/// Parser output. Confidence is only optional here; the scorer fills it in
/// before a record leaves the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedLead {
    pub name: String,
    pub details: String,
    pub source_url: Option<String>,
    pub industry: Option<String>,
    pub confidence: Option<f32>,
}

/// The unit of business value handed to callers. Immutable once saved;
/// removal is always user-initiated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadRecord {
    pub name: String,
    pub details: String,
    pub source_url: Option<String>,
    pub industry: Option<String>,
    pub confidence: f32,
}

impl LeadRecord {
    pub fn from_parsed(lead: ParsedLead, confidence: f32) -> Self {
        LeadRecord {
            name: lead.name,
            details: lead.details,
            source_url: lead.source_url,
            industry: lead.industry,
            confidence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(title: &str, snippet: &str, url: &str) -> RawResult {
        RawResult {
            title: title.to_string(),
            snippet: snippet.to_string(),
            url: url.to_string(),
            source: SearchSource::Web,
        }
    }

    #[test]
    fn normalize_fills_defaults_for_missing_fields() {
        let candidate = normalize(raw("", "", ""));

        assert_eq!(candidate.title, "No title");
        assert_eq!(candidate.snippet, "No description");
        assert_eq!(candidate.url, "#");
    }

    #[test]
    fn normalize_collapses_whitespace_runs() {
        let candidate = normalize(raw(
            "ACME   Industrial\n Controls",
            "Looking  for\t\tIoT   consulting",
            "http://acme.example",
        ));

        assert_eq!(candidate.title, "ACME Industrial Controls");
        assert_eq!(candidate.snippet, "Looking for IoT consulting");
    }

    #[test]
    fn normalize_strips_bracket_annotations_from_snippet() {
        let candidate = normalize(raw(
            "ACME",
            "[PDF] Need a supplier [continue reading] for sensors",
            "http://acme.example",
        ));

        assert_eq!(candidate.snippet, "Need a supplier for sensors");
    }

    #[test]
    fn normalize_keeps_unclosed_bracket_as_text() {
        let candidate = normalize(raw("ACME", "price [USD is open", "http://a"));

        assert_eq!(candidate.snippet, "price [USD is open");
    }

    #[test]
    fn normalize_whitespace_only_url_gets_sentinel() {
        let candidate = normalize(raw("ACME", "snippet", "   "));

        assert_eq!(candidate.url, "#");
    }

    #[test]
    fn confidence_labels_map_exactly() {
        assert_eq!(Confidence::from_label("High").unwrap().score(), 0.9);
        assert_eq!(Confidence::from_label("Medium").unwrap().score(), 0.6);
        assert_eq!(Confidence::from_label("Low").unwrap().score(), 0.3);
        assert_eq!(Confidence::from_label("VeryHigh"), None);
        assert_eq!(Confidence::from_label("high"), None);
    }
}
