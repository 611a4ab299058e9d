use serde::Deserialize;
use serde_json::Value;

use crate::domain::lead::{Confidence, ParsedLead, DEFAULT_COMPANY};

/// Converts raw model output into lead records, confidence left unset for
/// the scorer. Two strategies, tried in order: strict JSON when the whole
/// output is one object or array, otherwise blank-line block splitting.
/// Parsing never fails the operation; the worst case is an empty vec.
pub fn parse_leads(raw_output: &str) -> Vec<ParsedLead> {
    let trimmed = raw_output.trim();
    if trimmed.is_empty() {
        return vec![];
    }

    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Array(values)) => values.into_iter().filter_map(lead_from_value).collect(),
        // A bare object is a one-element result set.
        Ok(value @ Value::Object(_)) => lead_from_value(value).into_iter().collect(),
        _ => parse_blocks(trimmed),
    }
}

#[derive(Deserialize)]
struct RawLead {
    #[serde(default)]
    company: Option<String>,
    #[serde(default)]
    requirements: Option<String>,
    #[serde(default)]
    source_url: Option<String>,
    #[serde(default)]
    industry: Option<String>,
    #[serde(default)]
    confidence: Option<Value>,
}

fn lead_from_value(value: Value) -> Option<ParsedLead> {
    let raw: RawLead = match serde_json::from_value(value) {
        Ok(raw) => raw,
        Err(e) => {
            log::warn!("Skipping malformed lead object: {:?}", e);
            return None;
        }
    };

    let name = raw
        .company
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_COMPANY.to_string());

    Some(ParsedLead {
        name,
        details: raw.requirements.unwrap_or_default(),
        source_url: raw.source_url.filter(|u| !u.trim().is_empty()),
        industry: raw.industry.filter(|i| !i.trim().is_empty()),
        confidence: raw.confidence.and_then(parse_confidence),
    })
}

/// High/Medium/Low map to fixed scores; any other string literal is
/// rejected and the numeric-literal reading is attempted instead.
fn parse_confidence(value: Value) -> Option<f32> {
    match value {
        Value::String(label) => match Confidence::from_label(&label) {
            Some(level) => Some(level.score()),
            None => label.trim().parse::<f32>().ok().map(|n| n.clamp(0.0, 1.0)),
        },
        Value::Number(number) => number.as_f64().map(|n| (n as f32).clamp(0.0, 1.0)),
        _ => None,
    }
}

fn parse_blocks(output: &str) -> Vec<ParsedLead> {
    output
        .split("\n\n")
        .filter_map(|block| {
            let block = block.trim();
            match block.is_empty() {
                true => None,
                false => parse_block(block),
            }
        })
        .collect()
}

fn parse_block(block: &str) -> Option<ParsedLead> {
    let mut lines = block.lines().map(str::trim).filter(|line| !line.is_empty());

    let heading = lines.next()?;
    let name = heading.strip_prefix('[').unwrap_or(heading);
    let name = name.strip_suffix(']').unwrap_or(name).trim();
    let name = match name.is_empty() {
        true => DEFAULT_COMPANY.to_string(),
        false => name.to_string(),
    };

    let rest: Vec<&str> = lines.collect();

    let source_url = rest.iter().find_map(|line| {
        line.split_once("URL:")
            .map(|(_, url)| url.trim())
            .filter(|url| !url.is_empty())
            .map(str::to_string)
    });
    let industry = rest.iter().find_map(|line| {
        line.split_once("Industry:")
            .map(|(_, industry)| industry.trim())
            .filter(|industry| !industry.is_empty())
            .map(str::to_string)
    });

    Some(ParsedLead {
        name,
        details: rest.join(" "),
        source_url,
        industry,
        confidence: None,
    })
}
