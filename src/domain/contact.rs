use std::sync::OnceLock;

use regex::Regex;

#[derive(Debug, Clone, PartialEq)]
pub struct ContactInfo {
    pub email: Option<String>,
    pub phone: Option<String>,
}

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[\w.-]+@[\w.-]+").unwrap())
}

fn phone_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\(\d{3}\)\s*\d{3}[-.\s]?\d{4}|\d{3}[-.\s]?\d{3}[-.\s]?\d{4}").unwrap()
    })
}

/// Pulls the first email address and phone number out of free-text lead
/// details. Leads rarely carry structured contact fields; the model folds
/// whatever it found into the details line.
pub fn extract_contact_info(details: &str) -> ContactInfo {
    ContactInfo {
        email: email_pattern().find(details).map(|m| m.as_str().to_string()),
        phone: phone_pattern().find(details).map(|m| m.as_str().to_string()),
    }
}

impl ContactInfo {
    /// Single display string for table rows and csv export.
    pub fn display(&self) -> String {
        match (&self.email, &self.phone) {
            (Some(email), Some(phone)) => format!("{} / {}", email, phone),
            (Some(email), None) => email.clone(),
            (None, Some(phone)) => phone.clone(),
            (None, None) => "Not specified".to_string(),
        }
    }
}
