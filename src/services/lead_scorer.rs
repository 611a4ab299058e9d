use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Score returned whenever the model cannot produce one; callers never
/// handle scorer failures.
const NEUTRAL_SCORE: f32 = 0.5;

/// Seed set used to self-train when no persisted model exists. All
/// positive, three strings: a placeholder so scoring always yields a
/// number, not a calibrated classifier. Real discrimination requires
/// retraining with labeled conversion data.
const SEED_EXAMPLES: [(&str, u8); 3] = [
    ("business opportunity", 1),
    ("looking to buy", 1),
    ("seeking services", 1),
];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TermFrequencyVectorizer {
    vocabulary: BTreeMap<String, usize>,
}

fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| token.len() >= 2)
        .map(str::to_string)
        .collect()
}

impl TermFrequencyVectorizer {
    pub fn fit(documents: &[String]) -> Self {
        let mut vocabulary = BTreeMap::new();
        for document in documents {
            for token in tokenize(document) {
                let next_column = vocabulary.len();
                vocabulary.entry(token).or_insert(next_column);
            }
        }
        TermFrequencyVectorizer { vocabulary }
    }

    /// Term counts over the fitted vocabulary; unseen terms are dropped.
    pub fn transform(&self, text: &str) -> Vec<f32> {
        let mut counts = vec![0.0; self.vocabulary.len()];
        for token in tokenize(text) {
            if let Some(&column) = self.vocabulary.get(&token) {
                counts[column] += 1.0;
            }
        }
        counts
    }

    pub fn vocabulary_len(&self) -> usize {
        self.vocabulary.len()
    }
}

/// Multinomial naive bayes over term counts, Laplace-smoothed. Two classes:
/// 0 = bad lead, 1 = good lead.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NaiveBayesClassifier {
    class_log_priors: Vec<f32>,
    feature_log_probs: Vec<Vec<f32>>,
}

impl NaiveBayesClassifier {
    pub fn fit(rows: &[Vec<f32>], labels: &[u8], vocabulary_len: usize) -> Self {
        let mut class_counts = [0_usize; 2];
        let mut term_counts = vec![vec![0.0_f32; vocabulary_len]; 2];

        for (row, &label) in rows.iter().zip(labels.iter()) {
            let class = usize::from(label.min(1));
            class_counts[class] += 1;
            for (column, count) in row.iter().enumerate() {
                term_counts[class][column] += count;
            }
        }

        let total_documents = rows.len();
        let class_log_priors = class_counts
            .iter()
            .map(|&count| ((count as f32 + 1.0) / (total_documents as f32 + 2.0)).ln())
            .collect();

        let feature_log_probs = term_counts
            .into_iter()
            .map(|counts| {
                let class_total: f32 = counts.iter().sum();
                counts
                    .into_iter()
                    .map(|count| ((count + 1.0) / (class_total + vocabulary_len as f32)).ln())
                    .collect()
            })
            .collect();

        NaiveBayesClassifier {
            class_log_priors,
            feature_log_probs,
        }
    }

    /// Probability of the positive class, None when the model shape does
    /// not match the feature vector.
    pub fn predict_positive_probability(&self, features: &[f32]) -> Option<f32> {
        if self.class_log_priors.len() != 2 {
            return None;
        }

        let mut log_likelihoods = [0.0_f32; 2];
        for class in 0..2 {
            let log_probs = self.feature_log_probs.get(class)?;
            if log_probs.len() != features.len() {
                return None;
            }
            log_likelihoods[class] = self.class_log_priors[class]
                + features
                    .iter()
                    .zip(log_probs.iter())
                    .map(|(count, log_prob)| count * log_prob)
                    .sum::<f32>();
        }

        Some(1.0 / (1.0 + (log_likelihoods[0] - log_likelihoods[1]).exp()))
    }
}

/// Pluggable scoring strategy. The shipped implementation is the seeded
/// placeholder below; swap it out once real conversion labels exist.
pub trait ConfidenceScorer: Send + Sync {
    fn score(&self, text: &str) -> f32;
}

/// Confidence scorer over lead text. Guaranteed to return a number in
/// [0,1]: internal failures degrade to the neutral score.
pub struct LeadScorer {
    vectorizer: TermFrequencyVectorizer,
    classifier: NaiveBayesClassifier,
    vectorizer_path: PathBuf,
    classifier_path: PathBuf,
}

impl LeadScorer {
    /// Loads the persisted model pair, or self-trains on the seed set when
    /// either artifact is missing or unreadable.
    pub fn load_or_seed(vectorizer_path: PathBuf, classifier_path: PathBuf) -> Self {
        let mut scorer = LeadScorer {
            vectorizer: TermFrequencyVectorizer::default(),
            classifier: NaiveBayesClassifier::default(),
            vectorizer_path,
            classifier_path,
        };

        match scorer.load_models() {
            Ok(()) => log::info!("Loaded lead scoring model from disk"),
            Err(e) => {
                log::warn!("Could not load scoring model ({}); seeding placeholder", e);
                let seed: Vec<(String, u8)> = SEED_EXAMPLES
                    .iter()
                    .map(|(text, label)| (text.to_string(), *label))
                    .collect();
                if let Err(e) = scorer.train(&seed) {
                    log::error!("Failed to persist seed scoring model: {:?}", e);
                }
            }
        }

        scorer
    }

    fn load_models(&mut self) -> anyhow::Result<()> {
        self.vectorizer = read_json(&self.vectorizer_path)?;
        self.classifier = read_json(&self.classifier_path)?;
        Ok(())
    }

    fn save_models(&self) -> anyhow::Result<()> {
        write_json(&self.vectorizer_path, &self.vectorizer)?;
        write_json(&self.classifier_path, &self.classifier)?;
        Ok(())
    }

    /// Refits vectorizer and classifier jointly and persists both. Offline
    /// operation: never called from the extraction pipeline, and callers
    /// must hold the single writer seat while runs are scoring.
    pub fn train(&mut self, examples: &[(String, u8)]) -> anyhow::Result<()> {
        let texts: Vec<String> = examples.iter().map(|(text, _)| text.clone()).collect();
        let labels: Vec<u8> = examples.iter().map(|(_, label)| *label).collect();

        self.vectorizer = TermFrequencyVectorizer::fit(&texts);
        let rows: Vec<Vec<f32>> = texts
            .iter()
            .map(|text| self.vectorizer.transform(text))
            .collect();
        self.classifier = NaiveBayesClassifier::fit(&rows, &labels, self.vectorizer.vocabulary_len());

        self.save_models()
    }

    /// Positive-class probability for one piece of lead text. Never fails:
    /// an unfit vectorizer or a model/vocabulary mismatch yields the
    /// neutral score.
    pub fn score(&self, text: &str) -> f32 {
        if self.vectorizer.vocabulary_len() == 0 {
            log::warn!("Scoring with unfit vectorizer, returning neutral score");
            return NEUTRAL_SCORE;
        }

        let features = self.vectorizer.transform(text);
        match self.classifier.predict_positive_probability(&features) {
            Some(probability) if probability.is_finite() => probability.clamp(0.0, 1.0),
            _ => {
                log::warn!("Classifier could not score text, returning neutral score");
                NEUTRAL_SCORE
            }
        }
    }
}

impl ConfidenceScorer for LeadScorer {
    fn score(&self, text: &str) -> f32 {
        LeadScorer::score(self, text)
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(value)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::{LeadScorer, NaiveBayesClassifier, TermFrequencyVectorizer};

    fn temp_model_paths(tag: &str) -> (PathBuf, PathBuf) {
        let dir = std::env::temp_dir().join(format!("prospect-scorer-{}-{}", tag, uuid::Uuid::new_v4()));
        (dir.join("vectorizer.json"), dir.join("classifier.json"))
    }

    fn labeled_examples() -> Vec<(String, u8)> {
        vec![
            ("Looking for IoT solutions for our factory".to_string(), 1),
            ("Student project about sensors".to_string(), 0),
            ("Need freelance developer for industrial automation".to_string(), 1),
            ("Research paper about manufacturing".to_string(), 0),
        ]
    }

    #[test]
    fn unfit_scorer_returns_neutral_score() {
        let (vectorizer_path, classifier_path) = temp_model_paths("unfit");
        let scorer = LeadScorer {
            vectorizer: TermFrequencyVectorizer::default(),
            classifier: NaiveBayesClassifier::default(),
            vectorizer_path,
            classifier_path,
        };

        assert_eq!(scorer.score("anything at all"), 0.5);
    }

    #[test]
    fn seed_training_always_yields_a_numeric_score() {
        let (vectorizer_path, classifier_path) = temp_model_paths("seed");
        let scorer = LeadScorer::load_or_seed(vectorizer_path, classifier_path);

        let score = scorer.score("business opportunity");
        assert!((0.0..=1.0).contains(&score));
        assert!(score > 0.5);
    }

    #[test]
    fn trained_model_separates_buyers_from_students() {
        let (vectorizer_path, classifier_path) = temp_model_paths("train");
        let mut scorer = LeadScorer::load_or_seed(vectorizer_path, classifier_path);
        scorer.train(&labeled_examples()).unwrap();

        let buyer = scorer.score("looking to buy iot solutions");
        let student = scorer.score("student research paper about sensors");

        assert!(buyer > 0.5, "buyer score was {}", buyer);
        assert!(student < 0.5, "student score was {}", student);
    }

    #[test]
    fn persisted_model_round_trips_prediction_behavior() {
        let (vectorizer_path, classifier_path) = temp_model_paths("roundtrip");
        let mut scorer =
            LeadScorer::load_or_seed(vectorizer_path.clone(), classifier_path.clone());
        scorer.train(&labeled_examples()).unwrap();

        let reloaded = LeadScorer::load_or_seed(vectorizer_path, classifier_path);

        let probe = "need freelance developer for a factory retrofit";
        assert_eq!(scorer.score(probe), reloaded.score(probe));
    }

    #[test]
    fn text_with_only_unseen_terms_still_scores_in_range() {
        let (vectorizer_path, classifier_path) = temp_model_paths("unseen");
        let mut scorer = LeadScorer::load_or_seed(vectorizer_path, classifier_path);
        scorer.train(&labeled_examples()).unwrap();

        let score = scorer.score("zzz qqq xxyy");
        assert!((0.0..=1.0).contains(&score));
    }
}
