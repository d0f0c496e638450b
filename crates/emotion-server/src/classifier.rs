use rand::{rngs::SmallRng, Rng, SeedableRng};
use roi_bridge::Roi;
use std::fmt;

pub const EMOTIONS: [&str; 5] = ["Happy", "Sad", "Neutral", "Surprise", "Angry"];

#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub label: String,
    /// Percentage in `[0, 100]`.
    pub confidence: f64,
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (confidence: {:.2}%)", self.label, self.confidence)
    }
}

/// Assigns an emotion to a face region.
pub trait Classifier: Send {
    fn classify(&mut self, roi: &Roi) -> Classification;
}

/// Stand-in for a trained model: a random emotion with 80-99.9% confidence.
#[derive(Debug, Clone)]
pub struct MockClassifier {
    rng: SmallRng,
}

impl MockClassifier {
    pub fn new() -> Self {
        Self {
            rng: SmallRng::from_entropy(),
        }
    }

    /// A classifier producing the same sequence of answers for a given seed.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }
}

impl Default for MockClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Classifier for MockClassifier {
    fn classify(&mut self, _roi: &Roi) -> Classification {
        let label = EMOTIONS[self.rng.gen_range(0..EMOTIONS.len())];
        let confidence = 80.0 + self.rng.gen::<f64>() * 19.9;

        Classification {
            label: label.to_string(),
            confidence,
        }
    }
}
