use anyhow::Result;
use async_trait::async_trait;

use super::{Classification, Classifier};
use crate::session::EmergencyKind;

const MEDICAL: &[&str] = &[
    "unconscious", "breathing", "bleeding", "heart attack", "stroke", "pain",
    "injury", "ambulance", "sick", "ill", "medicine", "doctor", "hospital",
    "medication", "prescription", "symptom", "fever", "broken bone", "burn",
];

const FIRE: &[&str] = &[
    "fire", "smoke", "burning", "flames", "burn", "explode", "gas leak",
    "explosion", "blaze", "inferno", "combustion", "ignite", "torch",
];

const CRIME: &[&str] = &[
    "gun", "shot", "robbery", "steal", "break in", "burglary", "assault",
    "murder", "kidnap", "threat", "dangerous", "criminal", "police",
    "arrest", "homicide", "weapon", "stab", "fight", "violence",
];

const ACCIDENT: &[&str] = &[
    "accident", "crash", "collision", "car", "truck", "vehicle", "hit",
    "injured", "wreck", "fender bender", "rollover", "pedestrian", "bike",
    "motorcycle", "pileup", "multi-car",
];

const DISASTER: &[&str] = &[
    "tornado", "hurricane", "earthquake", "flood", "tsunami", "avalanche",
    "landslide", "wildfire", "storm", "evacuation", "shelter",
    "severe weather", "disaster", "catastrophe",
];

const CATEGORIES: &[(EmergencyKind, &[&str])] = &[
    (EmergencyKind::Medical, MEDICAL),
    (EmergencyKind::Fire, FIRE),
    (EmergencyKind::Crime, CRIME),
    (EmergencyKind::Accident, ACCIDENT),
    (EmergencyKind::Disaster, DISASTER),
];

/// Keyword-match classifier.
///
/// Counts category keyword hits in the lowercased transcript and returns
/// the best-scoring category with its normalized share of all hits,
/// damped to leave headroom for UNKNOWN. No hits at all means UNKNOWN
/// with confidence 0 so a later, better-informed result from the same
/// snapshot can still take the slot.
pub struct KeywordClassifier;

impl KeywordClassifier {
    pub fn new() -> Self {
        Self
    }
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Classifier for KeywordClassifier {
    async fn classify(&self, transcript: &str) -> Result<Classification> {
        let text = transcript.to_lowercase();

        let mut best = (EmergencyKind::Unknown, 0usize);
        let mut total = 0usize;

        for (kind, keywords) in CATEGORIES {
            let count = keywords.iter().filter(|kw| text.contains(*kw)).count();
            total += count;
            if count > best.1 {
                best = (*kind, count);
            }
        }

        if total == 0 {
            return Ok(Classification {
                kind: EmergencyKind::Unknown,
                confidence: 0.0,
            });
        }

        Ok(Classification {
            kind: best.0,
            confidence: best.1 as f32 / total as f32 * 0.9,
        })
    }
}
