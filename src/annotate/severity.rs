use anyhow::Result;
use async_trait::async_trait;

use super::{SeverityRater, SeverityRating};
use crate::session::{EmergencyKind, SeverityLevel};

const CRITICAL: &[&str] = &[
    "unconscious", "not breathing", "heart attack", "stroke", "bleeding heavily",
    "severe bleeding", "cardiac arrest", "choking", "drowning", "electrocution",
    "severe burn", "multiple injuries", "life-threatening", "critical condition",
    "immediate danger", "active shooter", "explosion imminent", "mass casualty",
];

const HIGH: &[&str] = &[
    "injured", "pain", "broken bone", "burn", "accident", "crash", "fire",
    "smoke", "gunshot", "stabbed", "assault", "robbery", "dangerous",
    "urgent", "emergency", "serious", "major", "significant",
];

const MEDIUM: &[&str] = &[
    "sick", "ill", "fever", "minor injury", "small fire", "property damage",
    "disturbance", "noise complaint", "lost", "stranded", "locked out",
    "medical concern", "first aid needed", "property crime",
];

const LOW: &[&str] = &[
    "inquiry", "information", "non-urgent", "routine", "follow-up",
    "administrative", "scheduled", "appointment", "general question",
];

/// Distress and urgency markers that boost the upper severity bands.
const EMOTION: &[&str] = &[
    "immediately", "now", "right away", "hurry", "quickly", "fast",
    "very", "extremely", "terribly", "incredibly", "highly",
    "help", "please", "oh god", "oh no", "scared", "afraid",
];

/// Phrases that are critical specifically within one category; a match
/// only counts when the classifier put the call in that category.
fn category_critical(kind: EmergencyKind) -> &'static [&'static str] {
    match kind {
        EmergencyKind::Medical => &[
            "unconscious", "not breathing", "cardiac arrest", "choking",
            "severe bleeding",
        ],
        EmergencyKind::Fire => &["trapped", "people inside", "spreading fast"],
        EmergencyKind::Crime => &["active shooter", "armed", "gunshots", "hostage"],
        EmergencyKind::Accident => &["trapped", "pileup", "not moving"],
        EmergencyKind::Disaster => &["mass casualty", "evacuation", "collapsed building"],
        EmergencyKind::Unknown => &[],
    }
}

/// Keyword-weighted severity scoring.
///
/// Critical keywords carry double weight, category-specific critical
/// phrases double again, and emotion markers nudge the critical/high
/// bands. With nothing matched at all the rating falls back to MEDIUM
/// for a classified call and LOW when the category itself is unknown.
pub struct KeywordSeverityRater;

impl KeywordSeverityRater {
    pub fn new() -> Self {
        Self
    }
}

impl Default for KeywordSeverityRater {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SeverityRater for KeywordSeverityRater {
    async fn rate(&self, transcript: &str, category: EmergencyKind) -> Result<SeverityRating> {
        let text = transcript.to_lowercase();

        let count = |keywords: &[&str]| keywords.iter().filter(|kw| text.contains(*kw)).count();

        let mut critical = 2.0 * count(CRITICAL) as f32;
        critical += 2.0 * count(category_critical(category)) as f32;

        let mut high = count(HIGH) as f32;
        let medium = count(MEDIUM) as f32;
        let low = count(LOW) as f32;

        let emotion = count(EMOTION) as f32;
        if critical + high + medium + low > 0.0 {
            critical += 0.5 * emotion;
            high += 0.5 * emotion;
        }

        let total = critical + high + medium + low;
        if total == 0.0 {
            return Ok(match category {
                EmergencyKind::Unknown => SeverityRating {
                    level: SeverityLevel::Low,
                    confidence: 0.0,
                },
                _ => SeverityRating {
                    level: SeverityLevel::Medium,
                    confidence: 0.3,
                },
            });
        }

        // Ascending order so ties resolve toward the more severe band.
        let (level, score) = [
            (SeverityLevel::Low, low),
            (SeverityLevel::Medium, medium),
            (SeverityLevel::High, high),
            (SeverityLevel::Critical, critical),
        ]
        .into_iter()
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .unwrap_or((SeverityLevel::Medium, 0.0));

        Ok(SeverityRating {
            level,
            confidence: (score / total).min(1.0),
        })
    }
}
