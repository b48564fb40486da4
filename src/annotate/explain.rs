use anyhow::Result;
use async_trait::async_trait;

use super::{Explainer, Explanation};
use crate::session::{EmergencyKind, SeverityLevel};

/// (trigger keyword, explanation sentence) pairs per category.
fn kind_explanations(kind: EmergencyKind) -> &'static [(&'static str, &'static str)] {
    match kind {
        EmergencyKind::Medical => &[
            ("unconscious", "Person is not responsive, indicating a serious medical emergency."),
            ("breathing", "Breathing difficulty suggests immediate medical attention is needed."),
            ("heart attack", "Classic sign of cardiac emergency requiring urgent care."),
            ("stroke", "Neurological emergency requiring immediate medical intervention."),
            ("bleeding", "Significant blood loss requires prompt medical attention."),
            ("pain", "Severe pain may indicate a serious underlying condition."),
        ],
        EmergencyKind::Fire => &[
            ("fire", "Active fire poses immediate danger to life and property."),
            ("smoke", "Smoke inhalation is deadly; evacuation is needed immediately."),
            ("burning", "Combustible materials are ignited, with spreading risk."),
            ("flames", "Visible flames indicate an active fire requiring suppression."),
        ],
        EmergencyKind::Crime => &[
            ("gun", "Firearm present creates extreme danger to all parties."),
            ("shot", "Gunshot wounds are life-threatening and require immediate response."),
            ("robbery", "Criminal act in progress with potential for violence."),
            ("break", "Unauthorized entry indicates a security breach and potential threat."),
            ("assault", "Physical attack occurring, requiring law enforcement."),
        ],
        EmergencyKind::Accident => &[
            ("accident", "Traffic incident with potential for injuries and hazards."),
            ("crash", "Vehicle collision likely caused injuries and road hazards."),
            ("collision", "Impact event that may have caused trauma to individuals."),
            ("injured", "People harmed, requiring medical attention."),
        ],
        EmergencyKind::Disaster => &[
            ("tornado", "Severe weather event causing widespread destruction."),
            ("hurricane", "Major storm system creating emergency conditions."),
            ("earthquake", "Ground shaking causing structural damage and hazards."),
            ("flood", "Water overflow creating dangerous conditions."),
        ],
        EmergencyKind::Unknown => &[],
    }
}

fn severity_explanations(level: SeverityLevel) -> &'static [(&'static str, &'static str)] {
    match level {
        SeverityLevel::Critical => &[
            ("unconscious", "Victim unresponsive; immediate life threat."),
            ("not breathing", "Respiratory failure; minutes matter."),
            ("heart attack", "Cardiac arrest; time-sensitive intervention."),
            ("bleeding heavily", "Rapid blood loss; shock risk."),
            ("life-threatening", "Immediate danger to life."),
        ],
        SeverityLevel::High => &[
            ("injured", "Physical harm requiring medical attention."),
            ("fire", "Dangerous situation needing rapid response."),
            ("urgent", "Time-sensitive but not immediately life-threatening."),
            ("serious", "Substantial risk or harm present."),
        ],
        SeverityLevel::Medium => &[
            ("sick", "Illness requiring evaluation."),
            ("minor injury", "Less severe harm but still needs attention."),
            ("property damage", "Material loss but no immediate personal danger."),
        ],
        SeverityLevel::Low => &[
            ("inquiry", "Information request; non-emergency."),
            ("non-urgent", "Can wait for routine handling."),
        ],
    }
}

/// Builds the human-readable rationale for a classification + severity
/// pair by collecting the explanation sentences whose trigger keywords
/// appear in the transcript.
pub struct KeywordExplainer;

impl KeywordExplainer {
    pub fn new() -> Self {
        Self
    }

    fn matching(text: &str, table: &[(&str, &str)]) -> Vec<String> {
        table
            .iter()
            .filter(|(kw, _)| text.contains(kw))
            .map(|(_, sentence)| (*sentence).to_string())
            .collect()
    }
}

impl Default for KeywordExplainer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Explainer for KeywordExplainer {
    async fn explain(
        &self,
        transcript: &str,
        kind: EmergencyKind,
        severity: SeverityLevel,
    ) -> Result<Explanation> {
        let text = transcript.to_lowercase();

        let mut sentences = Self::matching(&text, kind_explanations(kind));
        for sentence in Self::matching(&text, severity_explanations(severity)) {
            if !sentences.contains(&sentence) {
                sentences.push(sentence);
            }
        }

        if sentences.is_empty() {
            return Ok(Explanation {
                text: format!(
                    "The system classified this as {} with {} severity based on \
                     analysis of the audio transcription and contextual cues.",
                    kind.as_str(),
                    severity.as_str()
                ),
                confidence: 0.3,
            });
        }

        Ok(Explanation {
            text: sentences.join(" "),
            confidence: 0.7,
        })
    }
}
