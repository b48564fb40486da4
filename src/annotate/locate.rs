use anyhow::Result;
use async_trait::async_trait;

use super::{LocatedPlace, Locator};
use crate::session::NO_LOCATION;

const STREET_SUFFIXES: &[&str] = &[
    "street", "st", "avenue", "ave", "road", "rd", "boulevard", "blvd",
    "lane", "ln", "drive", "dr", "court", "ct", "place", "pl", "highway", "hwy",
];

const AREA_NAMES: &[&str] = &[
    "downtown", "uptown", "midtown", "city center", "suburbia",
    "residential area", "business district",
];

const LANDMARKS: &[&str] = &[
    "hospital", "school", "university", "airport", "station", "mall",
    "park", "hotel", "restaurant", "bank", "store", "center", "square",
    "plaza",
];

/// Token-scan location extraction.
///
/// Finds street addresses (a house number followed by capitalized words
/// and a street suffix), named areas, and landmark phrases, and joins
/// everything found into one comma-separated string. Confidence grows
/// with the length of the extraction, floored at 0.3 when anything was
/// found and capped at 0.9.
pub struct TokenScanLocator;

impl TokenScanLocator {
    pub fn new() -> Self {
        Self
    }

    fn find_street_addresses(words: &[&str]) -> Vec<String> {
        let mut found = Vec::new();

        for (i, word) in words.iter().enumerate() {
            if !word.chars().all(|c| c.is_ascii_digit()) || word.is_empty() {
                continue;
            }

            // House number: take up to three following words until a
            // street suffix closes the address.
            let mut parts = vec![(*word).to_string()];
            for follow in words.iter().skip(i + 1).take(3) {
                parts.push((*follow).to_string());
                if STREET_SUFFIXES.contains(&follow.to_lowercase().as_str()) {
                    found.push(parts.join(" "));
                    break;
                }
            }
        }

        found
    }

    fn find_named_streets(words: &[&str]) -> Vec<String> {
        let mut found = Vec::new();

        for window in words.windows(2) {
            let [first, second] = window else { continue };
            let starts_upper = first.chars().next().is_some_and(|c| c.is_uppercase());

            // "Main St" form
            if starts_upper
                && STREET_SUFFIXES.contains(&second.to_lowercase().as_str())
                && first.chars().any(|c| c.is_alphabetic())
            {
                found.push(format!("{} {}", first, second));
            }

            // "Highway 101" form
            if starts_upper
                && STREET_SUFFIXES.contains(&first.to_lowercase().as_str())
                && second.chars().all(|c| c.is_ascii_digit())
                && !second.is_empty()
            {
                found.push(format!("{} {}", first, second));
            }
        }

        found
    }

    fn find_landmarks(words: &[&str]) -> Vec<String> {
        let mut found = Vec::new();

        for (i, word) in words.iter().enumerate() {
            if !LANDMARKS.contains(&word.to_lowercase().as_str()) {
                continue;
            }
            // Prefer "Memorial Hospital" over a bare "hospital".
            let preceded = i > 0
                && words[i - 1]
                    .chars()
                    .next()
                    .is_some_and(|c| c.is_uppercase());
            if preceded {
                found.push(format!("{} {}", words[i - 1], word));
            } else {
                found.push((*word).to_string());
            }
        }

        found
    }
}

impl Default for TokenScanLocator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Locator for TokenScanLocator {
    async fn locate(&self, transcript: &str) -> Result<LocatedPlace> {
        let cleaned: Vec<String> = transcript
            .split_whitespace()
            .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_string())
            .filter(|w| !w.is_empty())
            .collect();
        let words: Vec<&str> = cleaned.iter().map(String::as_str).collect();

        let mut places = Self::find_street_addresses(&words);

        for street in Self::find_named_streets(&words) {
            // Skip named streets already captured as part of an address.
            if !places.iter().any(|p| p.contains(&street)) {
                places.push(street);
            }
        }

        let text = transcript.to_lowercase();
        for area in AREA_NAMES {
            if text.contains(area) {
                let mut chars = area.chars();
                let capitalized = match chars.next() {
                    Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
                    None => continue,
                };
                places.push(capitalized);
            }
        }

        for landmark in Self::find_landmarks(&words) {
            if !places.iter().any(|p| p.contains(&landmark)) {
                places.push(landmark);
            }
        }

        places.dedup();

        if places.is_empty() {
            return Ok(LocatedPlace {
                place: NO_LOCATION.to_string(),
                confidence: 0.0,
            });
        }

        let place = places.join(", ");
        let confidence = (place.len() as f32 / 50.0).min(0.9).max(0.3);

        Ok(LocatedPlace { place, confidence })
    }
}
