use std::fmt;

use serde::Deserialize;
use serde::Serialize;

/// Sentiment class assigned to a single batch entry by the model.
///
/// The wire names are the three uppercase strings the provider schema
/// constrains the `sentiment` field to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sentiment {
    #[serde(rename = "POSITIVE")]
    Positive,
    #[serde(rename = "NEGATIVE")]
    Negative,
    #[serde(rename = "NEUTRAL")]
    Neutral,
}

impl Sentiment {
    pub const ALL: [Sentiment; 3] = [Sentiment::Positive, Sentiment::Negative, Sentiment::Neutral];

    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "POSITIVE",
            Sentiment::Negative => "NEGATIVE",
            Sentiment::Neutral => "NEUTRAL",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One classified batch entry, exactly as returned by the provider.
///
/// Field names serialize in camelCase so the struct round-trips against the
/// provider schema and the JSON export format unchanged. Constructed only
/// from a successful classification response and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub original_text: String,
    pub sentiment: Sentiment,
    pub confidence: f64,
    pub keywords: Vec<String>,
    pub explanation: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentiment_serializes_to_wire_names() {
        assert_eq!(
            serde_json::to_string(&Sentiment::Positive).unwrap(),
            "\"POSITIVE\""
        );
        assert_eq!(
            serde_json::from_str::<Sentiment>("\"NEUTRAL\"").unwrap(),
            Sentiment::Neutral
        );
        assert!(serde_json::from_str::<Sentiment>("\"positive\"").is_err());
    }

    #[test]
    fn result_uses_camel_case_fields() {
        let json = r#"{
            "originalText": "Great product!",
            "sentiment": "POSITIVE",
            "confidence": 0.97,
            "keywords": ["Great"],
            "explanation": "Strongly positive wording."
        }"#;

        let result: AnalysisResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.original_text, "Great product!");
        assert_eq!(result.sentiment, Sentiment::Positive);

        let round_trip = serde_json::to_value(&result).unwrap();
        assert!(round_trip.get("originalText").is_some());
        assert!(round_trip.get("original_text").is_none());
    }
}
