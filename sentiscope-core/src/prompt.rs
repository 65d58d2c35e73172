use serde_json::Value;
use serde_json::json;

/// System instruction for batch classification. The output shape itself is
/// carried by [`classification_schema`]; the instruction only pins down the
/// task and forbids commentary around the JSON object.
pub const CLASSIFICATION_SYSTEM: &str = "You classify the sentiment of short texts. \
Respond with a single JSON object that strictly adheres to the caller-provided schema. \
Do not add any surrounding commentary, markdown fences, or additional keys. \
The JSON object must be the entire response.";

/// System instruction for spelling-suggestion lookups.
pub const SUGGESTION_SYSTEM: &str = "You are a spelling assistant. \
Respond with a single JSON object that strictly adheres to the caller-provided schema. \
Do not add any surrounding commentary, markdown fences, or additional keys.";

/// Schema name advertised to the provider for classification calls.
pub const CLASSIFICATION_SCHEMA_NAME: &str = "sentiment_analysis";

/// Schema name advertised to the provider for suggestion calls.
pub const SUGGESTION_SCHEMA_NAME: &str = "spelling_suggestions";

/// Build the user message for one classification batch. Each entry is quoted
/// on its own line so the model can echo it back verbatim in `originalText`.
pub fn classification_prompt(texts: &[String]) -> String {
    let formatted_texts = texts
        .iter()
        .map(|text| format!("- \"{text}\""))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Analyze the sentiment of the following texts. For each text, provide:\n\
         1. The original text itself.\n\
         2. The sentiment as 'POSITIVE', 'NEGATIVE', or 'NEUTRAL'.\n\
         3. A confidence score for the classification, from 0.0 to 1.0.\n\
         4. An array of the key phrases or words that most influenced the sentiment.\n\
         5. A brief explanation for why the text received its sentiment score.\n\
         \n\
         Return the output as a single, valid JSON object that strictly adheres to the provided schema.\n\
         \n\
         Texts to analyze:\n\
         {formatted_texts}"
    )
}

/// JSON schema constraining a classification response: a top-level object
/// whose `results` array carries one record per input line, all five fields
/// mandatory and `sentiment` limited to the three wire names.
pub fn classification_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "results": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "originalText": {
                            "type": "string",
                            "description": "The original text that was analyzed."
                        },
                        "sentiment": {
                            "type": "string",
                            "enum": ["POSITIVE", "NEGATIVE", "NEUTRAL"],
                            "description": "The sentiment of the text."
                        },
                        "confidence": {
                            "type": "number",
                            "description": "A confidence score between 0.0 and 1.0 for the sentiment classification."
                        },
                        "keywords": {
                            "type": "array",
                            "items": { "type": "string" },
                            "description": "Key words or phrases that drove the sentiment."
                        },
                        "explanation": {
                            "type": "string",
                            "description": "A brief explanation for the sentiment classification."
                        }
                    },
                    "required": ["originalText", "sentiment", "confidence", "keywords", "explanation"]
                }
            }
        },
        "required": ["results"]
    })
}

/// Build the user message for one spelling-suggestion lookup.
pub fn suggestion_prompt(word: &str) -> String {
    format!(
        "Suggest up to 5 corrected spellings for the word \"{word}\", ordered from most \
         to least likely. If the word is already spelled correctly, return an empty list."
    )
}

/// JSON schema constraining a suggestion response: a top-level object with a
/// `suggestions` string array. An empty array means the word needs no
/// correction.
pub fn suggestion_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "suggestions": {
                "type": "array",
                "items": { "type": "string" },
                "description": "Candidate replacement spellings, best first. Empty if the word is already correct."
            }
        },
        "required": ["suggestions"]
    })
}
