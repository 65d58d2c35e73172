use jsonschema::JSONSchema;
use serde_json::Value;

use crate::error::AnalysisError;
use crate::error::Result;
use crate::model::AnalysisResult;
use crate::prompt::classification_schema;

/// Schema validation behavior applied to classification responses.
///
/// `None` trusts the provider's structured-output guarantee and checks only
/// the top-level contract, `Warn` reports violations on stderr but keeps the
/// response, `Error` rejects the response outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationMode {
    #[default]
    None,
    Warn,
    Error,
}

/// Parses raw provider output into [`AnalysisResult`] records.
///
/// Holds the compiled classification schema when deep validation is enabled,
/// so the compile cost is paid once per validator rather than per response.
pub struct ResponseValidator {
    mode: ValidationMode,
    compiled: Option<JSONSchema>,
}

impl ResponseValidator {
    pub fn new(mode: ValidationMode) -> Result<Self> {
        let compiled = if mode == ValidationMode::None {
            None
        } else {
            // JSONSchema requires 'static lifetime, so we Box::leak the value
            let leaked_schema: &'static Value = Box::leak(Box::new(classification_schema()));
            let compiled = JSONSchema::compile(leaked_schema)
                .map_err(|err| AnalysisError::SchemaValidation(err.to_string()))?;
            Some(compiled)
        };

        Ok(Self { mode, compiled })
    }

    pub fn mode(&self) -> ValidationMode {
        self.mode
    }

    /// Parse a classification response for a batch of `expected` lines.
    ///
    /// A response whose root object lacks `results`, whose entries do not
    /// deserialize, or whose entry count differs from the batch length is a
    /// malformed response; a body that is not JSON at all propagates as the
    /// JSON parse failure.
    pub fn parse_classification(&self, raw: &str, expected: usize) -> Result<Vec<AnalysisResult>> {
        let value = parse_payload(raw)?;

        if let Some(compiled) = self.compiled.as_ref() {
            if let Err(message) = validate_with_compiled(&value, compiled) {
                match self.mode {
                    ValidationMode::None => {}
                    ValidationMode::Warn => {
                        eprintln!("Warning: schema validation failed: {message}");
                    }
                    ValidationMode::Error => {
                        return Err(AnalysisError::SchemaValidation(message));
                    }
                }
            }
        }

        let results = value.get("results").ok_or_else(|| {
            AnalysisError::MalformedResponse("missing 'results' field".to_string())
        })?;
        let entries = results.as_array().ok_or_else(|| {
            AnalysisError::MalformedResponse("'results' is not an array".to_string())
        })?;

        let mut parsed = Vec::with_capacity(entries.len());
        for entry in entries {
            let result: AnalysisResult =
                serde_json::from_value(entry.clone()).map_err(|err| {
                    AnalysisError::MalformedResponse(format!(
                        "result entry did not match the expected shape: {err}"
                    ))
                })?;
            parsed.push(result);
        }

        if parsed.len() != expected {
            return Err(AnalysisError::MalformedResponse(format!(
                "expected {expected} results for {expected} input lines, got {}",
                parsed.len()
            )));
        }

        Ok(parsed)
    }

    /// Parse a suggestion response into its candidate list. Non-string
    /// entries are dropped rather than failing the whole list.
    pub fn parse_suggestions(raw: &str) -> Result<Vec<String>> {
        let value = parse_payload(raw)?;

        let suggestions = value.get("suggestions").ok_or_else(|| {
            AnalysisError::MalformedResponse("missing 'suggestions' field".to_string())
        })?;
        let entries = suggestions.as_array().ok_or_else(|| {
            AnalysisError::MalformedResponse("'suggestions' is not an array".to_string())
        })?;

        Ok(entries
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect())
    }
}

/// Extract the JSON object from a raw model response, tolerating reasoning
/// spans and markdown fences around it.
fn parse_payload(raw: &str) -> Result<Value> {
    if let Some(value) = extract_json_payload(raw) {
        return Ok(value);
    }

    // Nothing recognizable; surface the parse error for the raw body.
    let value = serde_json::from_str::<Value>(strip_think_tags(raw).trim())?;
    Ok(value)
}

fn extract_json_payload(raw: &str) -> Option<Value> {
    let cleaned = strip_think_tags(raw);
    let trimmed = cleaned.trim();

    if trimmed.is_empty() {
        return None;
    }

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return Some(value);
    }

    if let Some(stripped) = strip_code_fence(trimmed) {
        if let Ok(value) = serde_json::from_str::<Value>(&stripped) {
            return Some(value);
        }
    }

    if let Some(fragment) = extract_balanced_fragment(trimmed, '{', '}') {
        if let Ok(value) = serde_json::from_str::<Value>(&fragment) {
            return Some(value);
        }
    }

    None
}

fn strip_think_tags(text: &str) -> String {
    let re = regex::Regex::new(r"(?is)<think>.*?</think>").unwrap();
    re.replace_all(text, "").trim().to_string()
}

fn strip_code_fence(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if !trimmed.starts_with("```") {
        return None;
    }

    let mut parts = trimmed.splitn(2, '\n');
    parts.next()?;
    let remainder = parts.next()?.trim();
    let end = remainder.rfind("```")?;
    Some(remainder[..end].trim().to_string())
}

fn extract_balanced_fragment(text: &str, open: char, close: char) -> Option<String> {
    let mut depth = 0usize;
    let mut start = None;

    for (idx, ch) in text.char_indices() {
        if ch == open {
            if start.is_none() {
                start = Some(idx);
            }
            depth += 1;
        } else if ch == close {
            if depth == 0 {
                continue;
            }
            depth -= 1;
            if depth == 0 {
                let begin = start?;
                return Some(text[begin..=idx].to_string());
            }
        }
    }

    None
}

fn validate_with_compiled(
    value: &Value,
    compiled: &JSONSchema,
) -> std::result::Result<(), String> {
    if let Err(errors) = compiled.validate(value) {
        let messages: Vec<String> = errors.map(|e| format!("{e}")).collect();
        return Err(messages.join("; "));
    }
    Ok(())
}
