use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::config::DEFAULT_BASE_URL;
use crate::config::ModelDescriptor;
use crate::config::ResolvedProviderConfig;
use crate::error::AnalysisError;
use crate::error::Result;
use crate::model::AnalysisResult;
use crate::prompt::CLASSIFICATION_SCHEMA_NAME;
use crate::prompt::CLASSIFICATION_SYSTEM;
use crate::prompt::SUGGESTION_SCHEMA_NAME;
use crate::prompt::SUGGESTION_SYSTEM;
use crate::prompt::classification_prompt;
use crate::prompt::classification_schema;
use crate::prompt::suggestion_prompt;
use crate::prompt::suggestion_schema;
use crate::response::ResponseValidator;
use crate::response::ValidationMode;

/// How a failed remote call is reported to the caller of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// The failure is returned to the caller.
    Surface,
    /// The failure collapses into the operation's empty result.
    Degrade,
}

/// Static description of one remote operation: its log label, its error
/// policy, and the temperature used when the model config sets none.
#[derive(Debug, Clone, Copy)]
pub struct OperationProfile {
    pub name: &'static str,
    pub error_policy: ErrorPolicy,
    pub temperature: Option<f32>,
}

/// Batch classification is a required outcome: failures surface.
pub const CLASSIFY_PROFILE: OperationProfile = OperationProfile {
    name: "classify",
    error_policy: ErrorPolicy::Surface,
    temperature: None,
};

/// Suggestions are an optional enhancement: failures degrade to an empty
/// list, and the low temperature keeps candidate ranking stable.
pub const SUGGEST_PROFILE: OperationProfile = OperationProfile {
    name: "suggest",
    error_policy: ErrorPolicy::Degrade,
    temperature: Some(0.1),
};

/// One fully-assembled request against the chat completions API.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
    pub schema_name: &'static str,
    pub schema: Value,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: Option<u64>,
    pub completion_tokens: Option<u64>,
    pub total_tokens: Option<u64>,
}

/// Raw assistant output for one completed request.
#[derive(Debug, Clone)]
pub struct Completion {
    pub content: String,
    pub usage: Option<TokenUsage>,
}

/// Transport seam between the sentiment operations and the model provider.
///
/// Implementors encapsulate the vendor HTTP details; consumers stay
/// decoupled from any particular provider, and tests supply doubles.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion>;

    /// Model identifier used in log entries.
    fn model(&self) -> &str;
}

#[derive(Serialize)]
struct ChatRequestBody<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    response_format: ResponseFormat<'a>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    json_schema: JsonSchemaFormat<'a>,
}

#[derive(Serialize)]
struct JsonSchemaFormat<'a> {
    name: &'a str,
    strict: bool,
    schema: &'a Value,
}

#[derive(Deserialize)]
struct ChatResponseBody {
    choices: Vec<ChatChoice>,
    usage: Option<TokenUsage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// Production [`ChatBackend`]: one POST to `{base_url}/chat/completions`
/// per call, bearer auth when an API key is configured, no retries.
pub struct HttpBackend {
    http: reqwest::Client,
    model: String,
    base_url: String,
    api_key: Option<String>,
}

impl HttpBackend {
    pub fn new(descriptor: &ModelDescriptor) -> Result<Self> {
        let timeout = Duration::from_secs(descriptor.request_timeout_secs.unwrap_or(60));
        let http = reqwest::Client::builder().timeout(timeout).build()?;

        let base_url = descriptor
            .base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        Ok(Self {
            http,
            model: descriptor.name.clone(),
            base_url,
            api_key: descriptor.api_key.clone(),
        })
    }
}

#[async_trait]
impl ChatBackend for HttpBackend {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion> {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));

        let body = ChatRequestBody {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user,
                },
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            response_format: ResponseFormat {
                kind: "json_schema",
                json_schema: JsonSchemaFormat {
                    name: request.schema_name,
                    strict: true,
                    schema: &request.schema,
                },
            },
        };

        let mut builder = self.http.post(&url).json(&body);
        if let Some(api_key) = self.api_key.as_ref() {
            builder = builder.bearer_auth(api_key);
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<Value>(&text)
                .ok()
                .and_then(|v| {
                    v.get("error")
                        .and_then(|e| e.get("message"))
                        .and_then(Value::as_str)
                        .map(str::to_string)
                })
                .unwrap_or(text);
            return Err(AnalysisError::Provider(format!("{status}: {message}")));
        }

        let parsed: ChatResponseBody = response.json().await?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                AnalysisError::Provider("response contained no choices".to_string())
            })?;

        Ok(Completion {
            content,
            usage: parsed.usage,
        })
    }

    fn model(&self) -> &str {
        &self.model
    }
}

struct ModelSlot {
    backend: Box<dyn ChatBackend>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

impl ModelSlot {
    fn connect(descriptor: &ModelDescriptor) -> Result<Self> {
        Ok(Self {
            backend: Box::new(HttpBackend::new(descriptor)?),
            temperature: descriptor.temperature,
            max_tokens: descriptor.max_tokens,
        })
    }

    fn from_backend(backend: Box<dyn ChatBackend>) -> Self {
        Self {
            backend,
            temperature: None,
            max_tokens: None,
        }
    }
}

/// The remote inference client: one classification slot, one suggestion
/// slot, and the response validator shared by both.
pub struct SentimentClient {
    analysis: ModelSlot,
    suggestion: ModelSlot,
    validator: ResponseValidator,
}

impl SentimentClient {
    pub fn connect(provider: &ResolvedProviderConfig, mode: ValidationMode) -> Result<Self> {
        Ok(Self {
            analysis: ModelSlot::connect(&provider.analysis)?,
            suggestion: ModelSlot::connect(&provider.suggestion)?,
            validator: ResponseValidator::new(mode)?,
        })
    }

    /// Construct a client over arbitrary backends. Used by tests to supply
    /// provider doubles.
    pub fn with_backends(
        analysis: Box<dyn ChatBackend>,
        suggestion: Box<dyn ChatBackend>,
        mode: ValidationMode,
    ) -> Result<Self> {
        Ok(Self {
            analysis: ModelSlot::from_backend(analysis),
            suggestion: ModelSlot::from_backend(suggestion),
            validator: ResponseValidator::new(mode)?,
        })
    }

    /// Classify one batch. Exactly one network round trip; the response must
    /// carry one result per input line, in input order.
    ///
    /// An empty batch is rejected before any network activity. Failures
    /// surface per [`CLASSIFY_PROFILE`]; nothing is retried.
    pub async fn classify(&self, texts: &[String]) -> Result<Vec<AnalysisResult>> {
        if texts.is_empty() {
            return Err(AnalysisError::EmptyBatch);
        }

        let request = CompletionRequest {
            system: CLASSIFICATION_SYSTEM.to_string(),
            user: classification_prompt(texts),
            schema_name: CLASSIFICATION_SCHEMA_NAME,
            schema: classification_schema(),
            temperature: self.analysis.temperature.or(CLASSIFY_PROFILE.temperature),
            max_tokens: self.analysis.max_tokens,
        };

        let completion = self.analysis.backend.complete(&request).await?;
        log_llm_interaction(
            self.analysis.backend.model(),
            CLASSIFY_PROFILE.name,
            &request,
            &completion,
        );

        self.validator
            .parse_classification(&completion.content, texts.len())
    }

    /// Look up replacement spellings for one word. Failures degrade to an
    /// empty list per [`SUGGEST_PROFILE`]; callers that need the failure use
    /// [`SentimentClient::try_suggest`].
    pub async fn suggest(&self, word: &str) -> Vec<String> {
        self.try_suggest(word).await.unwrap_or_default()
    }

    /// Suggestion lookup with the failure still visible. Words that clean
    /// down to a single character or less short-circuit to an empty list
    /// without a network call.
    pub async fn try_suggest(&self, word: &str) -> Result<Vec<String>> {
        let cleaned = clean_word(word);
        if cleaned.chars().count() <= 1 {
            return Ok(Vec::new());
        }

        let request = CompletionRequest {
            system: SUGGESTION_SYSTEM.to_string(),
            user: suggestion_prompt(&cleaned),
            schema_name: SUGGESTION_SCHEMA_NAME,
            schema: suggestion_schema(),
            temperature: self.suggestion.temperature.or(SUGGEST_PROFILE.temperature),
            max_tokens: self.suggestion.max_tokens,
        };

        let completion = self.suggestion.backend.complete(&request).await?;
        log_llm_interaction(
            self.suggestion.backend.model(),
            SUGGEST_PROFILE.name,
            &request,
            &completion,
        );

        ResponseValidator::parse_suggestions(&completion.content)
    }
}

/// Strip surrounding punctuation from a selected word before it becomes a
/// suggestion query.
pub fn clean_word(raw: &str) -> String {
    raw.trim()
        .trim_matches(|c: char| !c.is_alphanumeric())
        .to_string()
}

/// Global state for verbose LLM logging
static VERBOSE_LLM_LOGGING: Mutex<Option<PathBuf>> = Mutex::new(None);

/// Enable verbose LLM logging to the specified directory
pub fn enable_verbose_llm_logging(log_dir: PathBuf) {
    if let Ok(mut guard) = VERBOSE_LLM_LOGGING.lock() {
        *guard = Some(log_dir);
    }
}

/// Disable verbose LLM logging
pub fn disable_verbose_llm_logging() {
    if let Ok(mut guard) = VERBOSE_LLM_LOGGING.lock() {
        *guard = None;
    }
}

fn llm_log_dir() -> Option<PathBuf> {
    VERBOSE_LLM_LOGGING.lock().ok()?.clone()
}

#[derive(Debug, Serialize, Deserialize)]
struct LlmLogEntry {
    timestamp: String,
    model: String,
    operation: String,
    request: LlmLogRequest,
    response: LlmLogResponse,
}

#[derive(Debug, Serialize, Deserialize)]
struct LlmLogRequest {
    system: String,
    user: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct LlmLogResponse {
    content: String,
    usage: Option<TokenUsage>,
}

fn log_llm_interaction(
    model: &str,
    operation: &str,
    request: &CompletionRequest,
    completion: &Completion,
) {
    if let Some(log_dir) = llm_log_dir() {
        if let Err(err) = try_log_llm_interaction(model, operation, request, completion, &log_dir)
        {
            eprintln!("Warning: failed to write LLM log: {err}");
        }
    }
}

fn try_log_llm_interaction(
    model: &str,
    operation: &str,
    request: &CompletionRequest,
    completion: &Completion,
    log_dir: &PathBuf,
) -> Result<()> {
    use std::fs;
    use std::time::SystemTime;

    fs::create_dir_all(log_dir)?;

    let entry = LlmLogEntry {
        timestamp: chrono::Utc::now().to_rfc3339(),
        model: model.to_string(),
        operation: operation.to_string(),
        request: LlmLogRequest {
            system: request.system.clone(),
            user: request.user.clone(),
        },
        response: LlmLogResponse {
            content: completion.content.clone(),
            usage: completion.usage,
        },
    };

    let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S").to_string();
    let millis = SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.subsec_millis())
        .unwrap_or(0);
    let filename = format!("{timestamp}_{operation}_{millis:03}.json");

    let json = serde_json::to_string_pretty(&entry)?;
    fs::write(log_dir.join(filename), json)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;

    use crate::model::Sentiment;

    /// Double that echoes one neutral result per quoted input line, in
    /// request order, and counts how often it was called.
    struct EchoBackend {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ChatBackend for EchoBackend {
        async fn complete(&self, request: &CompletionRequest) -> Result<Completion> {
            self.calls.fetch_add(1, Ordering::SeqCst);

            let entries: Vec<String> = request
                .user
                .lines()
                .filter_map(|line| {
                    line.strip_prefix("- \"")
                        .and_then(|rest| rest.strip_suffix('"'))
                })
                .map(|text| {
                    format!(
                        r#"{{"originalText": "{text}", "sentiment": "NEUTRAL",
                            "confidence": 0.5, "keywords": [], "explanation": "echo"}}"#
                    )
                })
                .collect();

            Ok(Completion {
                content: format!(r#"{{"results": [{}]}}"#, entries.join(",")),
                usage: None,
            })
        }

        fn model(&self) -> &str {
            "echo-double"
        }
    }

    /// Double that fails every call.
    struct FailingBackend {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ChatBackend for FailingBackend {
        async fn complete(&self, _request: &CompletionRequest) -> Result<Completion> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(AnalysisError::Provider("simulated outage".to_string()))
        }

        fn model(&self) -> &str {
            "failing-double"
        }
    }

    /// Double that returns a fixed body regardless of input.
    struct CannedBackend {
        body: String,
    }

    #[async_trait]
    impl ChatBackend for CannedBackend {
        async fn complete(&self, _request: &CompletionRequest) -> Result<Completion> {
            Ok(Completion {
                content: self.body.clone(),
                usage: None,
            })
        }

        fn model(&self) -> &str {
            "canned-double"
        }
    }

    fn echo_client(calls: Arc<AtomicUsize>) -> SentimentClient {
        SentimentClient::with_backends(
            Box::new(EchoBackend {
                calls: calls.clone(),
            }),
            Box::new(EchoBackend { calls }),
            ValidationMode::None,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn classify_preserves_batch_order_and_length() {
        let calls = Arc::new(AtomicUsize::new(0));
        let client = echo_client(calls.clone());

        let texts = vec![
            "first line".to_string(),
            "second line".to_string(),
            "third line".to_string(),
        ];
        let results = client.classify(&texts).await.unwrap();

        assert_eq!(results.len(), texts.len());
        for (text, result) in texts.iter().zip(&results) {
            assert_eq!(&result.original_text, text);
            assert_eq!(result.sentiment, Sentiment::Neutral);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn empty_batch_never_reaches_the_backend() {
        let calls = Arc::new(AtomicUsize::new(0));
        let client = echo_client(calls.clone());

        let err = client.classify(&[]).await.unwrap_err();
        assert!(matches!(err, AnalysisError::EmptyBatch));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn classification_failure_surfaces_to_the_caller() {
        let calls = Arc::new(AtomicUsize::new(0));
        let client = SentimentClient::with_backends(
            Box::new(FailingBackend {
                calls: calls.clone(),
            }),
            Box::new(FailingBackend { calls }),
            ValidationMode::None,
        )
        .unwrap();

        let err = client.classify(&["anything".to_string()]).await.unwrap_err();
        assert!(matches!(err, AnalysisError::Provider(_)));
    }

    #[tokio::test]
    async fn suggestion_failure_degrades_to_empty() {
        let calls = Arc::new(AtomicUsize::new(0));
        let client = SentimentClient::with_backends(
            Box::new(FailingBackend {
                calls: calls.clone(),
            }),
            Box::new(FailingBackend {
                calls: calls.clone(),
            }),
            ValidationMode::None,
        )
        .unwrap();

        assert!(client.suggest("recieve").await.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(client.try_suggest("recieve").await.is_err());
    }

    #[tokio::test]
    async fn short_words_short_circuit_without_a_call() {
        let calls = Arc::new(AtomicUsize::new(0));
        let client = echo_client(calls.clone());

        assert!(client.suggest("a").await.is_empty());
        assert!(client.suggest("  x! ").await.is_empty());
        assert!(client.suggest("").await.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn suggest_returns_parsed_candidates() {
        let client = SentimentClient::with_backends(
            Box::new(CannedBackend {
                body: r#"{"suggestions": ["receive", "relieve"]}"#.to_string(),
            }),
            Box::new(CannedBackend {
                body: r#"{"suggestions": ["receive", "relieve"]}"#.to_string(),
            }),
            ValidationMode::None,
        )
        .unwrap();

        assert_eq!(
            client.suggest("recieve").await,
            vec!["receive".to_string(), "relieve".to_string()]
        );
    }

    #[test]
    fn error_policies_are_fixed_per_operation() {
        assert_eq!(CLASSIFY_PROFILE.error_policy, ErrorPolicy::Surface);
        assert_eq!(SUGGEST_PROFILE.error_policy, ErrorPolicy::Degrade);
        assert_eq!(SUGGEST_PROFILE.temperature, Some(0.1));
    }

    #[test]
    fn clean_word_strips_surrounding_punctuation() {
        assert_eq!(clean_word("  \"recieve,\" "), "recieve");
        assert_eq!(clean_word("(word)"), "word");
        assert_eq!(clean_word("!?"), "");
    }
}
