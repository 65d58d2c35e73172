//! Core library for the sentiscope batch sentiment analysis engine.
//!
//! The engine sends user-supplied text lines to an OpenAI-compatible model
//! provider for sentiment classification under a strict structured-output
//! schema, validates the response contract, and serializes results for
//! export. Session state, dictation transcripts, and file ingestion live
//! here too, so view layers stay thin.

pub mod client;
pub mod config;
pub mod dictation;
pub mod engine;
pub mod error;
pub mod export;
pub mod ingest;
pub mod model;
pub mod prompt;
pub mod response;
pub mod session;
pub mod summary;

pub use client::ChatBackend;
pub use client::Completion;
pub use client::CompletionRequest;
pub use client::ErrorPolicy;
pub use client::HttpBackend;
pub use client::SentimentClient;
pub use client::enable_verbose_llm_logging;
pub use config::AppConfig;
pub use config::AppPaths;
pub use config::ConfigBundle;
pub use config::ModelDescriptor;
pub use config::ResolvedProviderConfig;
pub use config::load_or_initialize_config;
pub use dictation::DictationController;
pub use dictation::DictationState;
pub use engine::AnalysisEngine;
pub use error::AnalysisError;
pub use error::Result;
pub use export::ExportFormat;
pub use ingest::read_batch_files;
pub use ingest::split_batch;
pub use model::AnalysisResult;
pub use model::Sentiment;
pub use response::ValidationMode;
pub use session::Session;
pub use session::SubmitOutcome;
pub use session::View;
