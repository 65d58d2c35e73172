use std::fs;
use std::path::Path;
use std::path::PathBuf;

use crate::client::SentimentClient;
use crate::client::enable_verbose_llm_logging;
use crate::config::AppConfig;
use crate::config::AppPaths;
use crate::config::ConfigBundle;
use crate::config::ResolvedProviderConfig;
use crate::config::load_or_initialize_config;
use crate::error::Result;
use crate::export::ExportFormat;
use crate::export::render;
use crate::model::AnalysisResult;
use crate::response::ValidationMode;

/// High-level facade over configuration, the remote client, and the export
/// serializers. One engine instance serves a whole session.
pub struct AnalysisEngine {
    bundle: ConfigBundle,
}

impl AnalysisEngine {
    /// Load configuration from disk (creating defaults if needed) and
    /// produce a ready-to-use engine instance. Enables verbose LLM logging
    /// when the configuration asks for it.
    pub fn load(app_name: impl AsRef<str>) -> Result<Self> {
        let bundle = load_or_initialize_config(app_name)?;

        if let Some(log_dir) = bundle.config.resolved_llm_log_dir(&bundle.paths)? {
            enable_verbose_llm_logging(log_dir);
        }

        Ok(Self { bundle })
    }

    /// Construct an engine from an existing [`ConfigBundle`]. Useful for
    /// tests.
    pub fn from_bundle(bundle: ConfigBundle) -> Self {
        Self { bundle }
    }

    pub fn config(&self) -> &AppConfig {
        &self.bundle.config
    }

    pub fn paths(&self) -> &AppPaths {
        &self.bundle.paths
    }

    pub fn resolve_provider(&self) -> Result<ResolvedProviderConfig> {
        self.bundle.config.resolve_provider()
    }

    /// Build a connected client with the requested response validation mode.
    pub fn client(&self, mode: ValidationMode) -> Result<SentimentClient> {
        SentimentClient::connect(&self.resolve_provider()?, mode)
    }

    /// Classify one batch of lines. `max_tokens_override` caps the response
    /// size for this call only.
    pub async fn classify(
        &self,
        texts: &[String],
        mode: ValidationMode,
        max_tokens_override: Option<u32>,
    ) -> Result<Vec<AnalysisResult>> {
        let mut provider = self.resolve_provider()?;
        if let Some(max_tokens) = max_tokens_override {
            provider.analysis.max_tokens = Some(max_tokens);
            provider.suggestion.max_tokens = Some(max_tokens);
        }

        let client = SentimentClient::connect(&provider, mode)?;
        client.classify(texts).await
    }

    /// Look up replacement spellings for one word. Remote failures degrade
    /// to an empty list inside the client; only setup failures surface.
    pub async fn suggest(&self, word: &str) -> Result<Vec<String>> {
        let client = self.client(ValidationMode::None)?;
        Ok(client.suggest(word).await)
    }

    /// Directory exports land in: the CLI override, then the configured
    /// export directory, then the current directory.
    pub fn export_dir(&self, dir_override: Option<&Path>) -> Result<PathBuf> {
        if let Some(dir) = dir_override {
            return Ok(dir.to_path_buf());
        }

        let configured = self
            .bundle
            .config
            .resolved_export_dir(&self.bundle.paths)?;
        Ok(configured.unwrap_or_else(|| PathBuf::from(".")))
    }

    /// Serialize the result sequence into each requested format, writing
    /// the fixed filenames into the export directory. Returns the written
    /// paths in format order.
    pub fn write_exports(
        &self,
        results: &[AnalysisResult],
        formats: &[ExportFormat],
        dir_override: Option<&Path>,
    ) -> Result<Vec<PathBuf>> {
        let dir = self.export_dir(dir_override)?;
        fs::create_dir_all(&dir)?;

        let mut written = Vec::with_capacity(formats.len());
        for format in formats {
            let bytes = render(results, *format)?;
            let path = dir.join(format.filename());
            fs::write(&path, bytes)?;
            written.push(path);
        }

        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::error::AnalysisError;
    use crate::model::Sentiment;
    use tempfile::TempDir;

    fn test_engine(tmp: &TempDir) -> AnalysisEngine {
        let paths = AppPaths {
            app_name: "sentiscope-engine-test".to_string(),
            config_dir: tmp.path().join("config"),
            config_file: tmp.path().join("config/config.toml"),
            data_dir: tmp.path().join("data"),
            state_dir: tmp.path().join("state"),
            cache_dir: tmp.path().join("cache"),
        };

        AnalysisEngine::from_bundle(ConfigBundle {
            config: AppConfig::default(),
            paths,
        })
    }

    #[tokio::test]
    async fn empty_batches_are_rejected_before_any_network_setup_matters() {
        let tmp = TempDir::new().unwrap();
        let engine = test_engine(&tmp);

        let err = engine
            .classify(&[], ValidationMode::None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::EmptyBatch));
    }

    #[test]
    fn exports_write_the_fixed_filenames() {
        let tmp = TempDir::new().unwrap();
        let engine = test_engine(&tmp);
        let results = vec![AnalysisResult {
            original_text: "solid".to_string(),
            sentiment: Sentiment::Positive,
            confidence: 0.9,
            keywords: vec!["solid".to_string()],
            explanation: "Positive word.".to_string(),
        }];

        let out_dir = tmp.path().join("exports");
        let written = engine
            .write_exports(
                &results,
                &[ExportFormat::Csv, ExportFormat::Json, ExportFormat::Pdf],
                Some(&out_dir),
            )
            .unwrap();

        assert_eq!(written.len(), 3);
        assert!(out_dir.join("sentiment_analysis_results.csv").exists());
        assert!(out_dir.join("sentiment_analysis_results.json").exists());
        assert!(out_dir.join("sentiment_analysis_results.pdf").exists());
    }

    #[test]
    fn export_dir_falls_back_to_the_current_directory() {
        let tmp = TempDir::new().unwrap();
        let engine = test_engine(&tmp);

        assert_eq!(engine.export_dir(None).unwrap(), PathBuf::from("."));
        assert_eq!(
            engine.export_dir(Some(Path::new("/tmp/out"))).unwrap(),
            PathBuf::from("/tmp/out")
        );
    }
}
