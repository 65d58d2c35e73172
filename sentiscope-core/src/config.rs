use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use config::Config as ConfigLoader;
use config::Environment;
use config::File;
use serde::Deserialize;
use serde::Serialize;

use crate::error::AnalysisError;
use crate::error::Result;

/// Embedded template used to bootstrap the on-disk configuration when the
/// user runs the tool for the first time.
pub const DEFAULT_CONFIG_TEMPLATE: &str = include_str!("../../demos/config.toml");

/// Base URL used when a model spec does not name one: Google's
/// OpenAI-compatible endpoint, matching the default model.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai";

/// Container returned after loading configuration data and resolving runtime
/// paths.
#[derive(Debug, Clone)]
pub struct ConfigBundle {
    pub config: AppConfig,
    pub paths: AppPaths,
}

/// Resolve and load the configuration for the provided application name. If
/// no config file exists yet, a default file is created from
/// [`DEFAULT_CONFIG_TEMPLATE`].
pub fn load_or_initialize_config(app_name: impl AsRef<str>) -> Result<ConfigBundle> {
    let app_name = app_name.as_ref();
    let mut paths = AppPaths::discover(app_name)?;
    paths.ensure_config_dir()?;

    if !paths.config_file.exists() {
        if let Some(parent) = paths.config_file.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&paths.config_file, DEFAULT_CONFIG_TEMPLATE)?;
    }

    let env_prefix = app_name
        .chars()
        .map(|ch| if ch == '-' { '_' } else { ch })
        .collect::<String>()
        .to_ascii_uppercase();

    let builder = ConfigLoader::builder()
        .add_source(File::from(paths.config_file.clone()))
        .add_source(
            Environment::with_prefix(&env_prefix)
                .separator("__")
                .try_parsing(true),
        );

    let config: AppConfig = builder
        .build()
        .map_err(|err| {
            AnalysisError::Config(format!(
                "failed to parse configuration at {}: {err}",
                paths.config_file.display()
            ))
        })?
        .try_deserialize()
        .map_err(|err| {
            AnalysisError::Config(format!("failed to deserialize configuration: {err}"))
        })?;

    paths = paths.apply_storage_overrides(&config.storage)?;
    paths.ensure_runtime_dirs()?;

    config.normalize()?;

    Ok(ConfigBundle { config, paths })
}

/// Persistent runtime paths derived from XDG environment variables or
/// sensible fallbacks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    pub app_name: String,
    pub config_dir: PathBuf,
    pub config_file: PathBuf,
    pub data_dir: PathBuf,
    pub state_dir: PathBuf,
    pub cache_dir: PathBuf,
}

impl AppPaths {
    pub fn discover(app_name: impl Into<String>) -> Result<Self> {
        let app_name = app_name.into();
        let home = home_dir().ok_or_else(|| {
            AnalysisError::Config("unable to determine home directory for XDG resolution".into())
        })?;

        let config_base = xdg_dir("XDG_CONFIG_HOME", &home, ".config");
        let data_base = xdg_dir("XDG_DATA_HOME", &home, ".local/share");
        let state_base = xdg_dir("XDG_STATE_HOME", &home, ".local/state");
        let cache_base = env::var("XDG_CACHE_HOME")
            .ok()
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| state_base.join("cache"));

        let config_dir = config_base.join(&app_name);
        let data_dir = data_base.join(&app_name);
        let state_dir = state_base.join(&app_name);
        let cache_dir = cache_base.join(&app_name);
        let config_file = config_dir.join("config.toml");

        Ok(Self {
            app_name,
            config_dir,
            config_file,
            data_dir,
            state_dir,
            cache_dir,
        })
    }

    pub fn ensure_config_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.config_dir)?;
        Ok(())
    }

    pub fn ensure_runtime_dirs(&self) -> Result<()> {
        for dir in [&self.data_dir, &self.state_dir, &self.cache_dir] {
            fs::create_dir_all(dir)?;
        }
        Ok(())
    }

    pub fn apply_storage_overrides(&self, storage: &StorageSettings) -> Result<Self> {
        let mut next = self.clone();

        if let Some(data_dir) = storage.data_dir.as_ref() {
            next.data_dir = resolve_path_value(data_dir, &self.config_dir)?;
        }

        if let Some(state_dir) = storage.state_dir.as_ref() {
            next.state_dir = resolve_path_value(state_dir, &self.config_dir)?;
        }

        if let Some(cache_dir) = storage.cache_dir.as_ref() {
            next.cache_dir = resolve_path_value(cache_dir, &self.config_dir)?;
        } else {
            // Cache lives under the state directory by default.
            next.cache_dir = next.state_dir.join("cache");
        }

        Ok(next)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct AppConfig {
    pub provider: ProviderSection,
    pub storage: StorageSettings,
    pub export: ExportSettings,
    pub logging: LoggingSettings,
}

impl AppConfig {
    pub fn normalize(&self) -> Result<()> {
        if self.provider.analysis.name.is_none() {
            return Err(AnalysisError::Config(
                "the analysis model must specify a name".into(),
            ));
        }
        Ok(())
    }

    /// Resolve the two model descriptors. The suggestion model starts from
    /// the analysis model and applies its own overrides on top, so a bare
    /// config runs both operations against one provider.
    pub fn resolve_provider(&self) -> Result<ResolvedProviderConfig> {
        let analysis = self.provider.analysis.clone().into_descriptor("analysis")?;
        let suggestion =
            merge_model_specs(&self.provider.analysis, Some(&self.provider.suggestion))
                .into_descriptor("suggestion")?;

        Ok(ResolvedProviderConfig {
            analysis,
            suggestion,
        })
    }

    pub fn resolved_export_dir(&self, paths: &AppPaths) -> Result<Option<PathBuf>> {
        self.export
            .output_dir
            .as_ref()
            .map(|dir| resolve_path_value(dir, &paths.config_dir))
            .transpose()
    }

    pub fn resolved_llm_log_dir(&self, paths: &AppPaths) -> Result<Option<PathBuf>> {
        if !self.logging.verbose_llm_logging {
            return Ok(None);
        }

        let dir = if let Some(custom_dir) = self.logging.llm_log_dir.as_ref() {
            resolve_path_value(custom_dir, &paths.config_dir)?
        } else {
            paths.state_dir.join("llm_logs")
        };

        Ok(Some(dir))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct StorageSettings {
    pub data_dir: Option<String>,
    pub state_dir: Option<String>,
    pub cache_dir: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct ExportSettings {
    pub output_dir: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct LoggingSettings {
    /// Enable verbose logging of complete request-response cycles with the
    /// model provider.
    pub verbose_llm_logging: bool,
    /// Directory where LLM request-response logs will be written (as JSON
    /// files).
    pub llm_log_dir: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSection {
    pub analysis: ModelSpec,
    pub suggestion: ModelSpec,
}

impl Default for ProviderSection {
    fn default() -> Self {
        Self {
            analysis: ModelSpec {
                name: Some("gemini-2.5-flash".to_string()),
                base_url: Some(DEFAULT_BASE_URL.to_string()),
                api_key: None,
                temperature: None,
                request_timeout_secs: Some(60),
                max_tokens: None,
            },
            suggestion: ModelSpec {
                temperature: Some(0.1),
                ..ModelSpec::default()
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct ModelSpec {
    pub name: Option<String>,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub temperature: Option<f32>,
    pub request_timeout_secs: Option<u64>,
    pub max_tokens: Option<u32>,
}

impl ModelSpec {
    pub fn into_descriptor(self, role: &str) -> Result<ModelDescriptor> {
        let name = self.name.ok_or_else(|| {
            AnalysisError::Config(format!("model '{role}' is missing a name"))
        })?;

        Ok(ModelDescriptor {
            name,
            base_url: self.base_url,
            api_key: self.api_key,
            temperature: self.temperature,
            request_timeout_secs: self.request_timeout_secs,
            max_tokens: self.max_tokens,
        })
    }
}

fn merge_model_specs(base: &ModelSpec, overrides: Option<&ModelSpec>) -> ModelSpec {
    let mut merged = base.clone();

    if let Some(override_spec) = overrides {
        if override_spec.name.is_some() {
            merged.name = override_spec.name.clone();
        }
        if override_spec.base_url.is_some() {
            merged.base_url = override_spec.base_url.clone();
        }
        if override_spec.api_key.is_some() {
            merged.api_key = override_spec.api_key.clone();
        }
        if override_spec.temperature.is_some() {
            merged.temperature = override_spec.temperature;
        }
        if override_spec.request_timeout_secs.is_some() {
            merged.request_timeout_secs = override_spec.request_timeout_secs;
        }
        if override_spec.max_tokens.is_some() {
            merged.max_tokens = override_spec.max_tokens;
        }
    }

    merged
}

/// Fully-resolved settings for one model slot.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelDescriptor {
    pub name: String,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub temperature: Option<f32>,
    pub request_timeout_secs: Option<u64>,
    pub max_tokens: Option<u32>,
}

/// Descriptors for both remote operations.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedProviderConfig {
    pub analysis: ModelDescriptor,
    pub suggestion: ModelDescriptor,
}

fn xdg_dir(var: &str, home: &Path, fallback_suffix: &str) -> PathBuf {
    env::var(var)
        .ok()
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| home.join(fallback_suffix))
}

pub fn resolve_path_value(value: &str, base_dir: &Path) -> Result<PathBuf> {
    let expanded = expand_path(value)?;
    let mut path = PathBuf::from(&expanded);
    if path.is_absolute() {
        path = path.components().collect();
        Ok(path)
    } else {
        Ok(base_dir.join(path))
    }
}

fn expand_path(value: &str) -> Result<String> {
    let home = home_dir();
    let home_utf8 = match home.as_ref() {
        Some(path) => Some(
            path.to_str()
                .ok_or_else(|| {
                    AnalysisError::Config("home directory contains invalid UTF-8".into())
                })?
                .to_string(),
        ),
        None => None,
    };

    let expanded = shellexpand::full_with_context(
        value,
        || home_utf8.as_deref(),
        |var| Ok(env::var(var).ok()),
    )
    .map_err(|error: shellexpand::LookupError<std::env::VarError>| {
        AnalysisError::Config(format!("failed to expand '{value}': {error}"))
    })?;
    Ok(expanded.into_owned())
}

fn home_dir() -> Option<PathBuf> {
    env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(|| env::var_os("USERPROFILE").map(PathBuf::from))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;
    use std::sync::OnceLock;
    use tempfile::TempDir;

    fn env_lock() -> &'static Mutex<()> {
        static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        LOCK.get_or_init(|| Mutex::new(()))
    }

    #[test]
    fn creates_config_when_missing() {
        let _guard = env_lock().lock().unwrap();
        let tmp = TempDir::new().unwrap();
        env::set_var("XDG_CONFIG_HOME", tmp.path().join("config"));
        env::set_var("XDG_DATA_HOME", tmp.path().join("data"));
        env::set_var("XDG_STATE_HOME", tmp.path().join("state"));

        let bundle = load_or_initialize_config("sentiscope-test").unwrap();

        assert!(
            bundle.paths.config_file.exists(),
            "config file not created at {}",
            bundle.paths.config_file.display()
        );
        assert!(bundle.paths.data_dir.exists());
        assert!(bundle.paths.state_dir.exists());
        assert!(bundle.paths.cache_dir.exists());

        let provider = bundle.config.resolve_provider().unwrap();
        assert_eq!(provider.analysis.name, "gemini-2.5-flash");
    }

    #[test]
    fn respects_storage_overrides() {
        let _guard = env_lock().lock().unwrap();
        let tmp = TempDir::new().unwrap();
        let config_home = tmp.path().join("config");
        env::set_var("XDG_CONFIG_HOME", &config_home);
        env::set_var("XDG_DATA_HOME", tmp.path().join("data"));
        env::set_var("XDG_STATE_HOME", tmp.path().join("state"));

        let app_dir = config_home.join("sentiscope-override");
        fs::create_dir_all(&app_dir).unwrap();
        let config_file = app_dir.join("config.toml");
        let mut file = fs::File::create(&config_file).unwrap();
        writeln!(
            file,
            r#"
                [storage]
                data_dir = "~/custom/data"
                state_dir = "~/custom/state"
                cache_dir = "~/custom/state/cache"
            "#
        )
        .unwrap();

        let bundle = load_or_initialize_config("sentiscope-override").unwrap();

        let expanded_home = home_dir().unwrap();
        assert_eq!(bundle.paths.data_dir, expanded_home.join("custom/data"));
        assert_eq!(bundle.paths.state_dir, expanded_home.join("custom/state"));
        assert_eq!(
            bundle.paths.cache_dir,
            expanded_home.join("custom/state/cache")
        );
    }

    #[test]
    fn suggestion_model_inherits_analysis_settings() {
        let config = AppConfig::default();
        let provider = config.resolve_provider().unwrap();

        assert_eq!(provider.suggestion.name, provider.analysis.name);
        assert_eq!(provider.suggestion.base_url, provider.analysis.base_url);
        // Inherited settings, but the low suggestion temperature survives.
        assert_eq!(provider.suggestion.temperature, Some(0.1));
        assert_eq!(provider.analysis.temperature, None);
    }

    #[test]
    fn suggestion_overrides_win_over_inherited_values() {
        let mut config = AppConfig::default();
        config.provider.suggestion.name = Some("tiny-speller".to_string());
        config.provider.suggestion.temperature = Some(0.3);

        let provider = config.resolve_provider().unwrap();
        assert_eq!(provider.suggestion.name, "tiny-speller");
        assert_eq!(provider.suggestion.temperature, Some(0.3));
        assert_eq!(provider.analysis.name, "gemini-2.5-flash");
    }

    #[test]
    fn a_nameless_analysis_model_is_rejected() {
        let mut config = AppConfig::default();
        config.provider.analysis.name = None;

        assert!(config.normalize().is_err());
        assert!(config.resolve_provider().is_err());
    }
}
