//! Application configuration
//!
//! Layered with the `config` crate, later sources win:
//! 1. built-in defaults (serde default functions below)
//! 2. `config/default.toml`, or the file passed on the command line
//! 3. `CMS_EVAL_*` environment variables, `__` between nested keys
//!    (e.g. `CMS_EVAL_LLM__PROVIDER=anthropic`)
//!
//! A `.env` file is loaded first so it can feed both the overrides and
//! the API key variable.

use crate::error::{EvalError, Result};
use crate::llm::ProviderKind;
use indexmap::IndexMap;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Environment prefix for overrides
pub const ENV_PREFIX: &str = "CMS_EVAL";
/// Configuration file looked up when none is given
pub const DEFAULT_CONFIG_FILE: &str = "config/default";

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub organization: OrganizationContext,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub vendor: VendorConfig,
}

/// Locations of the data documents
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_ontology_path")]
    pub ontology_path: PathBuf,
    #[serde(default = "default_catalog_path")]
    pub catalog_path: PathBuf,
    #[serde(default = "default_architectures_path")]
    pub architectures_path: PathBuf,
}

fn default_ontology_path() -> PathBuf {
    PathBuf::from("data/ontology.json")
}

fn default_catalog_path() -> PathBuf {
    PathBuf::from("data/platforms.json")
}

fn default_architectures_path() -> PathBuf {
    PathBuf::from("data/architectures.json")
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            ontology_path: default_ontology_path(),
            catalog_path: default_catalog_path(),
            architectures_path: default_architectures_path(),
        }
    }
}

/// LLM provider configuration
///
/// `model`, `api_url` and `api_key_env` fall back to per-provider defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub provider: ProviderKind,

    #[serde(default)]
    pub model: Option<String>,

    #[serde(default)]
    pub api_url: Option<String>,

    /// Name of the environment variable holding the API key
    #[serde(default)]
    pub api_key_env: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Retries after a failed remote call (0 = surface the first failure)
    #[serde(default)]
    pub retry_attempts: usize,

    /// Base backoff in milliseconds, doubled per attempt
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Evaluations in flight at once
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_evaluations: usize,
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_max_tokens() -> u32 {
    2000
}

fn default_temperature() -> f32 {
    0.7
}

fn default_retry_backoff_ms() -> u64 {
    500
}

fn default_max_concurrent() -> usize {
    4
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            model: None,
            api_url: None,
            api_key_env: None,
            timeout_secs: default_timeout_secs(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            retry_attempts: 0,
            retry_backoff_ms: default_retry_backoff_ms(),
            max_concurrent_evaluations: default_max_concurrent(),
        }
    }
}

impl LlmConfig {
    pub fn model(&self) -> String {
        self.model
            .clone()
            .unwrap_or_else(|| self.provider.default_model().to_string())
    }

    pub fn api_url(&self) -> String {
        self.api_url
            .clone()
            .unwrap_or_else(|| self.provider.default_api_url().to_string())
    }

    pub fn api_key_env(&self) -> Option<String> {
        self.api_key_env
            .clone()
            .or_else(|| self.provider.default_api_key_env().map(str::to_string))
    }

    /// Read the API key from the configured environment variable
    pub fn api_key(&self) -> Option<SecretString> {
        let var = self.api_key_env()?;
        std::env::var(&var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(SecretString::new)
    }

    /// Same settings aimed at `kind`; provider-specific overrides are
    /// dropped when the provider changes
    pub fn for_provider(&self, kind: ProviderKind) -> LlmConfig {
        let mut llm = self.clone();
        if kind != self.provider {
            llm.provider = kind;
            llm.model = None;
            llm.api_url = None;
            llm.api_key_env = None;
        }
        llm
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

/// Assessment cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,
    #[serde(default = "default_cache_size")]
    pub max_entries: u64,
}

fn default_cache_enabled() -> bool {
    true
}

fn default_cache_ttl() -> u64 {
    3600
}

fn default_cache_size() -> u64 {
    256
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            ttl_secs: default_cache_ttl(),
            max_entries: default_cache_size(),
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

/// Organization-specific context embedded in evaluation prompts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizationContext {
    #[serde(default = "default_org_name")]
    pub name: String,
    #[serde(default = "default_requirements")]
    pub requirements: Vec<String>,
}

fn default_org_name() -> String {
    "CINCH".to_string()
}

fn default_requirements() -> Vec<String> {
    [
        "20K+ paid views/day, 6K-7K unique visitors",
        "Primary goal: improve conversion rates and drive enrollments",
        "Currently spread across 5 CMS (HubSpot, Liferay, Ion, Starmark, Surefire)",
        "Want to consolidate but accept 3-platform reality",
        "Avoid Sitecore-scale monolith, avoid lightweight tools",
        "Interested in headless/composable approach",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Default for OrganizationContext {
    fn default() -> Self {
        Self {
            name: default_org_name(),
            requirements: default_requirements(),
        }
    }
}

/// Report settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "default_report_title")]
    pub title: String,
}

fn default_report_title() -> String {
    "CMS Evaluation Report".to_string()
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            title: default_report_title(),
        }
    }
}

/// Live vendor documentation sources and fetch limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendorConfig {
    /// Documentation pages per vendor key
    #[serde(default = "default_vendor_sources")]
    pub sources: IndexMap<String, VendorSource>,

    /// Characters kept from each fetched page
    #[serde(default = "default_max_page_chars")]
    pub max_page_chars: usize,

    /// Documentation characters sent to the model
    #[serde(default = "default_max_prompt_chars")]
    pub max_prompt_chars: usize,

    /// Raw text kept alongside the extracted data
    #[serde(default = "default_excerpt_chars")]
    pub excerpt_chars: usize,

    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Where one vendor documents its product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorSource {
    /// Catalog platform the extracted scores belong to, when it differs
    /// from the vendor key
    #[serde(default)]
    pub platform: Option<String>,
    pub urls: Vec<String>,
}

fn default_vendor_sources() -> IndexMap<String, VendorSource> {
    let source = |platform: &str, urls: &[&str]| VendorSource {
        platform: Some(platform.to_string()),
        urls: urls.iter().map(|u| u.to_string()).collect(),
    };
    let mut sources = IndexMap::new();
    sources.insert(
        "contentful".to_string(),
        source(
            "Contentful",
            &["https://www.contentful.com/features/", "https://www.contentful.com/pricing/"],
        ),
    );
    sources.insert(
        "sanity".to_string(),
        source("Sanity", &["https://www.sanity.io/features", "https://www.sanity.io/pricing"]),
    );
    sources.insert(
        "hubspot".to_string(),
        source(
            "HubSpot",
            &["https://www.hubspot.com/products/cms", "https://www.hubspot.com/pricing/cms"],
        ),
    );
    sources.insert(
        "sitecore".to_string(),
        source("Sitecore", &["https://www.sitecore.com/products/content-hub"]),
    );
    sources.insert(
        "acquia".to_string(),
        source(
            "Composable (Acquia/Agility)",
            &["https://www.acquia.com/products/drupal-cloud"],
        ),
    );
    sources
}

fn default_max_page_chars() -> usize {
    15_000
}

fn default_max_prompt_chars() -> usize {
    12_000
}

fn default_excerpt_chars() -> usize {
    5_000
}

fn default_fetch_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("cms-eval/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for VendorConfig {
    fn default() -> Self {
        Self {
            sources: default_vendor_sources(),
            max_page_chars: default_max_page_chars(),
            max_prompt_chars: default_max_prompt_chars(),
            excerpt_chars: default_excerpt_chars(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl VendorConfig {
    /// Look up a source by vendor key or catalog platform, ignoring case
    pub fn source(&self, name: &str) -> Option<(&str, &VendorSource)> {
        let name = name.trim();
        self.sources
            .iter()
            .find(|(key, source)| {
                key.eq_ignore_ascii_case(name)
                    || source
                        .platform
                        .as_deref()
                        .is_some_and(|p| p.eq_ignore_ascii_case(name))
            })
            .map(|(key, source)| (key.as_str(), source))
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

impl AppConfig {
    /// Load configuration from `path` (or the default file if present) and
    /// the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Ok(env_file) = dotenvy::dotenv() {
            debug!("Loaded environment from {}", env_file.display());
        }

        let file_source = match path {
            Some(p) => config::File::from(p).required(true),
            None => config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let settings = config::Config::builder()
            .add_source(file_source)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| EvalError::Config(e.to_string()))?;

        let app: AppConfig = settings
            .try_deserialize()
            .map_err(|e| EvalError::Config(e.to_string()))?;
        app.validate()?;
        Ok(app)
    }

    pub fn validate(&self) -> Result<()> {
        if self.llm.max_concurrent_evaluations == 0 {
            return Err(EvalError::Config(
                "llm.max_concurrent_evaluations must be at least 1".to_string(),
            ));
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(EvalError::Config(format!(
                "llm.temperature {} outside [0, 2]",
                self.llm.temperature
            )));
        }
        if self.vendor.max_page_chars == 0 || self.vendor.max_prompt_chars == 0 {
            return Err(EvalError::Config(
                "vendor.max_page_chars and vendor.max_prompt_chars must be positive".to_string(),
            ));
        }
        if let Some((key, _)) = self.vendor.sources.iter().find(|(_, s)| s.urls.is_empty()) {
            return Err(EvalError::Config(format!("vendor source '{}' lists no urls", key)));
        }
        if self.cache.enabled && self.cache.max_entries == 0 {
            return Err(EvalError::Config(
                "cache.max_entries must be positive when the cache is enabled".to_string(),
            ));
        }
        Ok(())
    }
}
