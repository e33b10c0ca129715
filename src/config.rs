// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Commercial

use directories::ProjectDirs;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::cli::Cli;
use crate::error::{Error, Result};
use crate::services::fitting::{DEFAULT_EXCLUDES, ExclusionSet};
use crate::services::llm::ClientSettings;
use crate::services::llm::registry::{self, ProviderRegistry};

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Registry name of the provider (default: ollama)
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Model name; the provider's registered default when unset
    #[serde(default)]
    pub model: Option<String>,

    /// Endpoint root; the provider's registered default when unset
    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default)]
    pub api_key: Option<String>,

    /// Request timeout in seconds (default 300)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// LLM temperature (0.0-2.0, default 0.3)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate (default 256)
    #[serde(default = "default_num_predict")]
    pub num_predict: u32,

    /// Maximum diff characters placed in the prompt (~4 chars per token)
    /// Default 24000 is safe for 8K context models
    #[serde(default = "default_max_diff_chars")]
    pub max_diff_chars: usize,

    /// Globs for files whose changes never reach the prompt
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,

    /// Try incremental delivery first (default: true)
    #[serde(default = "default_true")]
    pub stream: bool,
}

fn default_provider() -> String {
    "ollama".into()
}
fn default_timeout_secs() -> u64 {
    300
}
fn default_temperature() -> f32 {
    0.3
}
fn default_num_predict() -> u32 {
    256
}
fn default_max_diff_chars() -> usize {
    24_000
}
fn default_exclude() -> Vec<String> {
    DEFAULT_EXCLUDES.iter().map(|s| (*s).to_string()).collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
            base_url: None,
            api_key: None,
            timeout_secs: default_timeout_secs(),
            temperature: default_temperature(),
            num_predict: default_num_predict(),
            max_diff_chars: default_max_diff_chars(),
            exclude: default_exclude(),
            stream: true,
        }
    }
}

impl Config {
    /// Load with priority: CLI > COMMITFLOW_* > {PROVIDER}_* > user config >
    /// project config > defaults
    pub fn load(cli: &Cli) -> Result<Self> {
        Self::load_with(cli, Self::config_path())
    }

    /// Same as [`Config::load`] with an explicit user config location.
    pub fn load_with(cli: &Cli, user_config: Option<PathBuf>) -> Result<Self> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        // Project-level config (.commitflow.toml in the working directory)
        if let Ok(cwd) = std::env::current_dir() {
            let project_config = cwd.join(".commitflow.toml");
            if project_config.exists() {
                figment = figment.merge(Toml::file(&project_config));
            }
        }

        if let Some(path) = user_config.filter(|p| p.exists()) {
            figment = figment.merge(Toml::file(&path));
        }

        // The provider decides which {PROVIDER}_* variables apply
        let provider = match &cli.provider {
            Some(p) => p.clone(),
            None => figment
                .clone()
                .merge(Env::prefixed("COMMITFLOW_"))
                .extract_inner::<String>("provider")
                .map_err(|e| Error::Config(e.to_string()))?,
        };
        let provider_prefix = format!("{}_", registry::env_prefix(&provider));

        figment = figment
            .merge(Env::prefixed(&provider_prefix).only(&["api_key", "base_url"]))
            .merge(Env::prefixed("COMMITFLOW_"));

        let mut config: Config = figment
            .extract()
            .map_err(|e| Error::Config(e.to_string()))?;

        config.apply_cli(cli);
        config.validate()?;
        Ok(config)
    }

    pub fn config_dir() -> Option<PathBuf> {
        ProjectDirs::from("", "", "commitflow").map(|dirs| dirs.config_dir().to_path_buf())
    }

    pub fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|d| d.join("config.toml"))
    }

    fn apply_cli(&mut self, cli: &Cli) {
        if let Some(ref p) = cli.provider {
            self.provider = p.clone();
        }
        if let Some(ref m) = cli.model {
            self.model = Some(m.clone());
        }
        if let Some(max) = cli.max_diff_chars {
            self.max_diff_chars = max;
        }
        // Extra patterns add to the configured ones
        self.exclude.extend(cli.exclude.iter().cloned());
        if cli.no_stream {
            self.stream = false;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.provider.trim().is_empty() {
            return Err(Error::Config("provider cannot be empty".into()));
        }

        if !(1..=3600).contains(&self.timeout_secs) {
            return Err(Error::Config(format!(
                "timeout_secs must be 1–3600, got {}",
                self.timeout_secs
            )));
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(Error::Config(format!(
                "temperature must be 0.0–2.0, got {}",
                self.temperature
            )));
        }

        if !(1_000..=200_000).contains(&self.max_diff_chars) {
            return Err(Error::Config(format!(
                "max_diff_chars must be 1000–200000, got {}",
                self.max_diff_chars
            )));
        }

        if let Some(ref base_url) = self.base_url {
            let parsed = url::Url::parse(base_url)
                .map_err(|e| Error::Config(format!("base_url '{base_url}' is invalid: {e}")))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(Error::Config(format!(
                    "base_url must start with http:// or https://, got '{base_url}'"
                )));
            }
        }

        self.exclusions().map(|_| ())
    }

    pub fn exclusions(&self) -> Result<ExclusionSet> {
        ExclusionSet::new(&self.exclude)
    }

    /// Resolve everything a provider factory needs, filling gaps from the
    /// registry's defaults.
    pub fn client_settings(&self, registry: &ProviderRegistry) -> Result<ClientSettings> {
        registry.get(&self.provider)?;

        let defaults = registry.defaults(&self.provider).unwrap_or_default();
        let provider = registry::normalize_name(&self.provider);

        let model = non_empty(self.model.as_deref())
            .map(str::to_string)
            .unwrap_or(defaults.default_model);
        if model.is_empty() {
            return Err(Error::Config(format!(
                "no model configured for provider '{provider}'"
            )));
        }

        let base_url = non_empty(self.base_url.as_deref())
            .map(str::to_string)
            .unwrap_or(defaults.default_base_url);

        let api_key = non_empty(self.api_key.as_deref()).map(|k| SecretString::from(k.to_owned()));
        if api_key.is_none() && registry.requires_api_key(&provider) {
            return Err(registry::missing_credential(&provider));
        }

        Ok(ClientSettings {
            provider,
            model,
            base_url,
            api_key,
            timeout_secs: self.timeout_secs,
            temperature: self.temperature,
            max_tokens: self.num_predict,
        })
    }

    /// Create default config file with secure permissions
    pub fn create_default() -> Result<PathBuf> {
        let Some(dir) = Self::config_dir() else {
            return Err(Error::Config("Cannot determine config directory".into()));
        };

        fs::create_dir_all(&dir)?;

        let path = dir.join("config.toml");
        let content = r#"# commitflow configuration

# LLM provider: ollama, openai, anthropic (see `commitflow providers`)
provider = "ollama"

# Model name; leave unset to use the provider default
# model = "qwen3:4b"

# Endpoint root; leave unset to use the provider default
# base_url = "http://localhost:11434"

# API keys are best kept in OPENAI_API_KEY / ANTHROPIC_API_KEY / COMMITFLOW_API_KEY

# Maximum diff characters sent to the provider (~4 chars per token)
# Increase for larger models (e.g., 48000 for 16K context)
max_diff_chars = 24000

# Files whose changes are left out of the prompt
# exclude = ["Cargo.lock", "*.lock", "go.sum"]

# Request timeout in seconds
timeout_secs = 300

# Stream the message as it is generated, falling back to one request
stream = true
"#;

        fs::write(&path, content)?;

        // Set secure permissions (0600)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(&path)?.permissions();
            perms.set_mode(0o600);
            fs::set_permissions(&path, perms)?;
        }

        Ok(path)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
