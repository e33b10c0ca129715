// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Commercial

//! Provider name → factory/defaults table.
//!
//! Contract:
//! - Names are trimmed and ASCII-lowercased on every read and write, so
//!   `OpenAI`, `openai` and ` openai ` address the same entry.
//! - Every write is last-writer-wins. Re-registering a factory or defaults
//!   silently replaces the previous value; tests rely on this to swap in
//!   doubles.
//! - Defaults and factories are independent and may arrive in any order.
//! - A single mutex guards the whole table; callers never lock.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use super::{ClientSettings, CommitClient};
use crate::error::{Error, Result};

pub type ProviderFactory =
    Arc<dyn Fn(&ClientSettings) -> Result<Box<dyn CommitClient>> + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProviderSettings {
    pub default_model: String,
    pub default_base_url: String,
    pub requires_api_key: bool,
}

#[derive(Default, Clone)]
struct Entry {
    factory: Option<ProviderFactory>,
    defaults: Option<ProviderSettings>,
    requires_api_key: Option<bool>,
}

#[derive(Default)]
pub struct ProviderRegistry {
    entries: Mutex<HashMap<String, Entry>>,
}

static GLOBAL: LazyLock<ProviderRegistry> = LazyLock::new(ProviderRegistry::default);

/// The process-wide registry.
pub fn global() -> &'static ProviderRegistry {
    &GLOBAL
}

pub fn normalize_name(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Entry>> {
        // The table holds plain data; a panic elsewhere cannot leave it torn.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn register<F>(&self, name: &str, factory: F)
    where
        F: Fn(&ClientSettings) -> Result<Box<dyn CommitClient>> + Send + Sync + 'static,
    {
        let name = normalize_name(name);
        debug!(provider = %name, "registering provider factory");
        self.lock().entry(name).or_default().factory = Some(Arc::new(factory));
    }

    pub fn get(&self, name: &str) -> Result<ProviderFactory> {
        let key = normalize_name(name);
        let entries = self.lock();
        entries
            .get(&key)
            .and_then(|entry| entry.factory.clone())
            .ok_or_else(|| Error::ProviderNotFound {
                name: name.trim().to_string(),
                known: known_names(&entries),
            })
    }

    /// Replaces defaults, including the stored key requirement.
    pub fn register_defaults(&self, name: &str, settings: ProviderSettings) {
        let mut entries = self.lock();
        let entry = entries.entry(normalize_name(name)).or_default();
        entry.requires_api_key = Some(settings.requires_api_key);
        entry.defaults = Some(settings);
    }

    pub fn set_requires_api_key(&self, name: &str, required: bool) {
        self.lock()
            .entry(normalize_name(name))
            .or_default()
            .requires_api_key = Some(required);
    }

    /// Registered defaults with the current key requirement folded in.
    pub fn defaults(&self, name: &str) -> Option<ProviderSettings> {
        let entries = self.lock();
        let entry = entries.get(&normalize_name(name))?;
        let mut settings = entry.defaults.clone().unwrap_or_default();
        settings.requires_api_key = entry.requires_api_key.unwrap_or(false);
        (entry.defaults.is_some() || entry.requires_api_key.is_some()).then_some(settings)
    }

    pub fn requires_api_key(&self, name: &str) -> bool {
        self.lock()
            .get(&normalize_name(name))
            .and_then(|entry| entry.requires_api_key)
            .unwrap_or(false)
    }

    /// Names with a registered factory, sorted.
    pub fn names(&self) -> Vec<String> {
        known_names(&self.lock())
    }

    /// Look up the factory, enforce the credential requirement, construct.
    ///
    /// The factory runs outside the lock so it may itself query the registry.
    pub fn create_client(&self, settings: &ClientSettings) -> Result<Box<dyn CommitClient>> {
        let factory = self.get(&settings.provider)?;

        if self.requires_api_key(&settings.provider) && settings.api_key.is_none() {
            return Err(missing_credential(&settings.provider));
        }

        factory(settings)
    }
}

fn known_names(entries: &HashMap<String, Entry>) -> Vec<String> {
    let mut names: Vec<String> = entries
        .iter()
        .filter(|(_, entry)| entry.factory.is_some())
        .map(|(name, _)| name.clone())
        .collect();
    names.sort();
    names
}

/// `{PROVIDER}_API_KEY`, with `-` mapped to `_`.
pub fn api_key_env_var(provider: &str) -> String {
    format!("{}_API_KEY", env_prefix(provider))
}

/// `{PROVIDER}_BASE_URL`, with `-` mapped to `_`.
pub fn base_url_env_var(provider: &str) -> String {
    format!("{}_BASE_URL", env_prefix(provider))
}

/// Uppercase provider name as used in environment variable names.
pub fn env_prefix(provider: &str) -> String {
    normalize_name(provider).to_ascii_uppercase().replace('-', "_")
}

pub(crate) fn missing_credential(provider: &str) -> Error {
    Error::MissingCredential {
        provider: normalize_name(provider),
        env_var: api_key_env_var(provider),
    }
}
