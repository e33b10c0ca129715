// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Commercial

// miette's Diagnostic derive generates code that triggers this false positive
#![allow(unused_assignments)]

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    #[error("Unknown provider '{name}'. Known providers: {}", known.join(", "))]
    #[diagnostic(
        code(commitflow::provider::not_found),
        help("Pick one of the known providers with --provider <name>")
    )]
    ProviderNotFound { name: String, known: Vec<String> },

    #[error("Provider '{provider}' requires an API key")]
    #[diagnostic(
        code(commitflow::provider::missing_credential),
        help("Set {env_var} or COMMITFLOW_API_KEY")
    )]
    MissingCredential { provider: String, env_var: String },

    #[error("Provider '{provider}' transport error: {message}")]
    #[diagnostic(code(commitflow::provider::transport))]
    Transport { provider: String, message: String },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Malformed response from '{provider}': {reason}")]
    #[diagnostic(code(commitflow::provider::malformed_response))]
    MalformedResponse { provider: String, reason: String },

    #[error("No staged changes found")]
    #[diagnostic(
        code(commitflow::git::no_staged),
        help("Stage files with: git add <files>")
    )]
    NoStagedChanges,

    #[error("Nothing left to describe after excluding files")]
    #[diagnostic(
        code(commitflow::diff::empty_after_filter),
        help("Every staged file matched an exclude pattern; adjust `exclude` in your config")
    )]
    EmptyFittedDiff,

    #[error("Not a git repository")]
    #[diagnostic(
        code(commitflow::git::not_repo),
        help("Run this command inside a git repository")
    )]
    NotAGitRepo,

    #[error("Configuration error: {0}")]
    #[diagnostic(code(commitflow::config::error))]
    Config(String),

    #[error("Git error: {0}")]
    #[diagnostic(code(commitflow::git::error))]
    Git(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Dialog error: {0}")]
    Dialog(String),
}

impl Error {
    pub(crate) fn transport(provider: &str, message: impl ToString) -> Self {
        Error::Transport {
            provider: provider.into(),
            message: message.to_string(),
        }
    }

    pub(crate) fn malformed(provider: &str, reason: impl ToString) -> Self {
        Error::MalformedResponse {
            provider: provider.into(),
            reason: reason.to_string(),
        }
    }
}

impl From<dialoguer::Error> for Error {
    fn from(e: dialoguer::Error) -> Self {
        Error::Dialog(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
