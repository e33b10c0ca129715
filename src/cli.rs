// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Commercial

use clap::Parser;

use crate::domain::CommitType;

#[derive(Parser, Debug)]
#[command(name = "commitflow")]
#[command(version)]
#[command(about = "AI-powered commit message generator", long_about = None)]
pub struct Cli {
    /// LLM provider (see `commitflow providers`)
    #[arg(short, long, env = "COMMITFLOW_PROVIDER")]
    pub provider: Option<String>,

    /// Model name (defaults to the provider's default)
    #[arg(short, long, env = "COMMITFLOW_MODEL")]
    pub model: Option<String>,

    /// Intended commit type, e.g. feat or fix
    #[arg(short = 't', long = "type")]
    pub commit_type: Option<CommitType>,

    /// Extra glob to leave out of the prompt (repeatable, adds to config)
    #[arg(short = 'x', long = "exclude", value_name = "GLOB")]
    pub exclude: Vec<String>,

    /// Maximum diff characters sent to the provider
    #[arg(long, value_name = "CHARS")]
    pub max_diff_chars: Option<usize>,

    /// Always use a single blocking request
    #[arg(long)]
    pub no_stream: bool,

    /// Auto-confirm and commit without prompting
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Print message only, don't commit
    #[arg(long)]
    pub dry_run: bool,

    /// Show the prompt sent to the provider
    #[arg(long)]
    pub show_prompt: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Initialize config file
    Init,
    /// Show current configuration
    Config,
    /// List registered providers and their defaults
    Providers,
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}
