// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Commercial

use std::io::IsTerminal;
use std::time::Duration;

use console::style;
use dialoguer::Confirm;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::cli::{Cli, Commands};
use crate::config::Config;
use crate::domain::PromptContext;
use crate::error::{Error, Result};
use crate::services::fitting::{changed_paths, fit_diff};
use crate::services::git::GitService;
use crate::services::llm::{self, Delivery, ProviderRegistry, StreamingOrchestrator, registry};
use crate::services::sanitizer::sanitize_response;

pub struct App {
    cli: Cli,
    config: Config,
    registry: &'static ProviderRegistry,
    cancel_token: CancellationToken,
}

impl App {
    pub fn new(cli: Cli) -> Result<Self> {
        let registry = registry::global();
        llm::register_builtin_providers(registry);

        let config = Config::load(&cli)?;
        debug!(
            provider = %config.provider,
            model = ?config.model,
            max_diff_chars = config.max_diff_chars,
            stream = config.stream,
            "config loaded"
        );
        Ok(Self {
            cli,
            config,
            registry,
            cancel_token: CancellationToken::new(),
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        // Setup Ctrl+C handler with CancellationToken
        let cancel = self.cancel_token.clone();
        tokio::spawn(async move {
            signal::ctrl_c().await.ok();
            cancel.cancel();
        });

        if let Some(ref cmd) = self.cli.command {
            return self.handle_command(cmd);
        }

        self.generate_commit().await
    }

    async fn generate_commit(&mut self) -> Result<()> {
        if self.cancel_token.is_cancelled() {
            return Err(Error::Cancelled);
        }

        // Step 1: Read the staged diff
        self.print_status("Reading staged changes...");

        let git = GitService::discover().await?;
        let diff = git.staged_diff().await?;
        if diff.trim().is_empty() {
            return Err(Error::NoStagedChanges);
        }

        // Step 2: Fit it to the prompt budget
        let exclusions = self.config.exclusions()?;
        let fit = fit_diff(&diff, &exclusions, self.config.max_diff_chars);
        if fit.is_empty() {
            return Err(Error::EmptyFittedDiff);
        }

        let files: Vec<String> = changed_paths(&diff)
            .into_iter()
            .filter(|path| !exclusions.is_excluded(path))
            .collect();

        self.print_info(&format!("{} files with changes detected", files.len()));
        if fit.was_modified {
            self.print_warning(&format!(
                "Diff exceeds {} characters; the model sees a shortened version",
                self.config.max_diff_chars
            ));
        }

        // Step 3: Build the prompt
        let context = PromptContext {
            branch: git.branch().await,
            files,
            commit_type: self.cli.commit_type,
            diff: fit.fitted_diff,
        };
        let prompt = context.to_prompt();
        debug!(prompt_chars = prompt.len(), "context built");

        if self.cli.show_prompt {
            eprintln!("{}", style("--- PROMPT ---").dim());
            eprintln!("{}", prompt);
            eprintln!("{}", style("--- END PROMPT ---").dim());
        }

        if self.cancel_token.is_cancelled() {
            return Err(Error::Cancelled);
        }

        // Step 4: Generate
        let settings = self.config.client_settings(self.registry)?;
        self.print_status(&format!(
            "Contacting {} ({})...",
            settings.provider, settings.model
        ));
        let client = self.registry.create_client(&settings)?;

        let spinner = ProgressBar::new_spinner();
        spinner.set_style(ProgressStyle::default_spinner());
        spinner.set_message("Generating...");
        spinner.enable_steady_tick(Duration::from_millis(80));

        // The first delta replaces the spinner with live text
        let live = spinner.clone();
        let mut on_delta = move |delta: &str| {
            if !live.is_finished() {
                live.finish_and_clear();
            }
            eprint!("{}", delta);
        };

        let mut orchestrator = StreamingOrchestrator::new().prefer_streaming(self.config.stream);
        let outcome = orchestrator
            .run(
                client.as_ref(),
                &prompt,
                &mut on_delta,
                self.cancel_token.clone(),
            )
            .await;

        let printed_live = spinner.is_finished();
        spinner.finish_and_clear();
        if printed_live {
            eprintln!(); // Newline after streaming
        }

        let generation = outcome?;
        debug!(
            raw_len = generation.text.len(),
            delivery = ?generation.delivery,
            "sanitizing response"
        );
        if generation.delivery == Delivery::Fallback {
            self.print_info("Streaming unavailable; used a single request instead");
        }

        let message = sanitize_response(&generation.text, self.cli.commit_type)?;

        // Step 5: Confirm and commit
        if self.cli.dry_run {
            println!("\n{}", message);
            return Ok(());
        }

        let is_interactive = std::io::stdout().is_terminal() && std::io::stdin().is_terminal();

        if !self.cli.yes {
            if !is_interactive {
                eprintln!("{}", style("warning:").yellow().bold());
                eprintln!("  Not a terminal. Use --yes to auto-confirm in scripts/hooks.");
                println!("\n{}", message);
                return Ok(());
            }

            eprintln!("\n{}", style("Generated commit message:").bold());
            eprintln!("{}", style(&message).green());
            eprintln!();

            let confirm = Confirm::new()
                .with_prompt("Create commit with this message?")
                .default(true)
                .interact()?;

            if !confirm {
                return Err(Error::Cancelled);
            }
        }

        git.commit(&message).await?;

        eprintln!("{} Committed!", style("✓").green().bold());

        Ok(())
    }

    fn handle_command(&self, cmd: &Commands) -> Result<()> {
        match cmd {
            Commands::Init => {
                let path = Config::create_default()?;
                println!("Created config: {}", path.display());
                Ok(())
            }
            Commands::Config => {
                let defaults = self
                    .registry
                    .defaults(&self.config.provider)
                    .unwrap_or_default();
                let model = self.config.model.as_deref().unwrap_or(&defaults.default_model);
                let base_url = self
                    .config
                    .base_url
                    .as_deref()
                    .unwrap_or(&defaults.default_base_url);
                let api_key = if self.config.api_key.is_some() {
                    "configured"
                } else {
                    "not set"
                };

                println!("Provider: {}", self.config.provider);
                println!("Model: {}", model);
                println!("Base URL: {}", base_url);
                println!("API key: {}", api_key);
                println!("Timeout: {}s", self.config.timeout_secs);
                println!("Temperature: {}", self.config.temperature);
                println!("Max tokens: {}", self.config.num_predict);
                println!("Max diff chars: {}", self.config.max_diff_chars);
                println!("Stream: {}", self.config.stream);
                println!("Exclude: {}", self.config.exclude.join(", "));
                if let Some(ref path) = Config::config_path() {
                    let status = if path.exists() { "found" } else { "not found" };
                    println!("Config file: {} ({})", path.display(), status);
                }
                Ok(())
            }
            Commands::Providers => {
                for name in self.registry.names() {
                    let defaults = self.registry.defaults(&name).unwrap_or_default();
                    let key = if defaults.requires_api_key {
                        registry::api_key_env_var(&name)
                    } else {
                        "-".to_string()
                    };
                    println!(
                        "{:<10} model={:<28} key={:<18} {}",
                        name, defaults.default_model, key, defaults.default_base_url
                    );
                }
                Ok(())
            }
            Commands::Completions { shell } => {
                let mut cmd = <Cli as clap::CommandFactory>::command();
                clap_complete::generate(*shell, &mut cmd, "commitflow", &mut std::io::stdout());
                Ok(())
            }
        }
    }

    // ─── Output Helpers ───

    fn print_status(&self, msg: &str) {
        eprintln!("{} {}", style("→").cyan(), msg);
    }

    fn print_info(&self, msg: &str) {
        eprintln!("{} {}", style("info:").cyan(), msg);
    }

    fn print_warning(&self, msg: &str) {
        eprintln!("{} {}", style("warning:").yellow().bold(), msg);
    }
}
