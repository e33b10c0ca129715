// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Commercial

use std::path::PathBuf;
use std::process::Stdio;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::error::{Error, Result};

pub struct GitService {
    work_dir: PathBuf,
}

impl GitService {
    pub async fn discover() -> Result<Self> {
        let output = Command::new("git")
            .args(["rev-parse", "--show-toplevel"])
            .output()
            .await?;

        if !output.status.success() {
            return Err(Error::NotAGitRepo);
        }

        let work_dir = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok(Self {
            work_dir: PathBuf::from(work_dir),
        })
    }

    /// Unified diff of the index against HEAD.
    pub async fn staged_diff(&self) -> Result<String> {
        // --no-ext-diff: don't use external diff tools
        // --unified=3: standard 3 lines of context
        self.git(&[
            "diff",
            "--cached",
            "--no-color",
            "--no-ext-diff",
            "--unified=3",
        ])
        .await
    }

    /// `None` on a detached HEAD or an unborn branch.
    pub async fn branch(&self) -> Option<String> {
        let name = self
            .git(&["rev-parse", "--abbrev-ref", "HEAD"])
            .await
            .ok()?;
        let name = name.trim();
        (!name.is_empty() && name != "HEAD").then(|| name.to_string())
    }

    /// Message goes through stdin so no argument escaping is involved.
    pub async fn commit(&self, message: &str) -> Result<()> {
        let mut child = Command::new("git")
            .args(["commit", "-F", "-"])
            .current_dir(&self.work_dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(message.as_bytes()).await?;
        }

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Git(stderr.trim().to_string()));
        }

        Ok(())
    }

    async fn git(&self, args: &[&str]) -> Result<String> {
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.work_dir)
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Git(stderr.trim().to_string()));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
