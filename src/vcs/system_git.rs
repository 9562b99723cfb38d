//! Version control through the system `git` executable, operating on bare
//! repositories laid out as `{root}/{owner}/{name}.git`.

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::process::Output;
use tokio::process::Command;

use crate::model::{Repository, Tag};
use crate::vcs::VersionControl;

const TAG_FORMAT: &str =
    "--format=%(refname:strip=2)%00%(objectname)%00%(*objectname)%00%(committerdate:unix)%00%(*committerdate:unix)";

#[derive(Debug, Clone)]
pub struct SystemGit {
    repositories_root: PathBuf,
}

impl SystemGit {
    pub fn new(repositories_root: impl Into<PathBuf>) -> Self {
        Self {
            repositories_root: repositories_root.into(),
        }
    }

    pub fn repository_path(&self, repository: &Repository) -> PathBuf {
        self.repositories_root
            .join(&repository.owner)
            .join(format!("{}.git", repository.name))
    }

    /// Git command with an isolated environment
    fn git_cmd(&self, path: &Path) -> Command {
        let mut cmd = Command::new("git");
        cmd.arg("-C").arg(path);

        cmd.env_clear();
        if let Ok(path) = std::env::var("PATH") {
            cmd.env("PATH", path);
        }
        if let Ok(home) = std::env::var("HOME") {
            cmd.env("HOME", home);
        }

        cmd.arg("-c").arg("core.quotePath=false");
        cmd
    }

    async fn run(&self, repository: &Repository, args: &[&str]) -> Result<Output> {
        let path = self.repository_path(repository);
        self.git_cmd(&path)
            .args(args)
            .output()
            .await
            .with_context(|| format!("Failed to execute git {}", args.join(" ")))
    }
}

fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).trim().to_string()
}

fn parse_unix(value: &str) -> Option<DateTime<Utc>> {
    value.trim().parse::<i64>().ok().and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
}

/// Parse one `for-each-ref` line. Annotated tags report the peeled commit in
/// the `*` fields; lightweight tags leave them empty.
fn parse_tag_line(line: &str) -> Option<Tag> {
    let mut fields = line.split('\0');
    let name = fields.next()?.to_string();
    let object = fields.next()?;
    let peeled = fields.next()?;
    let date = fields.next()?;
    let peeled_date = fields.next()?;

    if name.is_empty() {
        return None;
    }

    let (commit_id, committed_at) = if peeled.is_empty() {
        (object, date)
    } else {
        (peeled, peeled_date)
    };

    Some(Tag {
        name,
        commit_id: commit_id.to_string(),
        committed_at: parse_unix(committed_at).unwrap_or_default(),
    })
}

#[async_trait::async_trait]
impl VersionControl for SystemGit {
    async fn resolve_commitish(&self, repository: &Repository, commitish: &str) -> Result<Option<String>> {
        if commitish.is_empty() || commitish.starts_with('-') {
            return Ok(None);
        }

        let revspec = format!("{}^{{commit}}", commitish);
        let output = self
            .run(repository, &["rev-parse", "--verify", "--quiet", &revspec])
            .await?;

        if !output.status.success() {
            return Ok(None);
        }
        Ok(Some(String::from_utf8_lossy(&output.stdout).trim().to_string()))
    }

    async fn create_tag(&self, repository: &Repository, tag_name: &str, commit_id: &str) -> Result<bool> {
        let output = self.run(repository, &["tag", "--", tag_name, commit_id]).await?;

        if output.status.success() {
            return Ok(true);
        }

        let stderr = stderr_of(&output);
        if stderr.contains("already exists") {
            return Ok(false);
        }
        Err(anyhow!("git tag {} failed: {}", tag_name, stderr))
    }

    async fn delete_tag(&self, repository: &Repository, tag_name: &str) -> Result<bool> {
        let output = self.run(repository, &["tag", "-d", "--", tag_name]).await?;

        if output.status.success() {
            return Ok(true);
        }

        let stderr = stderr_of(&output);
        if stderr.contains("not found") {
            return Ok(false);
        }
        Err(anyhow!("git tag -d {} failed: {}", tag_name, stderr))
    }

    async fn list_tags(&self, repository: &Repository) -> Result<Vec<Tag>> {
        let output = self
            .run(repository, &["for-each-ref", TAG_FORMAT, "refs/tags"])
            .await?;

        if !output.status.success() {
            return Err(anyhow!(
                "git for-each-ref failed for {}: {}",
                repository.full_name(),
                stderr_of(&output)
            ));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let mut tags: Vec<Tag> = stdout.lines().filter_map(parse_tag_line).collect();
        tags.sort_by(Tag::newest_first);
        Ok(tags)
    }
}
