use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;

use crate::model::{Id, Repository, Tag};
use crate::vcs::VersionControl;

#[derive(Debug, Default)]
struct RepoRefs {
    /// branch name -> head commit
    branches: HashMap<String, String>,
    /// commit id -> commit time
    commits: HashMap<String, DateTime<Utc>>,
    /// tag name -> commit id
    tags: HashMap<String, String>,
}

impl RepoRefs {
    fn resolve(&self, commitish: &str) -> Option<String> {
        if let Some(commit) = self.branches.get(commitish) {
            return Some(commit.clone());
        }
        if let Some(commit) = self.tags.get(commitish) {
            return Some(commit.clone());
        }
        self.commits.contains_key(commitish).then(|| commitish.to_string())
    }

    fn tag(&self, name: &str) -> Option<Tag> {
        let commit_id = self.tags.get(name)?;
        Some(Tag {
            name: name.to_string(),
            commit_id: commit_id.clone(),
            committed_at: self.commits.get(commit_id).copied().unwrap_or_default(),
        })
    }
}

/// Version control backed by plain maps, for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryVersionControl {
    repositories: Mutex<HashMap<Id, RepoRefs>>,
}

impl MemoryVersionControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a commit and move `branch` to it.
    pub fn push_commit(&self, repository_id: &Id, branch: &str, commit_id: &str, committed_at: DateTime<Utc>) {
        let mut repositories = self.repositories.lock();
        let refs = repositories.entry(repository_id.clone()).or_default();
        refs.commits.insert(commit_id.to_string(), committed_at);
        refs.branches.insert(branch.to_string(), commit_id.to_string());
    }

    pub fn has_tag(&self, repository_id: &Id, tag_name: &str) -> bool {
        self.repositories
            .lock()
            .get(repository_id)
            .is_some_and(|refs| refs.tags.contains_key(tag_name))
    }
}

#[async_trait::async_trait]
impl VersionControl for MemoryVersionControl {
    async fn resolve_commitish(&self, repository: &Repository, commitish: &str) -> Result<Option<String>> {
        Ok(self
            .repositories
            .lock()
            .get(&repository.id)
            .and_then(|refs| refs.resolve(commitish)))
    }

    async fn create_tag(&self, repository: &Repository, tag_name: &str, commit_id: &str) -> Result<bool> {
        let mut repositories = self.repositories.lock();
        let refs = repositories
            .get_mut(&repository.id)
            .ok_or_else(|| anyhow!("Repository '{}' has no commits", repository.full_name()))?;

        if !refs.commits.contains_key(commit_id) {
            return Err(anyhow!("Unknown commit '{}'", commit_id));
        }
        if refs.tags.contains_key(tag_name) {
            return Ok(false);
        }
        refs.tags.insert(tag_name.to_string(), commit_id.to_string());
        Ok(true)
    }

    async fn delete_tag(&self, repository: &Repository, tag_name: &str) -> Result<bool> {
        Ok(self
            .repositories
            .lock()
            .get_mut(&repository.id)
            .is_some_and(|refs| refs.tags.remove(tag_name).is_some()))
    }

    async fn list_tags(&self, repository: &Repository) -> Result<Vec<Tag>> {
        let repositories = self.repositories.lock();
        let Some(refs) = repositories.get(&repository.id) else {
            return Ok(Vec::new());
        };

        let mut tags: Vec<Tag> = refs.tags.keys().filter_map(|name| refs.tag(name)).collect();
        tags.sort_by(Tag::newest_first);
        Ok(tags)
    }

    async fn get_tag(&self, repository: &Repository, tag_name: &str) -> Result<Option<Tag>> {
        Ok(self
            .repositories
            .lock()
            .get(&repository.id)
            .and_then(|refs| refs.tag(tag_name)))
    }
}
