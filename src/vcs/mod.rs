//! Version-control collaborator: commit resolution and tag management.
//!
//! The registry never touches git objects itself; every tag it creates or
//! removes goes through a [`VersionControl`] implementation.

pub mod memory;
pub mod system_git;

pub use memory::MemoryVersionControl;
pub use system_git::SystemGit;

use anyhow::Result;

use crate::model::{Repository, Tag};

#[async_trait::async_trait]
pub trait VersionControl: Send + Sync {
    /// Resolve a branch, tag or commit id to a commit id. `None` when the
    /// reference does not exist.
    async fn resolve_commitish(&self, repository: &Repository, commitish: &str) -> Result<Option<String>>;

    /// Create a lightweight tag. Returns `false` when the tag already existed
    /// and nothing was written.
    async fn create_tag(&self, repository: &Repository, tag_name: &str, commit_id: &str) -> Result<bool>;

    /// Returns `false` when there was no such tag.
    async fn delete_tag(&self, repository: &Repository, tag_name: &str) -> Result<bool>;

    async fn list_tags(&self, repository: &Repository) -> Result<Vec<Tag>>;

    async fn get_tag(&self, repository: &Repository, tag_name: &str) -> Result<Option<Tag>> {
        Ok(self
            .list_tags(repository)
            .await?
            .into_iter()
            .find(|tag| tag.name == tag_name))
    }
}
