use crate::model::Id;
use serde::{Deserialize, Serialize};

/// The slice of a hosted repository the registry needs: where it lives and
/// which branch unpublished drafts compare against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repository {
    pub id: Id,
    pub owner_id: Id,
    pub owner: String,
    pub name: String,
    pub default_branch: String,
    pub is_private: bool,
}

impl Repository {
    pub fn new(id: Id, owner_id: Id, owner: String, name: String) -> Self {
        Self {
            id,
            owner_id,
            owner,
            name,
            default_branch: "master".to_string(),
            is_private: false,
        }
    }

    pub fn with_default_branch(mut self, default_branch: impl Into<String>) -> Self {
        self.default_branch = default_branch.into();
        self
    }

    pub fn private(mut self) -> Self {
        self.is_private = true;
        self
    }

    /// Path prefix for repository pages, e.g. `/user2/repo1`.
    pub fn link(&self) -> String {
        format!("/{}/{}", self.owner, self.name)
    }

    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}
