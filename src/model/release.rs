use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::model::{normalize_tag_name, Id, ReleaseId};

/// Release metadata, optionally backed by a version-control tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Release {
    pub id: ReleaseId,
    pub repository_id: Id,
    /// May be empty for a draft that never picked a tag name
    pub tag_name: String,
    /// Branch or commit the tag points to, or will point to once published
    pub target_commitish: String,
    pub title: String,
    pub body: String,
    pub is_draft: bool,
    pub is_prerelease: bool,
    /// True once the version-control tag exists
    pub has_tag: bool,
    pub publisher_id: Id,
    pub created_at: DateTime<Utc>,
}

impl Release {
    pub fn lower_tag_name(&self) -> String {
        normalize_tag_name(&self.tag_name)
    }

    /// The anchor this release is compared against: its tag once published,
    /// otherwise the repository's default branch.
    pub fn reference(&self, default_branch: &str) -> Reference {
        if self.has_tag {
            Reference::Tag(self.tag_name.clone())
        } else {
            Reference::Branch(default_branch.to_string())
        }
    }

    pub fn label(&self, precedence: LabelPrecedence) -> ReleaseLabel {
        match precedence {
            LabelPrecedence::DraftFirst => {
                if self.is_draft {
                    ReleaseLabel::Draft
                } else if self.is_prerelease {
                    ReleaseLabel::Prerelease
                } else {
                    ReleaseLabel::Stable
                }
            }
            LabelPrecedence::PrereleaseFirst => {
                if self.is_prerelease {
                    ReleaseLabel::Prerelease
                } else if self.is_draft {
                    ReleaseLabel::Draft
                } else {
                    ReleaseLabel::Stable
                }
            }
        }
    }

    /// Listing order: newest `created_at` first, higher id first on ties.
    pub fn newest_first(a: &Release, b: &Release) -> Ordering {
        b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id))
    }

    pub fn sort_newest_first(releases: &mut [Release]) {
        releases.sort_by(Self::newest_first);
    }
}

/// Comparison anchor of a release row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "name", rename_all = "lowercase")]
pub enum Reference {
    Tag(String),
    Branch(String),
}

impl Reference {
    pub fn name(&self) -> &str {
        match self {
            Reference::Tag(name) | Reference::Branch(name) => name,
        }
    }
}

impl std::fmt::Display for Reference {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Display state of a release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseLabel {
    Draft,
    Prerelease,
    Stable,
}

impl std::fmt::Display for ReleaseLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            ReleaseLabel::Draft => write!(f, "draft"),
            ReleaseLabel::Prerelease => write!(f, "prerelease"),
            ReleaseLabel::Stable => write!(f, "stable"),
        }
    }
}

impl std::str::FromStr for ReleaseLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "draft" => Ok(ReleaseLabel::Draft),
            "prerelease" => Ok(ReleaseLabel::Prerelease),
            "stable" => Ok(ReleaseLabel::Stable),
            _ => Err(format!("Unknown release label: {}", s)),
        }
    }
}

/// Which flag wins when a release is both a draft and a prerelease.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelPrecedence {
    #[default]
    DraftFirst,
    PrereleaseFirst,
}

/// A release about to be persisted. The store allocates the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRelease {
    pub repository_id: Id,
    pub tag_name: String,
    pub target_commitish: String,
    pub title: String,
    pub body: String,
    pub is_prerelease: bool,
    /// Publish immediately (tag exists) instead of saving a draft
    pub publish: bool,
    pub publisher_id: Id,
    pub created_at: DateTime<Utc>,
}

impl NewRelease {
    pub fn into_release(self, id: ReleaseId) -> Release {
        Release {
            id,
            repository_id: self.repository_id,
            tag_name: self.tag_name,
            target_commitish: self.target_commitish,
            title: self.title,
            body: self.body,
            is_draft: !self.publish,
            is_prerelease: self.is_prerelease,
            has_tag: self.publish,
            publisher_id: self.publisher_id,
            created_at: self.created_at,
        }
    }
}

/// Caller-facing creation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateRelease {
    pub tag_name: String,
    /// Empty means the repository's default branch
    #[serde(default)]
    pub target_commitish: String,
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub is_prerelease: bool,
    #[serde(default = "default_publish")]
    pub publish: bool,
}

fn default_publish() -> bool {
    true
}

/// Partial edit of an existing release. `publish` turns a draft into a
/// tagged release; it has no effect on releases that are already published.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EditRelease {
    pub title: Option<String>,
    pub body: Option<String>,
    pub tag_name: Option<String>,
    pub target_commitish: Option<String>,
    pub is_prerelease: Option<bool>,
    #[serde(default)]
    pub publish: bool,
}
