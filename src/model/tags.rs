use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ReleaseId;

/// A version-control tag as reported by the version-control collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    /// Tag name (the part after `refs/tags/`)
    pub name: String,
    /// Commit the tag resolves to
    pub commit_id: String,
    /// Commit time of the tagged commit
    pub committed_at: DateTime<Utc>,
}

/// One row of the tag listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagEntry {
    pub name: String,
    pub commit_id: String,
    pub committed_at: DateTime<Utc>,
    /// Release bound to this tag, when one is visible to the viewer
    pub release_id: Option<ReleaseId>,
    /// Whether the viewer may delete the tag
    pub can_delete: bool,
}

/// Request to create a tag without release metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTag {
    pub tag_name: String,
    #[serde(default)]
    pub target_commitish: String,
}

impl Tag {
    /// Tag listing order: newest tagged commit first, name ascending on ties.
    pub fn newest_first(a: &Tag, b: &Tag) -> std::cmp::Ordering {
        b.committed_at
            .cmp(&a.committed_at)
            .then_with(|| a.name.cmp(&b.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn tag(name: &str, secs: i64) -> Tag {
        Tag {
            name: name.to_string(),
            commit_id: "65f1bf27bc3bf70f64657658635e66094edbcb4d".to_string(),
            committed_at: Utc.timestamp_opt(secs, 0).unwrap(),
        }
    }

    #[test]
    fn test_tag_ordering() {
        let mut tags = vec![tag("v1.1", 100), tag("delete-tag", 200), tag("alpha", 100)];
        tags.sort_by(Tag::newest_first);
        let names: Vec<_> = tags.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["delete-tag", "alpha", "v1.1"]);
    }
}
