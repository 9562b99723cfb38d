//! Compare-selector links for release rows.
//!
//! Every row offers the same list of tags, taken from the whole visible
//! release set (not the current page), newest first. Only the head side of
//! each URL changes from row to row: a published release compares against its
//! own tag, an untagged draft against the default branch.

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::model::{Reference, Release};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompareLink {
    pub label: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompareMatrix {
    repo_link: String,
    tags: Vec<String>,
}

impl CompareMatrix {
    /// `visible` is the filtered release list in listing order.
    pub fn build(repo_link: &str, visible: &[&Release]) -> Self {
        let tags = visible
            .iter()
            .filter(|r| r.has_tag)
            .map(|r| r.tag_name.clone())
            .unique()
            .collect();

        Self {
            repo_link: repo_link.trim_end_matches('/').to_string(),
            tags,
        }
    }

    /// Distinct tag names offered in every dropdown
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn compare_url(&self, base: &str, head: &Reference) -> String {
        format!("{}/compare/{}...{}", self.repo_link, base, head.name())
    }

    pub fn links_for(&self, head: &Reference) -> Vec<CompareLink> {
        self.tags
            .iter()
            .map(|tag| CompareLink {
                label: tag.clone(),
                url: self.compare_url(tag, head),
            })
            .collect()
    }

    pub fn links_for_release(&self, release: &Release, default_branch: &str) -> Vec<CompareLink> {
        self.links_for(&release.reference(default_branch))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn release(id: i64, tag: &str, has_tag: bool) -> Release {
        Release {
            id,
            repository_id: "1".to_string(),
            tag_name: tag.to_string(),
            target_commitish: "master".to_string(),
            title: tag.to_string(),
            body: String::new(),
            is_draft: !has_tag,
            is_prerelease: false,
            has_tag,
            publisher_id: "2".to_string(),
            created_at: Utc::now(),
        }
    }

    fn pairs(links: &[CompareLink]) -> Vec<(&str, &str)> {
        links.iter().map(|l| (l.label.as_str(), l.url.as_str())).collect()
    }

    #[test]
    fn test_rows_share_tags_and_differ_by_head() {
        let newest = release(3, "v0.0.1", true);
        let draft = release(2, "draft-release", false);
        let oldest = release(1, "v1.1", true);
        let visible = vec![&newest, &draft, &oldest];

        let matrix = CompareMatrix::build("/user2/repo1", &visible);
        assert_eq!(matrix.tags(), &["v0.0.1".to_string(), "v1.1".to_string()]);

        assert_eq!(
            pairs(&matrix.links_for_release(&newest, "master")),
            vec![
                ("v0.0.1", "/user2/repo1/compare/v0.0.1...v0.0.1"),
                ("v1.1", "/user2/repo1/compare/v1.1...v0.0.1"),
            ]
        );
        assert_eq!(
            pairs(&matrix.links_for_release(&draft, "master")),
            vec![
                ("v0.0.1", "/user2/repo1/compare/v0.0.1...master"),
                ("v1.1", "/user2/repo1/compare/v1.1...master"),
            ]
        );
        assert_eq!(
            pairs(&matrix.links_for_release(&oldest, "master")),
            vec![
                ("v0.0.1", "/user2/repo1/compare/v0.0.1...v1.1"),
                ("v1.1", "/user2/repo1/compare/v1.1...v1.1"),
            ]
        );
    }

    #[test]
    fn test_duplicate_tags_keep_first_occurrence() {
        let a = release(3, "v2", true);
        let b = release(2, "v1", true);
        let c = release(1, "v2", true);
        let matrix = CompareMatrix::build("/o/r/", &[&a, &b, &c]);
        assert_eq!(matrix.tags(), &["v2".to_string(), "v1".to_string()]);
        assert_eq!(
            matrix.compare_url("v1", &Reference::Tag("v2".to_string())),
            "/o/r/compare/v1...v2"
        );
    }

    #[test]
    fn test_build_is_deterministic() {
        let a = release(2, "v2", true);
        let b = release(1, "v1", true);
        let first = CompareMatrix::build("/o/r", &[&a, &b]);
        let second = CompareMatrix::build("/o/r", &[&a, &b]);
        assert_eq!(first, second);
        assert_eq!(
            first.links_for_release(&a, "main"),
            second.links_for_release(&a, "main")
        );
    }

    #[test]
    fn test_no_tags_means_empty_dropdown() {
        let draft = release(1, "", false);
        let matrix = CompareMatrix::build("/o/r", &[&draft]);
        assert!(matrix.links_for_release(&draft, "main").is_empty());
    }
}
