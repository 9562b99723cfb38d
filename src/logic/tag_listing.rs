use std::collections::HashMap;

use crate::config::ReleaseConfig;
use crate::error::{RegistryError, Result};
use crate::logic::paginate::{paginate, Page, PageRequest};
use crate::logic::visibility::VisibilityFilter;
use crate::model::{normalize_tag_name, Release, ReleaseId, Repository, Tag, TagEntry, UserContext};
use crate::store::traits::Store;
use crate::vcs::VersionControl;

/// Join version-control tags with the releases bound to them. Tags without a
/// release are listed too; drafts hidden from the viewer are not linked.
pub fn tag_entries(
    mut tags: Vec<Tag>,
    releases: &[Release],
    filter: VisibilityFilter,
    can_delete: bool,
) -> Vec<TagEntry> {
    let by_tag: HashMap<String, ReleaseId> = releases
        .iter()
        .filter(|r| r.has_tag && filter.is_visible(r))
        .map(|r| (r.lower_tag_name(), r.id))
        .collect();

    tags.sort_by(Tag::newest_first);
    tags.into_iter()
        .map(|tag| TagEntry {
            release_id: by_tag.get(&normalize_tag_name(&tag.name)).copied(),
            name: tag.name,
            commit_id: tag.commit_id,
            committed_at: tag.committed_at,
            can_delete,
        })
        .collect()
}

/// List one page of the repository's tags.
pub async fn list_tags<S: Store, V: VersionControl>(
    store: &S,
    vcs: &V,
    repository: &Repository,
    viewer: &UserContext,
    request: PageRequest,
    config: &ReleaseConfig,
) -> Result<Page<TagEntry>> {
    let capability = store.capability(viewer, repository).await?;
    if !capability.can_read() {
        return Err(RegistryError::PermissionDenied);
    }

    let tags = vcs.list_tags(repository).await?;
    let releases = store.list_releases(&repository.id).await?;
    let entries = tag_entries(
        tags,
        &releases,
        VisibilityFilter::for_capability(capability),
        capability.can_write(),
    );

    Ok(paginate(
        &entries,
        request.page_number(),
        config.effective_page_size(request.page_size),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn tag(name: &str, secs: i64) -> Tag {
        Tag {
            name: name.to_string(),
            commit_id: format!("{}-commit", name),
            committed_at: Utc.timestamp_opt(secs, 0).unwrap(),
        }
    }

    fn release(id: i64, tag: &str) -> Release {
        Release {
            id,
            repository_id: "1".to_string(),
            tag_name: tag.to_string(),
            target_commitish: "master".to_string(),
            title: tag.to_string(),
            body: String::new(),
            is_draft: false,
            is_prerelease: false,
            has_tag: true,
            publisher_id: "user2".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_tags_without_release_are_listed() {
        let entries = tag_entries(
            vec![tag("v1.1", 100), tag("delete-tag", 200)],
            &[release(1, "V1.1")],
            VisibilityFilter::new(false),
            true,
        );

        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["delete-tag", "v1.1"]);
        assert_eq!(entries[0].release_id, None);
        assert_eq!(entries[1].release_id, Some(1));
        assert!(entries.iter().all(|e| e.can_delete));
    }

    #[test]
    fn test_same_commit_time_sorts_by_name() {
        let entries = tag_entries(
            vec![tag("b", 100), tag("a", 100), tag("c", 50)],
            &[],
            VisibilityFilter::new(true),
            false,
        );
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert!(!entries[0].can_delete);
    }
}
