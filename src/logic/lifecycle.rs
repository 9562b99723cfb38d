use anyhow::anyhow;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::{RegistryError, Result};
use crate::model::{
    is_valid_tag_name, Capability, CreateRelease, EditRelease, LabelPrecedence, NewRelease, NewTag,
    Reference, Release, ReleaseId, ReleaseLabel, Repository, Tag, UserContext,
};
use crate::store::traits::Store;
use crate::vcs::VersionControl;

/// A single release with its resolved display state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReleaseDetail {
    #[serde(flatten)]
    pub release: Release,
    pub label: ReleaseLabel,
    pub reference: Reference,
}

/// Release state transitions, coordinated with the version-control
/// collaborator. Tags are created before metadata is written and rolled back
/// if the write fails.
pub struct ReleaseLifecycle;

impl ReleaseLifecycle {
    async fn require_write<S: Store>(
        store: &S,
        repository: &Repository,
        viewer: &UserContext,
    ) -> Result<Capability> {
        let capability = store.capability(viewer, repository).await?;
        if !capability.can_write() {
            return Err(RegistryError::PermissionDenied);
        }
        Ok(capability)
    }

    fn target_or_default(target: &str, repository: &Repository) -> String {
        let target = target.trim();
        if target.is_empty() {
            repository.default_branch.clone()
        } else {
            target.to_string()
        }
    }

    async fn resolve_target<V: VersionControl>(
        vcs: &V,
        repository: &Repository,
        target: &str,
    ) -> Result<String> {
        vcs.resolve_commitish(repository, target)
            .await?
            .ok_or_else(|| RegistryError::InvalidTarget(target.to_string()))
    }

    async fn reject_tagged_duplicate<S: Store>(
        store: &S,
        repository: &Repository,
        tag_name: &str,
    ) -> Result<()> {
        let tagged = store
            .find_release_by_tag(&repository.id, tag_name)
            .await?
            .is_some_and(|existing| existing.has_tag);
        if tagged {
            return Err(RegistryError::DuplicateTag(tag_name.to_string()));
        }
        Ok(())
    }

    /// Make sure `tag_name` exists in version control. An existing tag with
    /// no release bound to it is adopted. The target must resolve either way.
    /// Returns true when this call created the tag.
    async fn ensure_tag<S: Store, V: VersionControl>(
        store: &S,
        vcs: &V,
        repository: &Repository,
        tag_name: &str,
        target: &str,
    ) -> Result<bool> {
        Self::reject_tagged_duplicate(store, repository, tag_name).await?;
        let commit_id = Self::resolve_target(vcs, repository, target).await?;

        if vcs.get_tag(repository, tag_name).await?.is_some() {
            log::debug!("Adopting existing tag {} in {}", tag_name, repository.full_name());
            return Ok(false);
        }

        Ok(vcs.create_tag(repository, tag_name, &commit_id).await?)
    }

    async fn rollback_tag<V: VersionControl>(vcs: &V, repository: &Repository, tag_name: &str) {
        match vcs.delete_tag(repository, tag_name).await {
            Ok(_) => log::warn!(
                "Rolled back tag {} in {} after failed release write",
                tag_name,
                repository.full_name()
            ),
            Err(e) => log::error!(
                "Failed to roll back tag {} in {}: {:#}",
                tag_name,
                repository.full_name(),
                e
            ),
        }
    }

    /// Create a release. Publishing creates (or adopts) the tag; a draft only
    /// checks that its target resolves.
    pub async fn create<S: Store, V: VersionControl>(
        store: &S,
        vcs: &V,
        repository: &Repository,
        viewer: &UserContext,
        request: CreateRelease,
    ) -> Result<Release> {
        Self::require_write(store, repository, viewer).await?;
        let publisher_id = viewer.user_id.clone().ok_or(RegistryError::PermissionDenied)?;

        let title = request.title.trim();
        if title.is_empty() {
            return Err(RegistryError::EmptyTitle);
        }

        let tag_name = request.tag_name.trim().to_string();
        if (request.publish || !tag_name.is_empty()) && !is_valid_tag_name(&tag_name) {
            return Err(RegistryError::InvalidTagName(tag_name));
        }

        let target = Self::target_or_default(&request.target_commitish, repository);
        let created_tag = if request.publish {
            Self::ensure_tag(store, vcs, repository, &tag_name, &target).await?
        } else {
            if !tag_name.is_empty() {
                Self::reject_tagged_duplicate(store, repository, &tag_name).await?;
            }
            Self::resolve_target(vcs, repository, &target).await?;
            false
        };

        let new_release = NewRelease {
            repository_id: repository.id.clone(),
            tag_name: tag_name.clone(),
            target_commitish: target,
            title: title.to_string(),
            body: request.body,
            is_prerelease: request.is_prerelease,
            publish: request.publish,
            publisher_id,
            created_at: Utc::now(),
        };

        match store.insert_release(new_release).await {
            Ok(release) => {
                log::info!(
                    "Created {} release {} ({}) in {}",
                    if release.is_draft { "draft" } else { "published" },
                    release.id,
                    release.tag_name,
                    repository.full_name()
                );
                Ok(release)
            }
            Err(err) => {
                // A concurrent create that won the race now owns the tag
                if created_tag && !matches!(err, RegistryError::DuplicateTag(_)) {
                    Self::rollback_tag(vcs, repository, &tag_name).await;
                }
                Err(err)
            }
        }
    }

    /// Apply an edit. Tag name and target can only change while the release
    /// has no tag; `publish` turns a draft into a tagged release.
    pub async fn update<S: Store, V: VersionControl>(
        store: &S,
        vcs: &V,
        repository: &Repository,
        viewer: &UserContext,
        id: ReleaseId,
        edit: EditRelease,
    ) -> Result<Release> {
        Self::require_write(store, repository, viewer).await?;

        let mut release = store
            .get_release(&repository.id, id)
            .await?
            .ok_or_else(|| RegistryError::not_found(format!("release {}", id)))?;

        if let Some(title) = edit.title {
            let title = title.trim();
            if title.is_empty() {
                return Err(RegistryError::EmptyTitle);
            }
            release.title = title.to_string();
        }
        if let Some(body) = edit.body {
            release.body = body;
        }
        if let Some(is_prerelease) = edit.is_prerelease {
            release.is_prerelease = is_prerelease;
        }

        if let Some(tag_name) = edit.tag_name {
            let tag_name = tag_name.trim().to_string();
            if tag_name != release.tag_name {
                if release.has_tag || (!tag_name.is_empty() && !is_valid_tag_name(&tag_name)) {
                    return Err(RegistryError::InvalidTagName(tag_name));
                }
                if !tag_name.is_empty() {
                    Self::reject_tagged_duplicate(store, repository, &tag_name).await?;
                }
                release.tag_name = tag_name;
            }
        }

        if let Some(target) = edit.target_commitish {
            if !release.has_tag {
                let target = Self::target_or_default(&target, repository);
                Self::resolve_target(vcs, repository, &target).await?;
                release.target_commitish = target;
            }
        }

        let mut created_tag = false;
        if edit.publish && release.is_draft {
            if !release.has_tag {
                if !is_valid_tag_name(&release.tag_name) {
                    return Err(RegistryError::InvalidTagName(release.tag_name));
                }
                created_tag = Self::ensure_tag(
                    store,
                    vcs,
                    repository,
                    &release.tag_name,
                    &release.target_commitish,
                )
                .await?;
                release.has_tag = true;
            }
            release.is_draft = false;
        }

        match store.update_release(release.clone()).await {
            Ok(()) => {
                log::info!(
                    "Updated release {} ({}) in {}{}",
                    release.id,
                    release.tag_name,
                    repository.full_name(),
                    if edit.publish { ", published" } else { "" }
                );
                Ok(release)
            }
            Err(err) => {
                if created_tag && !matches!(err, RegistryError::DuplicateTag(_)) {
                    Self::rollback_tag(vcs, repository, &release.tag_name).await;
                }
                Err(err)
            }
        }
    }

    /// Remove a release record, and its tag when `delete_tag` is set.
    pub async fn delete<S: Store, V: VersionControl>(
        store: &S,
        vcs: &V,
        repository: &Repository,
        viewer: &UserContext,
        id: ReleaseId,
        delete_tag: bool,
    ) -> Result<()> {
        Self::require_write(store, repository, viewer).await?;

        let release = store
            .get_release(&repository.id, id)
            .await?
            .ok_or_else(|| RegistryError::not_found(format!("release {}", id)))?;

        if !store.delete_release(&repository.id, id).await? {
            return Err(RegistryError::not_found(format!("release {}", id)));
        }

        if delete_tag && release.has_tag {
            vcs.delete_tag(repository, &release.tag_name).await?;
        }

        log::info!(
            "Deleted release {} ({}) in {}{}",
            release.id,
            release.tag_name,
            repository.full_name(),
            if delete_tag { " with its tag" } else { "" }
        );
        Ok(())
    }

    /// Create a tag with no release metadata.
    pub async fn create_tag<S: Store, V: VersionControl>(
        store: &S,
        vcs: &V,
        repository: &Repository,
        viewer: &UserContext,
        request: NewTag,
    ) -> Result<Tag> {
        Self::require_write(store, repository, viewer).await?;

        let tag_name = request.tag_name.trim().to_string();
        if !is_valid_tag_name(&tag_name) {
            return Err(RegistryError::InvalidTagName(tag_name));
        }

        let tagged_release = store
            .find_release_by_tag(&repository.id, &tag_name)
            .await?
            .is_some_and(|r| r.has_tag);
        if tagged_release || vcs.get_tag(repository, &tag_name).await?.is_some() {
            return Err(RegistryError::DuplicateTag(tag_name));
        }

        let target = Self::target_or_default(&request.target_commitish, repository);
        let commit_id = Self::resolve_target(vcs, repository, &target).await?;
        if !vcs.create_tag(repository, &tag_name, &commit_id).await? {
            return Err(RegistryError::DuplicateTag(tag_name));
        }

        log::info!("Created tag {} at {} in {}", tag_name, commit_id, repository.full_name());

        let tag = vcs
            .get_tag(repository, &tag_name)
            .await?
            .ok_or_else(|| anyhow!("Tag {} missing right after creation", tag_name))?;
        Ok(tag)
    }

    /// Delete a tag and any release bound to it.
    pub async fn delete_tag<S: Store, V: VersionControl>(
        store: &S,
        vcs: &V,
        repository: &Repository,
        viewer: &UserContext,
        tag_name: &str,
    ) -> Result<()> {
        Self::require_write(store, repository, viewer).await?;

        if vcs.get_tag(repository, tag_name).await?.is_none() {
            return Err(RegistryError::not_found(format!("tag {}", tag_name)));
        }

        if let Some(release) = store.find_release_by_tag(&repository.id, tag_name).await? {
            if release.has_tag {
                store.delete_release(&repository.id, release.id).await?;
            }
        }

        vcs.delete_tag(repository, tag_name).await?;
        log::info!("Deleted tag {} in {}", tag_name, repository.full_name());
        Ok(())
    }

    /// Look up one release by tag name, hiding drafts from viewers who
    /// cannot see them.
    pub async fn get_by_tag<S: Store>(
        store: &S,
        repository: &Repository,
        viewer: &UserContext,
        tag_name: &str,
        precedence: LabelPrecedence,
    ) -> Result<ReleaseDetail> {
        let capability = store.capability(viewer, repository).await?;
        if !capability.can_read() {
            return Err(RegistryError::PermissionDenied);
        }

        let release = store
            .find_release_by_tag(&repository.id, tag_name)
            .await?
            .ok_or_else(|| RegistryError::not_found(format!("release {}", tag_name)))?;

        if release.is_draft && !capability.can_see_drafts() {
            return Err(RegistryError::PermissionDenied);
        }

        Ok(ReleaseDetail {
            label: release.label(precedence),
            reference: release.reference(&repository.default_branch),
            release,
        })
    }
}
