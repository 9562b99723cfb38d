use crate::error::Result;
use crate::model::{Capability, Id, NewRelease, Release, ReleaseId, Repository, UserContext};

#[async_trait::async_trait]
pub trait RepositoryStore: Send + Sync {
    async fn get_repository(&self, id: &Id) -> Result<Option<Repository>>;
    async fn get_repository_by_name(&self, owner: &str, name: &str) -> Result<Option<Repository>>;
    async fn upsert_repository(&self, repository: Repository) -> Result<()>;
}

/// Durable release metadata. Implementations enforce tag-name uniqueness
/// among tagged releases atomically with the write.
#[async_trait::async_trait]
pub trait ReleaseStore: Send + Sync {
    /// Persist a new release, failing with `DuplicateTag` when a tagged
    /// release with the same case-insensitive name exists
    async fn insert_release(&self, release: NewRelease) -> Result<Release>;
    /// All releases of a repository, newest first, unfiltered
    async fn list_releases(&self, repository_id: &Id) -> Result<Vec<Release>>;
    async fn get_release(&self, repository_id: &Id, id: ReleaseId) -> Result<Option<Release>>;
    /// Case-insensitive lookup; a tagged release wins over drafts sharing the name
    async fn find_release_by_tag(&self, repository_id: &Id, tag_name: &str) -> Result<Option<Release>>;
    /// Overwrite an existing release. Same uniqueness rule as inserts.
    async fn update_release(&self, release: Release) -> Result<()>;
    /// Remove the record only; the version-control tag is left alone
    async fn delete_release(&self, repository_id: &Id, id: ReleaseId) -> Result<bool>;
}

#[async_trait::async_trait]
pub trait PermissionProvider: Send + Sync {
    async fn capability(&self, viewer: &UserContext, repository: &Repository) -> Result<Capability>;
}

pub trait Store: RepositoryStore + ReleaseStore + PermissionProvider + Send + Sync {}

/// Combine ownership, explicit grants and repository visibility into the
/// viewer's effective capability.
pub fn effective_capability(
    viewer: &UserContext,
    repository: &Repository,
    granted: Option<Capability>,
) -> Capability {
    if viewer.user_id.as_deref() == Some(repository.owner_id.as_str()) {
        return Capability::Admin;
    }

    let baseline = if repository.is_private {
        Capability::None
    } else {
        Capability::Read
    };

    match (viewer.is_anonymous(), granted) {
        (false, Some(granted)) => granted.max(baseline),
        _ => baseline,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo() -> Repository {
        Repository::new("1".into(), "user2".into(), "user2".into(), "repo1".into())
    }

    #[test]
    fn test_owner_is_admin() {
        let viewer = UserContext::new("user2");
        assert_eq!(effective_capability(&viewer, &repo(), None), Capability::Admin);
    }

    #[test]
    fn test_public_repository_grants_read() {
        assert_eq!(effective_capability(&UserContext::anonymous(), &repo(), None), Capability::Read);
        assert_eq!(effective_capability(&UserContext::new("user4"), &repo(), None), Capability::Read);
        assert_eq!(
            effective_capability(&UserContext::new("user4"), &repo(), Some(Capability::Write)),
            Capability::Write
        );
    }

    #[test]
    fn test_private_repository_requires_grant() {
        let private = repo().private();
        assert_eq!(effective_capability(&UserContext::anonymous(), &private, None), Capability::None);
        assert_eq!(effective_capability(&UserContext::new("user4"), &private, None), Capability::None);
        assert_eq!(
            effective_capability(&UserContext::new("user4"), &private, Some(Capability::Read)),
            Capability::Read
        );
    }
}
