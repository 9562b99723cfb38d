use parking_lot::RwLock;
use std::collections::HashMap;

use crate::error::{RegistryError, Result};
use crate::model::{
    normalize_tag_name, Capability, Id, NewRelease, Release, ReleaseId, Repository, UserContext,
};
use crate::store::traits::{
    effective_capability, PermissionProvider, ReleaseStore, RepositoryStore, Store,
};

#[derive(Debug, Default)]
struct MemoryState {
    next_release_id: ReleaseId,
    repositories: HashMap<Id, Repository>,
    releases: HashMap<ReleaseId, Release>,
    /// (repository_id, user_id) -> granted capability
    collaborators: HashMap<(Id, Id), Capability>,
}

impl MemoryState {
    fn tagged_conflict(&self, repository_id: &Id, tag_name: &str, except: Option<ReleaseId>) -> bool {
        let lower = normalize_tag_name(tag_name);
        self.releases.values().any(|r| {
            r.repository_id == *repository_id
                && r.has_tag
                && Some(r.id) != except
                && r.lower_tag_name() == lower
        })
    }
}

/// In-process store. Every operation runs under a single lock, so a listing
/// reads one consistent snapshot and colliding inserts are serialized.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(MemoryState {
                next_release_id: 1,
                ..Default::default()
            }),
        }
    }

    /// Grant a collaborator capability on a repository.
    pub fn set_collaborator(&self, repository_id: &Id, user_id: &Id, capability: Capability) {
        self.state
            .write()
            .collaborators
            .insert((repository_id.clone(), user_id.clone()), capability);
    }
}

#[async_trait::async_trait]
impl RepositoryStore for MemoryStore {
    async fn get_repository(&self, id: &Id) -> Result<Option<Repository>> {
        Ok(self.state.read().repositories.get(id).cloned())
    }

    async fn get_repository_by_name(&self, owner: &str, name: &str) -> Result<Option<Repository>> {
        let state = self.state.read();
        Ok(state
            .repositories
            .values()
            .find(|r| r.owner.eq_ignore_ascii_case(owner) && r.name.eq_ignore_ascii_case(name))
            .cloned())
    }

    async fn upsert_repository(&self, repository: Repository) -> Result<()> {
        self.state
            .write()
            .repositories
            .insert(repository.id.clone(), repository);
        Ok(())
    }
}

#[async_trait::async_trait]
impl ReleaseStore for MemoryStore {
    async fn insert_release(&self, release: NewRelease) -> Result<Release> {
        let mut state = self.state.write();

        // A draft may not claim a name already bound to a tagged release either
        if !release.tag_name.is_empty()
            && state.tagged_conflict(&release.repository_id, &release.tag_name, None)
        {
            return Err(RegistryError::DuplicateTag(release.tag_name));
        }

        let id = state.next_release_id.max(1);
        state.next_release_id = id + 1;

        let release = release.into_release(id);
        state.releases.insert(id, release.clone());
        Ok(release)
    }

    async fn list_releases(&self, repository_id: &Id) -> Result<Vec<Release>> {
        let state = self.state.read();
        let mut releases: Vec<Release> = state
            .releases
            .values()
            .filter(|r| r.repository_id == *repository_id)
            .cloned()
            .collect();
        Release::sort_newest_first(&mut releases);
        Ok(releases)
    }

    async fn get_release(&self, repository_id: &Id, id: ReleaseId) -> Result<Option<Release>> {
        Ok(self
            .state
            .read()
            .releases
            .get(&id)
            .filter(|r| r.repository_id == *repository_id)
            .cloned())
    }

    async fn find_release_by_tag(&self, repository_id: &Id, tag_name: &str) -> Result<Option<Release>> {
        let lower = normalize_tag_name(tag_name);
        let mut matches: Vec<Release> = self
            .state
            .read()
            .releases
            .values()
            .filter(|r| r.repository_id == *repository_id && r.lower_tag_name() == lower)
            .cloned()
            .collect();
        Release::sort_newest_first(&mut matches);

        let tagged = matches.iter().position(|r| r.has_tag);
        Ok(match tagged {
            Some(index) => Some(matches.swap_remove(index)),
            None => matches.into_iter().next(),
        })
    }

    async fn update_release(&self, release: Release) -> Result<()> {
        let mut state = self.state.write();

        match state.releases.get(&release.id) {
            Some(existing) if existing.repository_id == release.repository_id => {}
            _ => return Err(RegistryError::not_found(format!("release {}", release.id))),
        }

        if release.has_tag
            && state.tagged_conflict(&release.repository_id, &release.tag_name, Some(release.id))
        {
            return Err(RegistryError::DuplicateTag(release.tag_name));
        }

        state.releases.insert(release.id, release);
        Ok(())
    }

    async fn delete_release(&self, repository_id: &Id, id: ReleaseId) -> Result<bool> {
        let mut state = self.state.write();
        let owned = state
            .releases
            .get(&id)
            .is_some_and(|r| r.repository_id == *repository_id);
        if owned {
            state.releases.remove(&id);
        }
        Ok(owned)
    }
}

#[async_trait::async_trait]
impl PermissionProvider for MemoryStore {
    async fn capability(&self, viewer: &UserContext, repository: &Repository) -> Result<Capability> {
        let granted = viewer.user_id.as_ref().and_then(|user_id| {
            self.state
                .read()
                .collaborators
                .get(&(repository.id.clone(), user_id.clone()))
                .copied()
        });
        Ok(effective_capability(viewer, repository, granted))
    }
}

impl Store for MemoryStore {}
