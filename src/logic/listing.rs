use serde::{Deserialize, Serialize};

use crate::config::ReleaseConfig;
use crate::error::{RegistryError, Result};
use crate::logic::compare::{CompareLink, CompareMatrix};
use crate::logic::latest::{resolve_latest, LatestRelease};
use crate::logic::paginate::{paginate, PageRequest};
use crate::logic::visibility::VisibilityFilter;
use crate::model::{LabelPrecedence, Reference, Release, ReleaseLabel, Repository, UserContext};
use crate::store::traits::Store;

/// Everything a listing request reads from storage, captured once.
#[derive(Debug, Clone)]
pub struct ReleaseSnapshot {
    pub repository: Repository,
    /// All releases of the repository, newest first
    pub releases: Vec<Release>,
}

/// A release as rendered in a listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReleaseRow {
    #[serde(flatten)]
    pub release: Release,
    pub label: ReleaseLabel,
    pub reference: Reference,
    pub compare: Vec<CompareLink>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReleaseListing {
    pub releases: Vec<ReleaseRow>,
    pub page: usize,
    pub page_size: usize,
    pub total_count: usize,
    pub total_pages: usize,
    pub latest: Option<LatestRelease>,
}

impl ReleaseSnapshot {
    pub async fn capture<S: Store>(store: &S, repository: Repository) -> Result<Self> {
        let releases = store.list_releases(&repository.id).await?;
        Ok(Self {
            repository,
            releases,
        })
    }

    /// Filter, paginate, resolve the latest banner and build compare links,
    /// all from this one snapshot.
    pub fn render(
        &self,
        filter: VisibilityFilter,
        page: usize,
        page_size: usize,
        precedence: LabelPrecedence,
    ) -> ReleaseListing {
        let visible = filter.apply(&self.releases);
        let latest = resolve_latest(&visible, precedence);
        let matrix = CompareMatrix::build(&self.repository.link(), &visible);
        let default_branch = &self.repository.default_branch;

        let page = paginate(&visible, page, page_size).map(|release| {
            let reference = release.reference(default_branch);
            ReleaseRow {
                release: release.clone(),
                label: release.label(precedence),
                compare: matrix.links_for(&reference),
                reference,
            }
        });

        ReleaseListing {
            releases: page.items,
            page: page.page,
            page_size: page.page_size,
            total_count: page.total_count,
            total_pages: page.total_pages,
            latest,
        }
    }
}

/// List one page of releases as seen by `viewer`.
pub async fn list_releases<S: Store>(
    store: &S,
    repository: &Repository,
    viewer: &UserContext,
    request: PageRequest,
    config: &ReleaseConfig,
) -> Result<ReleaseListing> {
    let capability = store.capability(viewer, repository).await?;
    if !capability.can_read() {
        return Err(RegistryError::PermissionDenied);
    }

    let snapshot = ReleaseSnapshot::capture(store, repository.clone()).await?;
    let listing = snapshot.render(
        VisibilityFilter::for_capability(capability),
        request.page_number(),
        config.effective_page_size(request.page_size),
        config.label_precedence,
    );

    log::debug!(
        "Listed releases of {} for {} viewer: page {} of {}, {} visible",
        repository.full_name(),
        capability,
        listing.page,
        listing.total_pages,
        listing.total_count
    );

    Ok(listing)
}
