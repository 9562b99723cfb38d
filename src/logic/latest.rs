use serde::{Deserialize, Serialize};

use crate::model::{LabelPrecedence, Release, ReleaseId, ReleaseLabel};

/// Banner for the newest release the viewer can see.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatestRelease {
    pub release_id: ReleaseId,
    pub tag_name: String,
    pub title: String,
    pub label: ReleaseLabel,
}

/// `visible` must already be filtered and ordered newest first; the latest
/// release is its head, independent of which page is being shown.
pub fn resolve_latest(visible: &[&Release], precedence: LabelPrecedence) -> Option<LatestRelease> {
    visible.first().map(|release| LatestRelease {
        release_id: release.id,
        tag_name: release.tag_name.clone(),
        title: release.title.clone(),
        label: release.label(precedence),
    })
}
