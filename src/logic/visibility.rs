use crate::model::{Capability, Release};

/// Drops drafts the viewer is not allowed to see. Runs before pagination, so
/// page boundaries and totals depend on who is asking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibilityFilter {
    can_see_drafts: bool,
}

impl VisibilityFilter {
    pub fn new(can_see_drafts: bool) -> Self {
        Self { can_see_drafts }
    }

    pub fn for_capability(capability: Capability) -> Self {
        Self::new(capability.can_see_drafts())
    }

    pub fn can_see_drafts(&self) -> bool {
        self.can_see_drafts
    }

    pub fn is_visible(&self, release: &Release) -> bool {
        self.can_see_drafts || !release.is_draft
    }

    /// Filter preserving the incoming order.
    pub fn apply<'a>(&self, releases: &'a [Release]) -> Vec<&'a Release> {
        releases.iter().filter(|r| self.is_visible(r)).collect()
    }
}
