use thiserror::Error;

/// Failures surfaced by the registry. All of them are per-request outcomes.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("a release with tag '{0}' already exists")]
    DuplicateTag(String),

    #[error("target '{0}' cannot be resolved to a commit")]
    InvalidTarget(String),

    #[error("release title cannot be empty")]
    EmptyTitle,

    #[error("invalid tag name '{0}'")]
    InvalidTagName(String),

    #[error("permission denied")]
    PermissionDenied,

    #[error("{0} not found")]
    NotFound(String),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl RegistryError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// Validation failures the caller is expected to correct and resubmit.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::DuplicateTag(_) | Self::InvalidTarget(_) | Self::EmptyTitle | Self::InvalidTagName(_)
        )
    }
}

pub type Result<T, E = RegistryError> = std::result::Result<T, E>;
