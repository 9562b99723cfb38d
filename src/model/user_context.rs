use serde::{Deserialize, Serialize};

use crate::model::Id;

/// Viewer identity extracted from request headers. Anonymous viewers have no
/// user id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserContext {
    pub user_id: Option<Id>,
    pub user_name: Option<String>,
}

impl UserContext {
    /// Create a new UserContext with just a user ID
    pub fn new(user_id: impl Into<Id>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            user_name: None,
        }
    }

    pub fn with_details(user_id: Id, name: Option<String>) -> Self {
        Self {
            user_id: Some(user_id),
            user_name: name,
        }
    }

    pub fn anonymous() -> Self {
        Self {
            user_id: None,
            user_name: None,
        }
    }

    pub fn is_anonymous(&self) -> bool {
        self.user_id.is_none()
    }
}

impl Default for UserContext {
    fn default() -> Self {
        Self::anonymous()
    }
}

/// Access level of a viewer on one repository, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    None,
    Read,
    Write,
    Admin,
}

impl Capability {
    pub fn can_read(self) -> bool {
        self >= Capability::Read
    }

    pub fn can_write(self) -> bool {
        self >= Capability::Write
    }

    /// Drafts are only visible to viewers who could publish them.
    pub fn can_see_drafts(self) -> bool {
        self.can_write()
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Capability::None => write!(f, "none"),
            Capability::Read => write!(f, "read"),
            Capability::Write => write!(f, "write"),
            Capability::Admin => write!(f, "admin"),
        }
    }
}

impl std::str::FromStr for Capability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(Capability::None),
            "read" => Ok(Capability::Read),
            "write" => Ok(Capability::Write),
            "admin" => Ok(Capability::Admin),
            _ => Err(format!("Unknown capability: {}", s)),
        }
    }
}
