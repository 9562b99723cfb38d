/// Opaque identifier for repositories and users, owned by the hosting platform.
pub type Id = String;

/// Release ids are allocated by the store and grow monotonically.
pub type ReleaseId = i64;

/// Tag names are compared case-insensitively within a repository.
pub fn normalize_tag_name(tag_name: &str) -> String {
    tag_name.to_lowercase()
}

pub fn tag_names_equal(a: &str, b: &str) -> bool {
    normalize_tag_name(a) == normalize_tag_name(b)
}

/// A tag name usable as a version-control ref: non-empty, no whitespace or
/// control characters, and none of the sequences git refuses in ref names.
pub fn is_valid_tag_name(tag_name: &str) -> bool {
    !tag_name.is_empty()
        && !tag_name.starts_with('-')
        && !tag_name.starts_with('/')
        && !tag_name.ends_with('/')
        && !tag_name.ends_with(".lock")
        && !tag_name.contains("..")
        && !tag_name.contains("@{")
        && !tag_name
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || matches!(c, '~' | '^' | ':' | '?' | '*' | '[' | '\\'))
}
