use serde::Serialize;
use std::collections::BTreeSet;

/// The set of permission codes held by one user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Permissions(BTreeSet<String>);

impl Permissions {
    #[must_use]
    pub fn includes(&self, code: &str) -> bool {
        self.0.contains(code)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for Permissions {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_includes() {
        let perms: Permissions = ["movies:read", "movies:write"].into_iter().collect();
        assert!(perms.includes("movies:read"));
        assert!(!perms.includes("permissions:write"));
        assert!(!Permissions::default().includes("movies:read"));
    }

    #[test]
    fn test_duplicates_collapse() {
        let perms: Permissions = ["movies:read", "movies:read"].into_iter().collect();
        assert_eq!(perms.len(), 1);
        assert_eq!(serde_json::to_string(&perms).unwrap(), r#"["movies:read"]"#);
    }
}
