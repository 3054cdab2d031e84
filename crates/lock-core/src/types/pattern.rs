//! Identity name patterns
//!
//! Identity names are `/`-separated chains (`front_door/key/friend`). A pattern
//! is matched by the name it spells and by every extension of it, so
//! `front_door/key` is matched by `front_door/key` and `front_door/key/friend`
//! but not by `front_door` or `front_door/keyring`. A pattern ending in `/$`
//! is matched only by the exact name, and `...` is matched by every name.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Separator between the components of an identity name
pub const CHAIN_SEPARATOR: &str = "/";

/// Pattern matched by every identity, including unauthenticated callers
pub const ALL_PRINCIPALS: &str = "...";

const EXACT_SUFFIX: &str = "/$";

/// A pattern over identity names
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct IdentityPattern(String);

impl IdentityPattern {
    /// Create a pattern from its textual form
    pub fn new(pattern: impl Into<String>) -> Self {
        Self(pattern.into())
    }

    /// The allow-everyone pattern
    pub fn all_principals() -> Self {
        Self(ALL_PRINCIPALS.to_string())
    }

    /// Pattern matched by `name` and all of its extensions
    pub fn extending(name: &str, extension: &str) -> Self {
        Self(format!("{name}{CHAIN_SEPARATOR}{extension}"))
    }

    /// Textual form
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is the allow-everyone pattern
    pub fn is_all_principals(&self) -> bool {
        self.0 == ALL_PRINCIPALS
    }

    /// Whether the pattern is well-formed
    pub fn is_valid(&self) -> bool {
        if self.is_all_principals() {
            return true;
        }
        let body = self.0.strip_suffix(EXACT_SUFFIX).unwrap_or(&self.0);
        !body.is_empty() && body.split(CHAIN_SEPARATOR).all(|part| !part.is_empty())
    }

    /// True iff any of `names` matches this pattern
    pub fn matched_by<S: AsRef<str>>(&self, names: &[S]) -> bool {
        if !self.is_valid() {
            return false;
        }
        if self.is_all_principals() {
            return true;
        }
        names.iter().any(|name| self.matches_one(name.as_ref()))
    }

    fn matches_one(&self, name: &str) -> bool {
        if let Some(exact) = self.0.strip_suffix(EXACT_SUFFIX) {
            return name == exact;
        }
        let mut pattern_parts = self.0.split(CHAIN_SEPARATOR);
        let mut name_parts = name.split(CHAIN_SEPARATOR);
        loop {
            match (pattern_parts.next(), name_parts.next()) {
                (None, _) => return true,
                (Some(_), None) => return false,
                (Some(p), Some(n)) if p != n => return false,
                _ => {}
            }
        }
    }
}

impl fmt::Display for IdentityPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for IdentityPattern {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// True iff one name is the other or an extension of it
pub fn names_related<S: AsRef<str>, T: AsRef<str>>(a: &[S], b: &[T]) -> bool {
    a.iter().any(|x| {
        b.iter().any(|y| {
            IdentityPattern::new(x.as_ref()).matched_by(&[y.as_ref()])
                || IdentityPattern::new(y.as_ref()).matched_by(&[x.as_ref()])
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_matching() {
        let pattern = IdentityPattern::new("front_door/key");
        assert!(pattern.matched_by(&["front_door/key"]));
        assert!(pattern.matched_by(&["front_door/key/friend"]));
        assert!(!pattern.matched_by(&["front_door"]));
        assert!(!pattern.matched_by(&["front_door/keyring"]));
        assert!(!pattern.matched_by::<&str>(&[]));
    }

    #[test]
    fn test_exact_and_all_principals() {
        let exact = IdentityPattern::new("front_door/$");
        assert!(exact.matched_by(&["front_door"]));
        assert!(!exact.matched_by(&["front_door/key"]));

        assert!(IdentityPattern::all_principals().matched_by(&["anyone"]));
        assert!(IdentityPattern::all_principals().matched_by::<&str>(&[]));
    }

    #[test]
    fn test_invalid_patterns_match_nothing() {
        assert!(!IdentityPattern::new("").matched_by(&[""]));
        assert!(!IdentityPattern::new("a//b").matched_by(&["a//b"]));
        assert!(!IdentityPattern::new("/$").matched_by(&[""]));
    }

    #[test]
    fn test_names_related() {
        assert!(names_related(&["front_door"], &["front_door/key"]));
        assert!(names_related(&["front_door/key/friend"], &["front_door"]));
        assert!(!names_related(&["back_door"], &["front_door/key"]));
    }
}
