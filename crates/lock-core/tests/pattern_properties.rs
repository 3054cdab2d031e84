//! Property tests for identity name patterns

use lock_core::types::names_related;
use lock_core::IdentityPattern;
use proptest::prelude::*;

fn component() -> impl Strategy<Value = String> {
    "[a-z_]{1,8}"
}

fn name() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(component(), 1..4)
}

proptest! {
    #[test]
    fn pattern_matches_its_extensions(base in name(), tail in name()) {
        let pattern = IdentityPattern::new(base.join("/"));
        let extended = format!("{}/{}", base.join("/"), tail.join("/"));
        prop_assert!(pattern.matched_by(&[base.join("/")]));
        prop_assert!(pattern.matched_by(&[extended.as_str()]));
    }

    #[test]
    fn exact_pattern_rejects_extensions(base in name(), tail in name()) {
        let pattern = IdentityPattern::new(format!("{}/$", base.join("/")));
        let extended = format!("{}/{}", base.join("/"), tail.join("/"));
        prop_assert!(pattern.matched_by(&[base.join("/")]));
        prop_assert!(!pattern.matched_by(&[extended]));
    }

    #[test]
    fn extension_does_not_match_its_prefix(base in name(), tail in name()) {
        let extended = IdentityPattern::new(format!("{}/{}", base.join("/"), tail.join("/")));
        prop_assert!(!extended.matched_by(&[base.join("/")]));
    }

    #[test]
    fn names_related_is_symmetric(a in name(), b in name()) {
        let (a, b) = (a.join("/"), b.join("/"));
        prop_assert_eq!(names_related(&[&a], &[&b]), names_related(&[&b], &[&a]));
    }
}
