//! Property-based tests for the textual encodings of targets and merge
//! policies.

#[cfg(test)]
mod proptest_tests {
    use crate::envvar::EnvVars;
    use crate::merge::{merge_env, MergeAction, MergePolicies, MergePolicy, Separator};
    use crate::target::Target;
    use proptest::prelude::*;

    fn action_strategy() -> impl Strategy<Value = MergeAction> {
        prop_oneof![
            Just(MergeAction::First),
            Just(MergeAction::Last),
            Just(MergeAction::Ignore),
            Just(MergeAction::Append),
            Just(MergeAction::Prepend),
            Just(MergeAction::IgnoreBaseAppend),
            Just(MergeAction::IgnoreBasePrepend),
            Just(MergeAction::IgnoreBaseUseFirst),
            Just(MergeAction::IgnoreBaseUseLast),
            Just(MergeAction::IgnoreProfiles),
        ]
    }

    fn policy_strategy() -> impl Strategy<Value = MergePolicy> {
        let separator = prop_oneof![Just(Separator::Path), Just(Separator::Flag)];
        (action_strategy(), separator)
            .prop_map(|(action, separator)| MergePolicy::new(action, separator))
    }

    fn policies_strategy() -> impl Strategy<Value = MergePolicies> {
        prop::collection::btree_map("[A-Z][A-Z0-9_]{0,8}", policy_strategy(), 0..8)
            .prop_map(|map| map.into_iter().collect())
    }

    // ============================================================================
    // Target property tests
    // ============================================================================

    proptest! {
        /// Property: displaying a parsed target gives back the input
        #[test]
        fn target_display_parse_round_trip(
            tag in "([a-z][a-z0-9]{0,5})?",
            arch in "[a-z0-9_]{1,8}",
            os in "[a-z0-9_]{1,8}",
            version in "([0-9][0-9.]{0,5})?",
        ) {
            let mut input = String::new();
            if !tag.is_empty() {
                input.push_str(&tag);
                input.push('=');
            }
            input.push_str(&arch);
            input.push('-');
            input.push_str(&os);
            if !version.is_empty() {
                input.push('@');
                input.push_str(&version);
            }
            let target = Target::parse(&input).unwrap();
            prop_assert_eq!(&target.arch, &arch);
            prop_assert_eq!(&target.os, &os);
            prop_assert_eq!(&target.version, &version);
            prop_assert_eq!(target.to_string(), input);
        }

        /// Property: a string without '-' is never a valid target
        #[test]
        fn target_without_dash_is_rejected(input in "[a-z0-9@]{0,12}") {
            prop_assert!(Target::parse(&input).is_err());
        }

        /// Property: the target specific directory name has no separators
        #[test]
        fn target_dirname_is_filesystem_safe(
            arch in "[a-z0-9]{1,6}",
            os in "[a-z0-9]{1,6}",
            version in "[0-9a-z@:/.]{0,6}",
        ) {
            let target = Target::new(arch, os).with_version(version);
            let dirname = target.target_specific_dirname();
            prop_assert!(!dirname.contains('/'));
            prop_assert!(!dirname.contains(':'));
            prop_assert!(!dirname.contains('@'));
        }
    }

    // ============================================================================
    // Merge policy property tests
    // ============================================================================

    proptest! {
        /// Property: parsing the encoding of a policy set gives back the same set
        #[test]
        fn merge_policies_encode_parse_round_trip(policies in policies_strategy()) {
            let encoded = policies.to_string();
            let parsed: MergePolicies = encoded.parse().unwrap();
            prop_assert_eq!(parsed, policies);
        }

        /// Property: the encoding is canonical
        #[test]
        fn merge_policies_encoding_is_stable(policies in policies_strategy()) {
            let once = policies.to_string();
            let twice = once.parse::<MergePolicies>().unwrap().to_string();
            prop_assert_eq!(once, twice);
        }

        /// Property: merging never introduces variables with an Ignore policy
        #[test]
        fn merge_env_drops_ignored_vars(
            base_value in "[a-z]{0,5}",
            layer_values in prop::collection::vec("[a-z]{0,5}", 0..4),
        ) {
            let policies: MergePolicies = [("X", MergePolicy::ignore())].into_iter().collect();
            let mut base = EnvVars::from_entries(&[format!("X={}", base_value)]);
            let layers: Vec<Vec<String>> = layer_values
                .iter()
                .map(|v| vec![format!("X={}", v)])
                .collect();
            merge_env(&policies, &mut base, &layers);
            prop_assert!(!base.contains("X"));
        }
    }
}
