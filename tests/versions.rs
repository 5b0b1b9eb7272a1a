mod common;

use common::*;
use draftloom::versions::{
    DRAFT_DISPLAY_NAME, VersionRegistry, resolve_draft_candidate, sort_versions_with_draft_first,
};
use proptest::prelude::*;

#[test]
fn draft_is_highest_non_active_above_active() {
    let versions = vec![
        version("v1", 1, true),
        version("v2", 2, false),
        version("v3", 3, false),
    ];
    assert_eq!(resolve_draft_candidate(&versions).unwrap().id, "v3");
}

#[test]
fn no_draft_when_active_is_highest() {
    let versions = vec![
        version("v1", 1, false),
        version("v2", 2, false),
        version("v3", 3, true),
    ];
    assert!(resolve_draft_candidate(&versions).is_none());
}

#[test]
fn without_active_version_any_non_active_qualifies() {
    let versions = vec![version("v1", 1, false), version("v2", 2, false)];
    assert_eq!(resolve_draft_candidate(&versions).unwrap().id, "v2");
}

#[test]
fn draft_sorts_first_regardless_of_number() {
    let mut versions = vec![
        version("1", 3, true),
        version("2", 1, false),
        version("3", 2, false),
    ];
    sort_versions_with_draft_first(&mut versions, Some("2"));
    let order: Vec<_> = versions.iter().map(|v| v.id.as_str()).collect();
    assert_eq!(order, ["2", "1", "3"]);
}

#[test]
fn active_sorts_before_inactive_at_equal_number() {
    let mut versions = vec![version("a", 2, false), version("b", 2, true)];
    sort_versions_with_draft_first(&mut versions, None);
    let order: Vec<_> = versions.iter().map(|v| v.id.as_str()).collect();
    assert_eq!(order, ["b", "a"]);
}

#[test]
fn registry_adopt_derives_draft_and_overrides_its_name() {
    let mut registry = VersionRegistry::new();
    registry.adopt(vec![version("v1", 1, true), version("v2", 2, false)]);

    assert_eq!(registry.draft_id(), Some("v2"));
    let ordered = registry.ordered();
    assert_eq!(ordered[0].id, "v2");
    assert_eq!(registry.display_name(&ordered[0]), DRAFT_DISPLAY_NAME);
    assert_eq!(registry.display_name(&ordered[1]), "v1");
}

#[test]
fn vanished_draft_is_reconstructed_synthetically_while_authoritative() {
    let mut registry = VersionRegistry::new();
    registry.adopt(vec![version("v1", 1, true), version("draft", 2, false)]);
    assert_eq!(registry.draft_id(), Some("draft"));

    // The refreshed list momentarily omits the draft.
    registry.apply_refresh(vec![version("v1", 1, true)], true);

    assert_eq!(registry.draft_id(), Some("draft"));
    assert!(registry.draft_is_synthetic());
    let synthetic = registry.version("draft").unwrap();
    assert_eq!(synthetic.version, 2);
    assert!(!synthetic.is_active);
}

#[test]
fn synthetic_draft_is_discarded_when_the_real_one_reappears() {
    let mut registry = VersionRegistry::new();
    registry.adopt(vec![version("v1", 1, true), version("draft", 2, false)]);
    registry.apply_refresh(vec![version("v1", 1, true)], true);
    assert!(registry.draft_is_synthetic());

    let mut server_draft = version("draft", 2, false);
    server_draft.name = "server copy".to_string();
    registry.apply_refresh(vec![version("v1", 1, true), server_draft], true);

    assert!(!registry.draft_is_synthetic());
    assert_eq!(registry.version("draft").unwrap().name, "server copy");
}

#[test]
fn vanished_draft_is_dropped_when_not_authoritative() {
    let mut registry = VersionRegistry::new();
    registry.adopt(vec![version("v1", 1, true), version("draft", 2, false)]);

    registry.apply_refresh(vec![version("v1", 1, true)], false);

    assert_eq!(registry.draft_id(), None);
    assert!(registry.version("draft").is_none());
}

proptest! {
    /// The draft-first ordering is deterministic for equal inputs, puts
    /// the draft first, and strictly descends by version number among
    /// the rest.
    #[test]
    fn ordering_is_total_and_deterministic(
        numbers in proptest::collection::vec(1i64..50, 1..12),
        draft_pick in any::<prop::sample::Index>(),
    ) {
        let versions: Vec<_> = numbers
            .iter()
            .enumerate()
            .map(|(i, n)| version(&format!("id-{i}"), *n, false))
            .collect();
        let draft_id = versions[draft_pick.index(versions.len())].id.clone();

        let mut first = versions.clone();
        sort_versions_with_draft_first(&mut first, Some(&draft_id));
        let mut second = versions.clone();
        sort_versions_with_draft_first(&mut second, Some(&draft_id));

        // Same input, same output — and the draft leads.
        let first_ids: Vec<_> = first.iter().map(|v| v.id.clone()).collect();
        let second_ids: Vec<_> = second.iter().map(|v| v.id.clone()).collect();
        prop_assert_eq!(first_ids, second_ids);
        prop_assert_eq!(first[0].id.as_str(), draft_id.as_str());

        // Version numbers never ascend after the draft entry.
        for pair in first[1..].windows(2) {
            prop_assert!(pair[0].version >= pair[1].version);
        }

        // A permuted input still yields the same number sequence.
        let mut reversed: Vec<_> = versions.iter().rev().cloned().collect();
        sort_versions_with_draft_first(&mut reversed, Some(&draft_id));
        let numbers_a: Vec<_> = first.iter().map(|v| v.version).collect();
        let numbers_b: Vec<_> = reversed.iter().map(|v| v.version).collect();
        prop_assert_eq!(numbers_a, numbers_b);
    }
}
