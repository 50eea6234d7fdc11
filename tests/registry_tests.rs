mod common;

use common::{registry_with, teams_api, RecordingDispatcher, A, B};
use hypernav::error::NavError;
use std::sync::Arc;
use std::thread;

fn registry() -> hypernav::ApiRegistry {
    registry_with(Arc::new(RecordingDispatcher::default()))
}

#[test]
fn test_owner_lookup_ignores_registration_order() {
    for order in [[A, B], [B, A]] {
        let registry = registry();
        for base in order {
            registry.load_api(teams_api(base)).unwrap();
        }
        let nav = registry
            .get_parent_api_navigator(&format!("{A}/x/y"))
            .unwrap();
        assert_eq!(nav.uri(), A);
        let nav = registry
            .get_parent_api_navigator(&format!("{B}/teams/1"))
            .unwrap();
        assert_eq!(nav.uri(), B);
    }
}

#[test]
fn test_deepest_base_uri_wins() {
    let registry = registry();
    let v2 = format!("{A}/v2");
    registry.load_api(teams_api(A)).unwrap();
    registry.load_api(teams_api(&v2)).unwrap();

    let nav = registry
        .get_parent_api_navigator(&format!("{v2}/teams/1"))
        .unwrap();
    assert_eq!(nav.uri(), v2);
    assert_eq!(
        nav.get_resource_template_id(&format!("{v2}/teams/1"))
            .unwrap()
            .as_str(),
        "/teams/{teamId}"
    );

    // Prefixes are whole segments
    let nav = registry
        .get_parent_api_navigator(&format!("{A}/v20/teams/1"))
        .unwrap();
    assert_eq!(nav.uri(), A);
}

#[test]
fn test_host_is_case_insensitive() {
    let registry = registry();
    registry.load_api(teams_api(A)).unwrap();
    let nav = registry
        .get_parent_api_navigator("HTTP://A.EXAMPLE/teams/1")
        .unwrap();
    assert_eq!(nav.uri(), A);
}

#[test]
fn test_unmanaged_uri() {
    let registry = registry();
    registry.load_api(teams_api(A)).unwrap();
    let err = registry
        .get_parent_api_navigator("http://c.example/teams/1")
        .unwrap_err();
    assert!(matches!(err, NavError::UnmanagedUri { .. }));
}

#[test]
fn test_unload_then_reload() {
    let registry = registry();
    registry.load_api(teams_api(A)).unwrap();
    assert_eq!(registry.len(), 1);

    let removed = registry.unload_api(A).unwrap();
    assert_eq!(removed.uri(), A);
    assert!(registry.is_empty());
    assert!(registry.get_parent_api_navigator(A).is_err());

    registry.load_api(teams_api(A)).unwrap();
    assert!(registry.get_parent_api_navigator(A).is_ok());
}

#[test]
fn test_readers_see_whole_snapshots_during_reload() {
    let registry = registry();
    registry
        .load_api(teams_api(A).with_title("v0"))
        .unwrap();

    thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                for _ in 0..200 {
                    let nav = registry
                        .get_parent_api_navigator(&format!("{A}/teams/1"))
                        .unwrap();
                    assert!(nav.api().title.starts_with('v'));
                    assert!(nav.best_match(&format!("{A}/teams/1")).is_ok());
                }
            });
        }
        for i in 1..=20 {
            registry
                .load_api(teams_api(A).with_title(format!("v{i}")))
                .unwrap();
        }
    });

    assert_eq!(registry.api_navigator(A).unwrap().api().title, "v20");
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_previous_snapshot_stays_usable() {
    let registry = registry();
    registry.load_api(teams_api(A)).unwrap();
    let before = registry.snapshot();
    registry.unload_api(A);

    assert!(before.navigator_for(&format!("{A}/teams/1")).is_some());
    assert!(registry.snapshot().navigator_for(&format!("{A}/teams/1")).is_none());
}
