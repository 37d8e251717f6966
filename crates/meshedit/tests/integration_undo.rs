//! Integration tests for commit staging, undo and redo.

use glam::Vec3;
use meshedit::fixtures;
use meshedit::harness::TestHarness;
use meshedit::{EngineSettings, TrackOptions};

#[test]
fn test_undo_restores_only_the_committed_object() {
    let mut h = TestHarness::new();
    let a = h.add_cube("a", 1.0, [-1.0, 0.0, 0.0]);
    let b = h.add_cube("b", 1.0, [1.0, 0.0, 0.0]);
    let original = fixtures::cube_mesh(1.0);
    let mut ctl = h.open_all(TrackOptions::pickable());

    ctl.session_mut(&a)
        .unwrap()
        .topology_mut()
        .translate_vertex(3, Vec3::X)
        .unwrap();
    assert!(ctl.stage_commit(&a, true));
    // `b` is untouched so there is nothing to commit
    assert!(!ctl.stage_commit(&b, true));
    assert!(ctl.push_commits());
    assert_ne!(ctl.host().mesh(&a), Some(&original));

    let writes = ctl.host().write_count();
    assert!(ctl.undo_commits(true));
    assert_eq!(ctl.host().mesh(&a), Some(&original));
    assert_eq!(ctl.host().mesh(&b), Some(&original));
    // Only `a` was written back
    assert_eq!(ctl.host().write_count(), writes + 1);
    assert_eq!(ctl.session(&a).unwrap().topology().position(3), Some(Vec3::new(-0.5, 0.5, -0.5)));
    assert!(ctl.session(&a).unwrap().ray_is_current());
}

#[test]
fn test_undo_depth_is_bounded() {
    let mut h = TestHarness::with_settings(EngineSettings {
        undo_depth: 3,
        ..EngineSettings::default()
    });
    let a = h.add_cube("a", 1.0, [0.0, 0.0, 0.0]);
    let mut ctl = h.open_all(TrackOptions::pickable());

    let mut history = vec![ctl.session(&a).unwrap().committed().clone()];
    for _ in 0..4 {
        ctl.session_mut(&a)
            .unwrap()
            .topology_mut()
            .translate_vertex(0, Vec3::Y)
            .unwrap();
        assert!(ctl.stage_commit(&a, false));
        assert!(ctl.push_commits());
        history.push(ctl.session(&a).unwrap().committed().clone());
    }
    assert_eq!(ctl.undo_len(), 3);

    for expected in history[1..4].iter().rev() {
        assert!(ctl.undo_commits(false));
        assert_eq!(ctl.host().mesh(&a), Some(expected));
    }
    // The first edit fell off the bottom of the history
    assert!(!ctl.undo_commits(false));
    assert_eq!(ctl.host().mesh(&a), Some(&history[1]));
}

#[test]
fn test_redo_and_new_push_clears_redo() {
    let mut h = TestHarness::new();
    let a = h.add_cube("a", 1.0, [0.0, 0.0, 0.0]);
    let mut ctl = h.open_all(TrackOptions::pickable());

    ctl.session_mut(&a)
        .unwrap()
        .topology_mut()
        .translate_vertex(0, Vec3::NEG_Z)
        .unwrap();
    ctl.stage_commit(&a, true);
    ctl.push_commits();
    let edited = ctl.session(&a).unwrap().committed().clone();

    assert!(ctl.undo_commits(true));
    assert!(ctl.can_redo());
    assert!(ctl.redo_commits(true));
    assert_eq!(ctl.host().mesh(&a), Some(&edited));
    assert!(ctl.can_undo());
    assert!(!ctl.can_redo());

    assert!(ctl.undo_commits(true));
    ctl.session_mut(&a)
        .unwrap()
        .topology_mut()
        .translate_vertex(1, Vec3::X)
        .unwrap();
    ctl.stage_commit(&a, true);
    ctl.push_commits();
    assert!(!ctl.can_redo());
    assert!(!ctl.redo_commits(true));
}

#[test]
fn test_multi_object_step_is_atomic() {
    let mut h = TestHarness::new();
    let a = h.add_cube("a", 1.0, [-1.0, 0.0, 0.0]);
    let b = h.add_cube("b", 1.0, [1.0, 0.0, 0.0]);
    let original = fixtures::cube_mesh(1.0);
    let mut ctl = h.open_all(TrackOptions::pickable());

    for id in [&a, &b] {
        ctl.session_mut(id)
            .unwrap()
            .topology_mut()
            .translate_vertex(5, Vec3::ONE)
            .unwrap();
        assert!(ctl.stage_commit(id, true));
    }
    // A second commit of `a` in the same step keeps the first undo state
    ctl.session_mut(&a)
        .unwrap()
        .topology_mut()
        .translate_vertex(5, Vec3::ONE)
        .unwrap();
    assert!(ctl.stage_commit(&a, true));
    assert!(ctl.push_commits());
    assert_eq!(ctl.undo_len(), 1);

    assert!(ctl.undo_commits(true));
    assert_eq!(ctl.host().mesh(&a), Some(&original));
    assert_eq!(ctl.host().mesh(&b), Some(&original));
    assert!(!ctl.can_undo());
}

#[test]
fn test_undo_with_empty_history() {
    let mut h = TestHarness::new();
    let a = h.add_cube("a", 1.0, [0.0, 0.0, 0.0]);
    let mut ctl = h.open_all(TrackOptions::pickable());
    let writes = ctl.host().write_count();

    assert!(!ctl.can_undo());
    assert!(!ctl.undo_commits(true));
    assert!(!ctl.push_commits());
    assert_eq!(ctl.host().write_count(), writes);
    assert_eq!(ctl.host().mesh(&a), Some(&fixtures::cube_mesh(1.0)));
}

#[test]
fn test_undo_discards_unpushed_commits_first() {
    let mut h = TestHarness::new();
    let a = h.add_cube("a", 1.0, [0.0, 0.0, 0.0]);
    let mut ctl = h.open_all(TrackOptions::pickable());

    ctl.session_mut(&a)
        .unwrap()
        .topology_mut()
        .translate_vertex(2, Vec3::X)
        .unwrap();
    assert!(ctl.stage_commit(&a, true));
    assert!(ctl.push_commits());

    ctl.session_mut(&a)
        .unwrap()
        .topology_mut()
        .translate_vertex(2, Vec3::X)
        .unwrap();
    assert!(ctl.stage_commit(&a, true));

    assert!(ctl.undo_commits(true));
    assert_eq!(ctl.host().mesh(&a), Some(&fixtures::cube_mesh(1.0)));
    assert!(!ctl.session(&a).unwrap().is_dirty());
}
