mod common;

use common::*;
use draftloom::history::HistoryEngine;
use draftloom::model::Position;
use draftloom::session::EditorSession;

fn session() -> EditorSession {
    open_session()
}

#[test]
fn n_mutations_then_n_undos_round_trip_exactly() {
    let mut session = session();
    let initial = session.graph.canonical_json().unwrap();

    let mut snapshots = Vec::new();
    for i in 0..5 {
        session
            .move_node("agent-1", Position::new(240.0 + f64::from(i) * 10.0, 50.0))
            .unwrap();
        snapshots.push(session.graph.canonical_json().unwrap());
    }

    for _ in 0..5 {
        assert!(session.undo().unwrap());
    }
    assert_eq!(session.graph.canonical_json().unwrap(), initial);
    assert!(!session.undo().unwrap());

    // One redo restores the first mutation's serialization.
    assert!(session.redo().unwrap());
    assert_eq!(session.graph.canonical_json().unwrap(), snapshots[0]);
}

#[test]
fn redo_after_five_undos_walks_back_to_the_last_mutation() {
    let mut session = session();
    for i in 0..3 {
        session
            .move_node("agent-1", Position::new(300.0 + f64::from(i), 0.0))
            .unwrap();
    }
    let last = session.graph.canonical_json().unwrap();

    while session.undo().unwrap() {}
    while session.redo().unwrap() {}
    assert_eq!(session.graph.canonical_json().unwrap(), last);
}

#[test]
fn drag_produces_exactly_one_history_entry() {
    let mut session = session();

    session.begin_drag();
    for i in 1..=7 {
        session
            .move_node("agent-1", Position::new(240.0 + f64::from(i) * 5.0, 0.0))
            .unwrap();
    }
    session.end_drag().unwrap();

    let dragged = session.graph.canonical_json().unwrap();
    // One undo jumps all the way back to the pre-drag state.
    assert!(session.undo().unwrap());
    assert_eq!(
        session.graph.node("agent-1").unwrap().position,
        Position::new(240.0, 0.0)
    );
    // And one redo restores the final drag position.
    assert!(session.redo().unwrap());
    assert_eq!(session.graph.canonical_json().unwrap(), dragged);
}

#[test]
fn drag_with_no_net_change_records_nothing() {
    let mut session = session();
    session.begin_drag();
    session
        .move_node("agent-1", Position::new(100.0, 0.0))
        .unwrap();
    session
        .move_node("agent-1", Position::new(240.0, 0.0))
        .unwrap();
    session.end_drag().unwrap();

    assert!(!session.undo().unwrap());
}

#[test]
fn a_new_edit_clears_the_redo_stack() {
    let mut engine = HistoryEngine::new();
    engine.reset("a");
    engine.observe("b", false);
    engine.undo();
    assert!(engine.can_redo());

    engine.observe("c", false);
    assert!(!engine.can_redo());
    assert_eq!(engine.undo(), Some("a".to_string()));
}

#[test]
fn past_stack_is_bounded() {
    let mut engine = HistoryEngine::with_capacity(5);
    engine.reset("base");
    for i in 0..20 {
        engine.observe(&format!("snap-{i}"), false);
    }
    let mut undone = 0;
    while engine.undo().is_some() {
        undone += 1;
    }
    assert_eq!(undone, 5);
}

#[test]
fn restoring_flag_absorbs_exactly_one_observation() {
    let mut engine = HistoryEngine::new();
    engine.reset("a");
    engine.observe("b", false);

    // A background reload re-observes equivalent content; it must not
    // become an undoable entry.
    engine.mark_restoring();
    engine.observe("b-normalized", false);
    assert_eq!(engine.last_snapshot(), Some("b-normalized"));

    // The very next real edit records normally.
    engine.observe("c", false);
    assert_eq!(engine.undo(), Some("b-normalized".to_string()));
    assert_eq!(engine.undo(), Some("a".to_string()));
    assert_eq!(engine.undo(), None);
}

#[test]
fn preview_mode_disables_history() {
    let mut session = session();
    session.set_preview(true);
    session
        .move_node("agent-1", Position::new(999.0, 0.0))
        .unwrap();
    assert!(!session.undo().unwrap());

    session.set_preview(false);
    session
        .move_node("agent-1", Position::new(111.0, 0.0))
        .unwrap();
    assert!(session.undo().unwrap());
}

#[test]
fn loading_a_version_resets_history() {
    let mut session = session();
    session
        .move_node("agent-1", Position::new(300.0, 0.0))
        .unwrap();
    assert!(session.history.can_undo());

    session
        .load_version("v-2", seeded_graph().payload(), false)
        .unwrap();
    assert!(!session.history.can_undo());
    assert!(!session.pending_changes());
}

#[test]
fn background_reload_does_not_create_a_history_entry() {
    let mut session = session();
    session
        .move_node("agent-1", Position::new(300.0, 0.0))
        .unwrap();

    // Simulate the post-save rehydration of the same logical content.
    session.history.mark_restoring();
    let payload = session.graph.payload();
    session.load_version("v-1", payload, true).unwrap();

    // The single real edit is still the only undoable entry.
    assert!(session.undo().unwrap());
    assert_eq!(
        session.graph.node("agent-1").unwrap().position,
        Position::new(240.0, 0.0)
    );
    assert!(!session.undo().unwrap());
}

#[test]
fn unrecognized_kinds_are_dropped_on_restore() {
    let mut session = session();
    // Hand-craft a snapshot carrying an unknown kind.
    let mut payload = session.graph.payload();
    let mut alien = payload.nodes[1].clone();
    alien.slug = "alien-1".to_string();
    alien.kind = draftloom::types::NodeKind::Other("telepathy".to_string());
    payload.nodes.push(alien);
    session.load_version("v-9", payload, false).unwrap();

    assert!(!session.graph.contains_slug("alien-1"));
    assert_eq!(session.graph.nodes.len(), 2);
}
