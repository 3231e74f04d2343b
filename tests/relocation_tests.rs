//! Relocation and push-down scenarios against the in-memory workspace.

use std::collections::HashMap;

use restructure::error::MoveError;
use restructure::models::{
    Callee, ElementId, MemberInfo, ProgramModel, RefShape, SyntaxNode,
};
use restructure::refactor::{
    analyze_push_down_conflicts, notice_channel, MessageCatalog, MoveJournal, MoveOutcome,
    MoveState, RecordingDiagnostics, RelocationOptions, RelocationProcessor,
};
use restructure::workspace::{Snapshot, Workspace};

struct Docs {
    ws: Workspace,
    foo: ElementId,
    bar: ElementId,
    baz: ElementId,
}

/// a/Foo.txt is referenced from b/Bar.txt (twice by path, once by name) and
/// from its sibling a/Baz.txt; Foo.txt itself links back to Bar.
fn docs() -> Docs {
    let mut ws = Workspace::new();
    let foo = ws.add_file_at("a/Foo.txt", "back to ../b/Bar.txt").unwrap();
    let baz = ws.add_file_at("a/Baz.txt", "sibling: Foo.txt").unwrap();
    let bar = ws
        .add_file_at("b/Bar.txt", "see ../a/Foo.txt, ../a/Foo.txt and a.Foo")
        .unwrap();
    ws.ensure_directory("c/deep").unwrap();
    ws.add_rendered_references(bar, foo, RefShape::Path).unwrap();
    ws.add_rendered_references(bar, foo, RefShape::Symbolic).unwrap();
    ws.add_rendered_references(baz, foo, RefShape::Path).unwrap();
    ws.add_rendered_references(foo, bar, RefShape::Path).unwrap();
    Docs { ws, foo, bar, baz }
}

fn contents(ws: &Workspace) -> HashMap<ElementId, String> {
    ws.files()
        .map(|f| (f.id, ws.content(f.id).unwrap_or_default().to_string()))
        .collect()
}

/// Every reference's text is still at its range and resolves to its target.
fn assert_no_dangling(ws: &Workspace) {
    for reference in ws.references() {
        let text = ws.content(reference.owner).unwrap();
        assert_eq!(
            &text[reference.range.start..reference.range.end],
            reference.text,
            "stale range in {}",
            ws.path_of(reference.owner)
        );
        assert_eq!(
            ws.resolve(reference),
            Some(reference.target),
            "{} no longer resolves",
            reference.text
        );
    }
}

fn move_to(ws: &mut Workspace, elements: &[ElementId], destination: &str) -> MoveOutcome {
    let diagnostics = RecordingDiagnostics::new();
    let dest = ws.find(destination).unwrap();
    let mut processor = RelocationProcessor::new(&diagnostics);
    let outcome = processor.run(ws, elements, dest, |_| false).unwrap();
    assert!(diagnostics.errors().is_empty());
    outcome
}

#[test]
fn move_file_rewrites_every_reference() {
    let mut d = docs();
    let outcome = move_to(&mut d.ws, &[d.foo], "c/deep");
    let MoveOutcome::Completed(report) = outcome else {
        panic!("move was rejected");
    };
    assert_eq!(report.moved[0].old_path, "a/Foo.txt");
    assert_eq!(report.moved[0].new_path, "c/deep/Foo.txt");
    assert_eq!(report.rebound, 4);

    assert_eq!(
        d.ws.content(d.bar),
        Some("see ../c/deep/Foo.txt, ../c/deep/Foo.txt and c.deep.Foo")
    );
    assert_eq!(d.ws.content(d.baz), Some("sibling: ../c/deep/Foo.txt"));
    // the moved file's own link follows it
    assert_eq!(d.ws.content(d.foo), Some("back to ../../b/Bar.txt"));
    assert_no_dangling(&d.ws);
}

#[test]
fn move_and_move_back_restores_text() {
    let mut d = docs();
    let before = contents(&d.ws);

    move_to(&mut d.ws, &[d.foo], "c/deep");
    assert_ne!(contents(&d.ws), before);
    move_to(&mut d.ws, &[d.foo], "a");

    assert_eq!(contents(&d.ws), before);
    assert_eq!(d.ws.path_of(d.foo), "a/Foo.txt");
    assert_no_dangling(&d.ws);
}

#[test]
fn move_directory_rewrites_descendant_references() {
    let mut d = docs();
    let a = d.ws.find("a").unwrap();
    move_to(&mut d.ws, &[a], "c");

    assert_eq!(d.ws.path_of(d.foo), "c/a/Foo.txt");
    assert_eq!(
        d.ws.content(d.bar),
        Some("see ../c/a/Foo.txt, ../c/a/Foo.txt and c.a.Foo")
    );
    // relative links inside the moved directory stay as they are
    assert_eq!(d.ws.content(d.baz), Some("sibling: Foo.txt"));
    assert_eq!(d.ws.content(d.foo), Some("back to ../../b/Bar.txt"));
    assert_no_dangling(&d.ws);
}

#[test]
fn moving_referrer_and_target_together() {
    let mut d = docs();
    move_to(&mut d.ws, &[d.foo, d.bar], "c/deep");

    assert_eq!(
        d.ws.content(d.bar),
        Some("see Foo.txt, Foo.txt and c.deep.Foo")
    );
    assert_eq!(d.ws.content(d.foo), Some("back to Bar.txt"));
    assert_no_dangling(&d.ws);
}

#[test]
fn conflicting_move_is_rejected_untouched() {
    let mut d = docs();
    d.ws.add_file_at("c/Foo.txt", "other").unwrap();
    let before = contents(&d.ws);

    let diagnostics = RecordingDiagnostics::new();
    let dest = d.ws.find("c").unwrap();
    let mut processor = RelocationProcessor::new(&diagnostics);
    let mut asked = 0;
    let outcome = processor
        .run(&mut d.ws, &[d.foo], dest, |conflicts| {
            asked += 1;
            assert_eq!(conflicts.get(d.foo), ["Foo.txt already exists in directory c"]);
            false
        })
        .unwrap();

    assert_eq!(asked, 1);
    assert!(matches!(outcome, MoveOutcome::Rejected(_)));
    assert_eq!(processor.state(), MoveState::Aborted);
    assert_eq!(contents(&d.ws), before);
    assert_eq!(d.ws.path_of(d.foo), "a/Foo.txt");
}

/// c/Foo.md exists before a/Foo.txt, so `c.Foo` would name the sibling.
fn same_stem() -> (Workspace, ElementId, ElementId, ElementId) {
    let mut ws = Workspace::new();
    ws.add_file_at("c/Foo.md", "notes").unwrap();
    let foo = ws.add_file_at("a/Foo.txt", "").unwrap();
    let bar = ws.add_file_at("b/Bar.txt", "use a.Foo").unwrap();
    ws.add_rendered_references(bar, foo, RefShape::Symbolic).unwrap();
    let c = ws.find("c").unwrap();
    (ws, foo, bar, c)
}

#[test]
fn same_stem_sibling_is_reported_before_moving() {
    let (mut ws, foo, bar, c) = same_stem();
    let diagnostics = RecordingDiagnostics::new();
    let mut processor = RelocationProcessor::new(&diagnostics);
    let mut seen = Vec::new();
    let outcome = processor
        .run(&mut ws, &[foo], c, |conflicts| {
            seen = conflicts.get(foo).to_vec();
            false
        })
        .unwrap();

    assert!(matches!(outcome, MoveOutcome::Rejected(_)));
    assert_eq!(
        seen,
        ["file a/Foo.txt would be known as c.Foo, which already names file c/Foo.md"]
    );
    assert_eq!(ws.path_of(foo), "a/Foo.txt");
    assert_eq!(ws.content(bar), Some("use a.Foo"));
    assert_no_dangling(&ws);
}

#[test]
fn forcing_a_same_stem_move_never_rebinds_to_the_sibling() {
    let (mut ws, foo, bar, c) = same_stem();
    let diagnostics = RecordingDiagnostics::new();
    let mut processor = RelocationProcessor::new(&diagnostics);
    let err = processor.run(&mut ws, &[foo], c, |_| true).unwrap_err();

    assert!(matches!(err, MoveError::StructuralIo { cause: None, .. }));
    assert_eq!(diagnostics.errors().len(), 1);
    // the physical move stays, the reference is left untouched
    assert_eq!(ws.path_of(foo), "c/Foo.txt");
    assert_eq!(ws.content(bar), Some("use a.Foo"));
}

#[test]
fn read_only_destination_posts_notice() {
    let mut d = docs();
    let locked = d.ws.ensure_directory("locked").unwrap();
    d.ws.set_read_only(locked, true).unwrap();
    let before = contents(&d.ws);

    let diagnostics = RecordingDiagnostics::new();
    let (tx, mut rx) = notice_channel();
    let mut processor = RelocationProcessor::new(&diagnostics).with_notices(tx);
    let err = processor
        .run(&mut d.ws, &[d.foo], locked, |_| true)
        .unwrap_err();

    assert!(matches!(err, MoveError::StructuralIo { .. }));
    let notices = rx.drain();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].title, "Error");
    assert!(notices[0].message.contains("read-only"));
    assert!(diagnostics.errors().is_empty());
    assert_eq!(contents(&d.ws), before);
}

#[test]
fn failed_batch_keeps_earlier_moves_by_default() {
    let mut d = docs();
    d.ws.add_file_at("c/Bar.txt", "").unwrap();
    let dest = d.ws.find("c").unwrap();

    let diagnostics = RecordingDiagnostics::new();
    let mut journal = MoveJournal::default();
    let mut processor = RelocationProcessor::new(&diagnostics).with_listener(&mut journal);
    let result = processor.run(&mut d.ws, &[d.foo, d.bar], dest, |_| true);
    assert!(result.is_err());
    drop(processor);

    assert_eq!(journal.moved, vec![d.foo]);
    assert_eq!(d.ws.path_of(d.foo), "c/Foo.txt");
    assert_eq!(d.ws.path_of(d.bar), "b/Bar.txt");
}

#[test]
fn failed_batch_rolls_back_when_asked() {
    let mut d = docs();
    d.ws.add_file_at("c/Bar.txt", "").unwrap();
    let dest = d.ws.find("c").unwrap();
    let before = contents(&d.ws);

    let diagnostics = RecordingDiagnostics::new();
    let mut processor = RelocationProcessor::new(&diagnostics).with_options(RelocationOptions {
        follow_descendants: true,
        rollback_on_failure: true,
    });
    assert!(processor.run(&mut d.ws, &[d.foo, d.bar], dest, |_| true).is_err());

    assert_eq!(d.ws.path_of(d.foo), "a/Foo.txt");
    assert_eq!(contents(&d.ws), before);
    assert_no_dangling(&d.ws);
}

#[test]
fn completion_callback_runs_once() {
    let mut d = docs();
    let dest = d.ws.find("c").unwrap();
    let diagnostics = RecordingDiagnostics::new();
    let mut calls = 0;
    {
        let mut processor =
            RelocationProcessor::new(&diagnostics).on_completed(|| calls += 1);
        processor.run(&mut d.ws, &[d.foo], dest, |_| false).unwrap();
        let back = d.ws.find("a").unwrap();
        processor.run(&mut d.ws, &[d.foo], back, |_| false).unwrap();
    }
    assert_eq!(calls, 1);
}

#[test]
fn snapshot_survives_relocation() {
    let mut d = docs();
    move_to(&mut d.ws, &[d.foo], "c/deep");

    let rebuilt = Snapshot::capture(&d.ws).build().unwrap();
    assert_eq!(rebuilt.reference_count(), d.ws.reference_count());
    let foo = rebuilt.find("c/deep/Foo.txt").unwrap();
    assert_eq!(rebuilt.content(foo), Some("back to ../../b/Bar.txt"));
    assert_no_dangling(&rebuilt);
}

// ─── push-down ──────────────────────────────────────────────────────────────

#[test]
fn push_down_into_two_subclasses() {
    let json = r#"{
        "files": [{ "path": "m/shapes.py" }],
        "classes": [
            { "file": "m/shapes.py", "name": "C", "methods": [
                { "name": "m1" },
                { "name": "m2" },
                { "name": "bar", "calls": [{ "callee": "m/shapes.py::C.m2", "deferred": true }] }
            ]},
            { "file": "m/shapes.py", "name": "D", "methods": [{ "name": "m1" }] },
            { "file": "m/shapes.py", "name": "E" }
        ]
    }"#;
    let ws = Snapshot::from_json(json).unwrap().build().unwrap();
    let c = ws.find("m/shapes.py::C").unwrap();
    let m1 = ws.find("m/shapes.py::C.m1").unwrap();
    let m2 = ws.find("m/shapes.py::C.m2").unwrap();
    let bar = ws.find("m/shapes.py::C.bar").unwrap();
    let d = ws.find("m/shapes.py::D").unwrap();
    let e = ws.find("m/shapes.py::E").unwrap();

    let catalog = MessageCatalog::standard();
    let diagnostics = RecordingDiagnostics::new();
    let members = [MemberInfo::new(m1), MemberInfo::new(m2)];
    let conflicts =
        analyze_push_down_conflicts(&ws, &catalog, &diagnostics, c, &members, &[d, e]);

    assert_eq!(conflicts.len(), 2);
    assert_eq!(
        conflicts.get(m1),
        ["method m1() is already overridden in class D"]
    );
    assert_eq!(
        conflicts.get(bar),
        ["method bar() uses method m2(), which is pushed down"]
    );
    assert!(!conflicts.contains(m2));
    assert!(diagnostics.errors().is_empty());
}

#[test]
fn push_down_ignores_implicit_calls() {
    let mut ws = Workspace::new();
    let file = ws.add_file_at("m/shapes.py", "").unwrap();
    let c = ws.add_class(file, "C").unwrap();
    let m1 = ws.add_function(c, "m1", SyntaxNode::block(vec![])).unwrap();
    ws.add_function(
        c,
        "bar",
        SyntaxNode::block(vec![SyntaxNode::call(Callee::Implicit(m1))]),
    )
    .unwrap();

    let catalog = MessageCatalog::standard();
    let diagnostics = RecordingDiagnostics::new();
    let conflicts = analyze_push_down_conflicts(
        &ws,
        &catalog,
        &diagnostics,
        c,
        &[MemberInfo::new(m1)],
        &[],
    );
    assert!(conflicts.is_empty());
}
