//! Property tests for rebind ordering and offset safety.

use std::collections::HashMap;

use proptest::prelude::*;

use restructure::models::{
    ElementId, ProgramModel, RefShape, Reference, ReferenceId, TextRange,
};
use restructure::refactor::{
    rebind_order, MoveOutcome, PendingReference, RecordingDiagnostics, RelocationProcessor,
};
use restructure::workspace::Workspace;

/// Pending references with distinct start offsets per owner, in list order.
fn pending(specs: &[(u32, usize)]) -> Vec<PendingReference> {
    specs
        .iter()
        .enumerate()
        .map(|(i, &(owner, start))| PendingReference {
            index: 0,
            target: ElementId(100),
            reference: Reference {
                id: ReferenceId(i as u32),
                owner: ElementId(owner),
                target: ElementId(100),
                shape: RefShape::Path,
                range: TextRange::new(start, start + 1),
                text: "x".into(),
            },
        })
        .collect()
}

fn specs() -> impl Strategy<Value = Vec<(u32, usize)>> {
    prop::collection::btree_set((1u32..4, 0usize..50), 0..20)
        .prop_map(|set| set.into_iter().collect::<Vec<_>>())
        .prop_shuffle()
}

proptest! {
    #[test]
    fn order_is_a_permutation(specs in specs()) {
        let refs = pending(&specs);
        let mut order = rebind_order(&refs);
        order.sort_unstable();
        prop_assert_eq!(order, (0..refs.len()).collect::<Vec<_>>());
    }

    #[test]
    fn each_owner_goes_from_last_offset_to_first(specs in specs()) {
        let refs = pending(&specs);
        let mut last: HashMap<ElementId, usize> = HashMap::new();
        for i in rebind_order(&refs) {
            let r = &refs[i].reference;
            if let Some(&previous) = last.get(&r.owner) {
                prop_assert!(r.range.start < previous);
            }
            last.insert(r.owner, r.range.start);
        }
    }

    #[test]
    fn owners_keep_their_slots(specs in specs()) {
        let refs = pending(&specs);
        let order = rebind_order(&refs);
        for (slot, &i) in order.iter().enumerate() {
            prop_assert_eq!(refs[slot].reference.owner, refs[i].reference.owner);
        }
    }

    /// Any mix of mentions in one file is rewritten in place when the target
    /// moves, and every range still covers its text afterwards.
    #[test]
    fn rewrites_stay_on_their_ranges(
        gaps in prop::collection::vec(0usize..4, 1..6),
        symbolic in prop::collection::vec(any::<bool>(), 6),
    ) {
        let mut text = String::new();
        for (i, gap) in gaps.iter().enumerate() {
            text.push_str(&"-".repeat(*gap));
            text.push_str(if symbolic[i] { "a.Foo" } else { "../a/Foo.txt" });
            text.push(' ');
        }

        let mut ws = Workspace::new();
        let foo = ws.add_file_at("a/Foo.txt", "").unwrap();
        let bar = ws.add_file_at("b/Bar.txt", &text).unwrap();
        let dest = ws.ensure_directory("c/deep").unwrap();
        let mut added = 0;
        if symbolic.iter().take(gaps.len()).any(|s| *s) {
            added += ws.add_rendered_references(bar, foo, RefShape::Symbolic).unwrap().len();
        }
        if symbolic.iter().take(gaps.len()).any(|s| !*s) {
            added += ws.add_rendered_references(bar, foo, RefShape::Path).unwrap().len();
        }
        prop_assert_eq!(added, gaps.len());

        let diagnostics = RecordingDiagnostics::new();
        let mut processor = RelocationProcessor::new(&diagnostics);
        let outcome = processor.run(&mut ws, &[foo], dest, |_| false).unwrap();
        let MoveOutcome::Completed(report) = outcome else {
            panic!("move was rejected");
        };
        prop_assert_eq!(report.rebound, gaps.len());

        let expected = text
            .replace("../a/Foo.txt", "../c/deep/Foo.txt")
            .replace("a.Foo", "c.deep.Foo");
        prop_assert_eq!(ws.content(bar), Some(expected.as_str()));
        for reference in ws.references() {
            let content = ws.content(reference.owner).unwrap();
            prop_assert_eq!(&content[reference.range.start..reference.range.end], reference.text.as_str());
            prop_assert_eq!(ws.resolve(reference), Some(foo));
        }
    }
}
