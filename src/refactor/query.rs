//! Reference discovery for a set of elements about to move.

use std::collections::HashSet;

use serde::Serialize;

use crate::models::{ElementId, ProgramModel, RefShape, Reference};

/// A reference found during planning, waiting to be rebound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingReference {
    /// Position of the moved element this reference was found for.
    pub index: usize,
    /// The moved element itself or one of its descendants.
    pub target: ElementId,
    pub reference: Reference,
}

/// Find every reference to `elements`, tagged with the index of the element
/// it was found for. A reference reachable through more than one moved
/// element is reported once, under the first.
///
/// With `follow_descendants`, references to anything below a moved element
/// are collected too, unless they are path-shaped and come from inside the
/// same moved subtree.
pub fn find_references(
    model: &dyn ProgramModel,
    elements: &[ElementId],
    follow_descendants: bool,
) -> Vec<PendingReference> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();

    for (index, &element) in elements.iter().enumerate() {
        for reference in model.references_to(element) {
            if seen.insert(reference.id) {
                out.push(PendingReference {
                    index,
                    target: element,
                    reference,
                });
            }
        }

        if !follow_descendants {
            continue;
        }
        for descendant in model.descendants(element) {
            for reference in model.references_to(descendant) {
                let from_outside = !model.is_within(reference.owner, element);
                if (from_outside || reference.shape == RefShape::Symbolic)
                    && seen.insert(reference.id)
                {
                    out.push(PendingReference {
                        index,
                        target: descendant,
                        reference,
                    });
                }
            }
        }
    }

    tracing::debug!(
        elements = elements.len(),
        references = out.len(),
        "reference discovery finished"
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workspace::Workspace;

    fn project() -> Workspace {
        let mut ws = Workspace::new();
        let guide = ws.add_file_at("docs/guide.md", "see intro.md").unwrap();
        let intro = ws.add_file_at("docs/intro.md", "").unwrap();
        let readme = ws
            .add_file_at("README.md", "docs/intro.md docs.intro docs/guide.md")
            .unwrap();
        ws.add_rendered_references(guide, intro, RefShape::Path).unwrap();
        ws.add_rendered_references(readme, intro, RefShape::Path).unwrap();
        ws.add_rendered_references(readme, intro, RefShape::Symbolic).unwrap();
        ws.add_rendered_references(readme, guide, RefShape::Path).unwrap();
        ws
    }

    #[test]
    fn direct_references_are_tagged_with_index() {
        let ws = project();
        let intro = ws.find("docs/intro.md").unwrap();
        let guide = ws.find("docs/guide.md").unwrap();
        let found = find_references(&ws, &[guide, intro], false);
        assert_eq!(found.len(), 4);
        assert!(found
            .iter()
            .all(|p| p.target == [guide, intro][p.index] && p.reference.target == p.target));
    }

    #[test]
    fn descendants_from_outside_are_followed() {
        let ws = project();
        let docs = ws.find("docs").unwrap();
        let found = find_references(&ws, &[docs], true);
        // README's three links, not guide.md -> intro.md inside the subtree
        assert_eq!(found.len(), 3);
        assert!(found.iter().all(|p| p.index == 0));
        let readme = ws.find("README.md").unwrap();
        assert!(found.iter().all(|p| p.reference.owner == readme));
    }

    #[test]
    fn symbolic_references_inside_subtree_are_followed() {
        let mut ws = project();
        let guide = ws.find("docs/guide.md").unwrap();
        let intro = ws.find("docs/intro.md").unwrap();
        ws.add_file_at("docs/links.txt", "docs.intro").unwrap();
        let links = ws.find("docs/links.txt").unwrap();
        ws.add_rendered_references(links, intro, RefShape::Symbolic).unwrap();
        let docs = ws.find("docs").unwrap();

        let found = find_references(&ws, &[docs], true);
        assert!(found.iter().any(|p| p.reference.owner == links));
        assert!(!found.iter().any(|p| p.reference.owner == guide));
    }

    #[test]
    fn without_follow_only_direct_targets() {
        let ws = project();
        let docs = ws.find("docs").unwrap();
        assert!(find_references(&ws, &[docs], false).is_empty());
    }

    #[test]
    fn overlapping_elements_report_each_reference_once() {
        let ws = project();
        let docs = ws.find("docs").unwrap();
        let intro = ws.find("docs/intro.md").unwrap();
        let found = find_references(&ws, &[docs, intro], true);
        let mut ids: Vec<_> = found.iter().map(|p| p.reference.id).collect();
        let before = ids.len();
        ids.dedup();
        assert_eq!(ids.len(), before);
        // guide.md -> intro.md is only collected through the direct target
        assert!(found.iter().any(|p| p.index == 1));
    }
}
