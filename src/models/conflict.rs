use serde::Serialize;

use super::element::ElementId;

/// Conflicts attached to one element, in the order they were recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConflictEntry {
    pub element: ElementId,
    pub messages: Vec<String>,
}

/// Element → conflict descriptions.
///
/// Keys keep first-insertion order and messages keep insertion order within a
/// key, so reports are deterministic. Recording the same message twice for
/// one element is a no-op.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConflictRecord {
    entries: Vec<ConflictEntry>,
}

impl ConflictRecord {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, element: ElementId, message: impl Into<String>) {
        let message = message.into();
        match self.entries.iter_mut().find(|e| e.element == element) {
            Some(entry) => {
                if !entry.messages.contains(&message) {
                    entry.messages.push(message);
                }
            }
            None => self.entries.push(ConflictEntry {
                element,
                messages: vec![message],
            }),
        }
    }

    /// Messages recorded for `element` (empty if none).
    #[must_use]
    pub fn get(&self, element: ElementId) -> &[String] {
        self.entries
            .iter()
            .find(|e| e.element == element)
            .map(|e| e.messages.as_slice())
            .unwrap_or(&[])
    }

    #[must_use]
    pub fn contains(&self, element: ElementId) -> bool {
        self.entries.iter().any(|e| e.element == element)
    }

    /// Number of elements with at least one conflict.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConflictEntry> {
        self.entries.iter()
    }

    pub fn merge(&mut self, other: ConflictRecord) {
        for entry in other.entries {
            for message in entry.messages {
                self.put(entry.element, message);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_keeps_insertion_order() {
        let mut record = ConflictRecord::new();
        record.put(ElementId(2), "second element");
        record.put(ElementId(1), "first message");
        record.put(ElementId(1), "second message");

        let keys: Vec<ElementId> = record.iter().map(|e| e.element).collect();
        assert_eq!(keys, vec![ElementId(2), ElementId(1)]);
        assert_eq!(record.get(ElementId(1)), ["first message", "second message"]);
    }

    #[test]
    fn duplicate_messages_collapse() {
        let mut record = ConflictRecord::new();
        record.put(ElementId(1), "same");
        record.put(ElementId(1), "same");
        assert_eq!(record.len(), 1);
        assert_eq!(record.get(ElementId(1)).len(), 1);
    }

    #[test]
    fn get_missing_is_empty() {
        let record = ConflictRecord::new();
        assert!(record.get(ElementId(9)).is_empty());
        assert!(!record.contains(ElementId(9)));
        assert!(record.is_empty());
    }

    #[test]
    fn merge_combines_records() {
        let mut a = ConflictRecord::new();
        a.put(ElementId(1), "x");
        let mut b = ConflictRecord::new();
        b.put(ElementId(1), "x");
        b.put(ElementId(1), "y");
        b.put(ElementId(3), "z");
        a.merge(b);
        assert_eq!(a.get(ElementId(1)), ["x", "y"]);
        assert_eq!(a.get(ElementId(3)), ["z"]);
    }
}
