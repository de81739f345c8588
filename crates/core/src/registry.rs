//! Registry for readers
//!
//! Readers live in a generational arena and are addressed by [`ReaderId`]
//! handles. A handle whose slot has been reused (or emptied) no longer
//! resolves, so a response that arrives for a destroyed reader is dropped
//! instead of landing on whatever now occupies the slot.

/// Opaque handle to a registered reader
///
/// Also used as the routing token that ties a session back to its reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReaderId {
    index: u32,
    generation: u32,
}

impl ReaderId {
    /// Position of the slot, stable while the reader is alive
    pub fn index(&self) -> usize {
        self.index as usize
    }
}

impl std::fmt::Display for ReaderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}.{}", self.index, self.generation)
    }
}

struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Anything that can be looked up by its display label
pub trait Labeled {
    fn label(&self) -> &str;
}

/// Lookup of readers by label, used while reloading configuration
///
/// The registry answers this with a linear scan; reader counts are in the
/// tens, so a map is not worth keeping in sync.
pub trait LabelLookup {
    /// The most recently added entry carrying `label`. Labels need not be
    /// unique, and a chart block always follows its own reader line.
    fn find_by_label(&self, label: &str) -> Option<ReaderId>;
}

/// Ordered generational arena
///
/// Iteration follows insertion order, which is the order readers appear in
/// the configuration.
pub struct Registry<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    order: Vec<ReaderId>,
}

impl<T> Registry<T> {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            order: Vec::new(),
        }
    }

    /// Add a value at the end of the order and return its handle
    pub fn insert(&mut self, value: T) -> ReaderId {
        let id = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.value = Some(value);
                ReaderId {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation: 0,
                    value: Some(value),
                });
                ReaderId {
                    index,
                    generation: 0,
                }
            }
        };
        self.order.push(id);
        id
    }

    /// Remove a value. Outstanding handles to it stop resolving.
    pub fn remove(&mut self, id: ReaderId) -> Option<T> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.order.retain(|other| *other != id);
        Some(value)
    }

    /// Whether the handle still refers to a live value
    pub fn contains(&self, id: ReaderId) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: ReaderId) -> Option<&T> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.value.as_ref()
    }

    pub fn get_mut(&mut self, id: ReaderId) -> Option<&mut T> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.value.as_mut()
    }

    /// Handles in configuration order
    pub fn ids(&self) -> Vec<ReaderId> {
        self.order.clone()
    }

    /// Iterate values in configuration order
    pub fn iter(&self) -> impl Iterator<Item = (ReaderId, &T)> + '_ {
        self.order
            .iter()
            .filter_map(move |id| self.get(*id).map(|value| (*id, value)))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Remove everything, returning the values in configuration order
    pub fn drain(&mut self) -> Vec<(ReaderId, T)> {
        let ids = std::mem::take(&mut self.order);
        let mut drained = Vec::with_capacity(ids.len());
        for id in ids {
            let slot = &mut self.slots[id.index as usize];
            if let Some(value) = slot.value.take() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(id.index);
                drained.push((id, value));
            }
        }
        drained
    }
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Labeled> LabelLookup for Registry<T> {
    fn find_by_label(&self, label: &str) -> Option<ReaderId> {
        self.order
            .iter()
            .rev()
            .copied()
            .find(|id| self.get(*id).is_some_and(|value| value.label() == label))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Named(&'static str);

    impl Labeled for Named {
        fn label(&self) -> &str {
            self.0
        }
    }

    #[test]
    fn test_insert_preserves_order() {
        let mut registry = Registry::new();
        let a = registry.insert(Named("a"));
        let b = registry.insert(Named("b"));
        let c = registry.insert(Named("c"));
        assert_eq!(registry.ids(), vec![a, b, c]);

        registry.remove(b);
        let labels: Vec<_> = registry.iter().map(|(_, n)| n.0).collect();
        assert_eq!(labels, vec!["a", "c"]);
    }

    #[test]
    fn test_stale_handle_does_not_resolve() {
        let mut registry = Registry::new();
        let old = registry.insert(Named("old"));
        assert!(registry.remove(old).is_some());

        // The slot is reused, but the old handle must stay dead
        let new = registry.insert(Named("new"));
        assert_eq!(old.index(), new.index());
        assert!(registry.get(old).is_none());
        assert!(registry.remove(old).is_none());
        assert_eq!(registry.get(new).map(|n| n.0), Some("new"));
    }

    #[test]
    fn test_drain_invalidates_all_handles() {
        let mut registry = Registry::new();
        let a = registry.insert(Named("a"));
        let b = registry.insert(Named("b"));
        let drained: Vec<_> = registry.drain().into_iter().map(|(_, n)| n.0).collect();
        assert_eq!(drained, vec!["a", "b"]);
        assert!(registry.is_empty());
        assert!(!registry.contains(a));
        assert!(!registry.contains(b));
    }

    #[test]
    fn test_find_by_label() {
        let mut registry = Registry::new();
        registry.insert(Named("cpu"));
        let net = registry.insert(Named("net"));
        assert_eq!(registry.find_by_label("net"), Some(net));
        assert_eq!(registry.find_by_label("disk"), None);
    }

    #[test]
    fn test_find_by_label_prefers_latest() {
        let mut registry = Registry::new();
        let first = registry.insert(Named("eth"));
        let second = registry.insert(Named("eth"));
        assert_eq!(registry.find_by_label("eth"), Some(second));

        registry.remove(second);
        assert_eq!(registry.find_by_label("eth"), Some(first));
    }
}
