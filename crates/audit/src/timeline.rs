use std::fmt;
use std::rc::Rc;

use rewind_common::Key;
use rewind_kernel::Snapshot;

use crate::reflect::Reflect;

/// Audit root for a whole history: the shared history slice at the top,
/// individual snapshots below it.
///
/// The slice is keyed by index. Its length needs no entry of its own: the
/// slice is immutable, so a different length means a different slice.
#[derive(Clone)]
pub enum Tracked<S> {
    Timeline(Rc<[S]>),
    Entry(S),
}

// Renders as the wrapped data so reports show the value, not the wrapper.
impl<S: fmt::Debug> fmt::Debug for Tracked<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeline(entries) => f.debug_list().entries(entries.iter()).finish(),
            Self::Entry(entry) => fmt::Debug::fmt(entry, f),
        }
    }
}

impl<S: Snapshot> Snapshot for Tracked<S> {
    fn same_ref(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Timeline(a), Self::Timeline(b)) => Rc::ptr_eq(a, b),
            (Self::Entry(a), Self::Entry(b)) => a.same_ref(b),
            _ => false,
        }
    }
}

impl<S: Reflect> Reflect for Tracked<S> {
    fn is_leaf(&self) -> bool {
        match self {
            Self::Timeline(_) => false,
            Self::Entry(entry) => entry.is_leaf(),
        }
    }

    fn is_nan(&self) -> bool {
        match self {
            Self::Timeline(_) => false,
            Self::Entry(entry) => entry.is_nan(),
        }
    }

    fn own_keys(&self) -> Vec<Key> {
        match self {
            Self::Timeline(entries) => (0..entries.len()).map(Key::Index).collect(),
            Self::Entry(entry) => entry.own_keys(),
        }
    }

    fn child(&self, key: &Key) -> Option<Self> {
        match self {
            Self::Timeline(entries) => key
                .as_index()
                .and_then(|i| entries.get(i))
                .cloned()
                .map(Self::Entry),
            Self::Entry(entry) => entry.child(key).map(Self::Entry),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeline_identity_is_slice_identity() {
        let slice: Rc<[Rc<i32>]> = Rc::from(vec![Rc::new(1)]);
        let a = Tracked::Timeline(Rc::clone(&slice));
        let b = Tracked::Timeline(slice);
        let c = Tracked::Timeline(Rc::from(vec![Rc::new(1)]));
        assert!(a.same_ref(&b));
        assert!(!a.same_ref(&c));
    }

    #[test]
    fn timeline_exposes_entries_by_index() {
        let first = Rc::new(1);
        let slice: Rc<[Rc<i32>]> = Rc::from(vec![Rc::clone(&first), Rc::new(2)]);
        let root = Tracked::Timeline(slice);

        assert_eq!(root.own_keys(), vec![Key::Index(0), Key::Index(1)]);
        let child = root.child(&Key::Index(0)).unwrap();
        assert!(child.same_ref(&Tracked::Entry(first)));
        assert!(root.child(&Key::Index(5)).is_none());
        assert!(!root.is_leaf());
    }

    #[test]
    fn debug_shows_wrapped_data() {
        let root = Tracked::Timeline(Rc::from(vec![Rc::new(1), Rc::new(2)]));
        assert_eq!(format!("{root:?}"), "[1, 2]");
        assert_eq!(format!("{:?}", Tracked::Entry(Rc::new(3))), "3");
    }
}
