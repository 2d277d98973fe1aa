use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use rewind_common::Key;
use rewind_kernel::Snapshot;

/// Read-only structural view the tracker walks.
///
/// Implementors expose their own enumerable keys and the child behind each
/// one. Leaves (primitives, or anything opaque to the tracker) stop descent.
pub trait Reflect: Snapshot + fmt::Debug {
    /// True for values the tracker should not descend into.
    fn is_leaf(&self) -> bool;

    /// NaN is never identical to itself and must not read as a mutation.
    fn is_nan(&self) -> bool {
        false
    }

    /// Own enumerable keys in a stable order. Empty for leaves.
    fn own_keys(&self) -> Vec<Key>;

    /// The child stored under `key`, if any.
    fn child(&self, key: &Key) -> Option<Self>;
}

// Plain shared pointers cannot be edited in place without interior
// mutability, so identity of the pointer is all there is to audit.
impl<T: fmt::Debug + ?Sized> Reflect for Rc<T> {
    fn is_leaf(&self) -> bool {
        true
    }

    fn own_keys(&self) -> Vec<Key> {
        Vec::new()
    }

    fn child(&self, _key: &Key) -> Option<Self> {
        None
    }
}

impl<T: fmt::Debug + ?Sized> Reflect for Arc<T> {
    fn is_leaf(&self) -> bool {
        true
    }

    fn own_keys(&self) -> Vec<Key> {
        Vec::new()
    }

    fn child(&self, _key: &Key) -> Option<Self> {
        None
    }
}
