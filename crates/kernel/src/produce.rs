use std::rc::Rc;
use std::sync::Arc;

/// A value that can be stored in history.
///
/// `same_ref` is the identity test the engine relies on: two snapshots are the
/// same when they are the same allocation, not merely equal in content.
/// Primitive-like snapshots may fall back to value equality.
pub trait Snapshot: Clone {
    fn same_ref(&self, other: &Self) -> bool;
}

impl<T: ?Sized> Snapshot for Rc<T> {
    fn same_ref(&self, other: &Self) -> bool {
        Rc::ptr_eq(self, other)
    }
}

impl<T: ?Sized> Snapshot for Arc<T> {
    fn same_ref(&self, other: &Self) -> bool {
        Arc::ptr_eq(self, other)
    }
}

/// An imperative edit applied to a draft of the current snapshot.
pub type Recipe<D> = Box<dyn FnOnce(&mut D)>;

/// Turns a recipe into the next immutable snapshot.
///
/// Contract: the result is `same_ref` to `base` iff the recipe made no
/// observable change; otherwise only the touched substructure is new and
/// everything else is shared with `base`.
pub trait Producer<S> {
    /// The mutable view a recipe writes through.
    type Draft;

    fn produce(&self, base: &S, recipe: Recipe<Self::Draft>) -> S;
}

/// Producer for `Rc<T>` snapshots: clone, edit, and keep the old allocation
/// when the edit turned out to be a no-op.
#[derive(Debug, Clone, Copy, Default)]
pub struct RcProducer;

impl<T: Clone + PartialEq> Producer<Rc<T>> for RcProducer {
    type Draft = T;

    fn produce(&self, base: &Rc<T>, recipe: Recipe<T>) -> Rc<T> {
        let mut draft = T::clone(base);
        recipe(&mut draft);
        if draft == **base {
            Rc::clone(base)
        } else {
            Rc::new(draft)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rc_identity_is_pointer_identity() {
        let a = Rc::new(vec![1, 2]);
        let b = Rc::new(vec![1, 2]);
        assert!(a.same_ref(&Rc::clone(&a)));
        assert!(!a.same_ref(&b));
    }

    #[test]
    fn rc_producer_keeps_base_on_noop() {
        let base = Rc::new(vec![1, 2, 3]);
        let next = RcProducer.produce(&base, Box::new(|_: &mut Vec<i32>| {}));
        assert!(next.same_ref(&base));

        // Writing the same content back is still a no-op.
        let next = RcProducer.produce(&base, Box::new(|v: &mut Vec<i32>| v[0] = 1));
        assert!(next.same_ref(&base));
    }

    #[test]
    fn rc_producer_allocates_on_change() {
        let base = Rc::new(vec![1, 2, 3]);
        let next = RcProducer.produce(&base, Box::new(|v: &mut Vec<i32>| v.push(4)));
        assert!(!next.same_ref(&base));
        assert_eq!(*next, vec![1, 2, 3, 4]);
        assert_eq!(*base, vec![1, 2, 3]);
    }
}
