use std::collections::BTreeMap;

use rewind_common::{Key, Path};
use rewind_kernel::{Producer, Recipe, Snapshot};

use crate::value::Value;

/// Errors from draft edits.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DraftError {
    #[error("cannot edit inside a {kind} value")]
    NotAContainer { kind: &'static str },
    #[error("index {index} out of bounds for array of length {len}")]
    IndexOutOfBounds { index: usize, len: usize },
    #[error("expected an array, found {kind}")]
    NotAnArray { kind: &'static str },
    #[error("key '{0}' cannot address an array entry")]
    NotAnIndex(Key),
    #[error("no value at path '{0}'")]
    PathNotFound(Path),
}

/// Copy-on-write editing view over a [`Value`].
///
/// A draft starts out as a handle to its base. The first write into a
/// container makes a shallow copy whose entries are themselves drafts, so only
/// the containers along edited paths are ever copied. [`Draft::finish`] hands
/// back the base allocation untouched when no entry ended up different.
#[derive(Debug, Clone)]
pub struct Draft {
    base: Value,
    state: DraftState,
}

#[derive(Debug, Clone)]
enum DraftState {
    Untouched,
    Replaced(Value),
    Array(Vec<Draft>),
    Object(BTreeMap<String, Draft>),
}

/// Mutable access to the entries of an opened draft.
enum Entries<'a> {
    Array(&'a mut Vec<Draft>),
    Object(&'a mut BTreeMap<String, Draft>),
}

impl Draft {
    pub fn new(base: Value) -> Self {
        Self {
            base,
            state: DraftState::Untouched,
        }
    }

    /// Swap in a whole new value.
    pub fn replace(&mut self, value: impl Into<Value>) {
        self.state = DraftState::Replaced(value.into());
    }

    /// Current value of the child at `key`, reflecting edits so far.
    pub fn get(&self, key: impl Into<Key>) -> Option<Value> {
        let key = key.into();
        match &self.state {
            DraftState::Untouched => self.base.get(&key),
            DraftState::Replaced(value) => value.get(&key),
            DraftState::Array(items) => match key {
                Key::Length => Some(Value::from(items.len() as f64)),
                _ => key.as_index().and_then(|i| items.get(i)).map(Draft::finish),
            },
            DraftState::Object(entries) => entries.get(&key.as_field()).map(Draft::finish),
        }
    }

    /// Number of entries if the draft currently holds a container.
    pub fn child_count(&self) -> Option<usize> {
        match &self.state {
            DraftState::Untouched => self.base.child_count(),
            DraftState::Replaced(value) => value.child_count(),
            DraftState::Array(items) => Some(items.len()),
            DraftState::Object(entries) => Some(entries.len()),
        }
    }

    /// Draft of the child at `key`, for nested edits.
    pub fn get_mut(&mut self, key: impl Into<Key>) -> Option<&mut Draft> {
        let key = key.into();
        match self.open().ok()? {
            Entries::Array(items) => key.as_index().and_then(|i| items.get_mut(i)),
            Entries::Object(entries) => entries.get_mut(&key.as_field()),
        }
    }

    /// Draft of the descendant at `path`.
    pub fn at_path(&mut self, path: &Path) -> Result<&mut Draft, DraftError> {
        let mut node = self;
        for key in path {
            node = node
                .get_mut(key.clone())
                .ok_or_else(|| DraftError::PathNotFound(path.clone()))?;
        }
        Ok(node)
    }

    /// Set the entry at `key`. Arrays accept any existing index or exactly
    /// their length (append).
    pub fn set(&mut self, key: impl Into<Key>, value: impl Into<Value>) -> Result<(), DraftError> {
        let key = key.into();
        let value = value.into();
        match self.open()? {
            Entries::Array(items) => {
                let index = key.as_index().ok_or(DraftError::NotAnIndex(key))?;
                match index.cmp(&items.len()) {
                    std::cmp::Ordering::Less => items[index].replace(value),
                    std::cmp::Ordering::Equal => items.push(Draft::new(value)),
                    std::cmp::Ordering::Greater => {
                        return Err(DraftError::IndexOutOfBounds {
                            index,
                            len: items.len(),
                        });
                    }
                }
            }
            Entries::Object(entries) => {
                let field = key.as_field();
                match entries.get_mut(&field) {
                    Some(existing) => existing.replace(value),
                    None => {
                        entries.insert(field, Draft::new(value));
                    }
                }
            }
        }
        Ok(())
    }

    /// Set the entry at a dotted or explicit path, e.g. `"1.value"`.
    pub fn set_in(&mut self, path: impl Into<Path>, value: impl Into<Value>) -> Result<(), DraftError> {
        let path = path.into();
        let Some((parent, last)) = path.split_last() else {
            self.replace(value);
            return Ok(());
        };
        let last = last.clone();
        self.at_path(&Path::from(parent))?.set(last, value)
    }

    /// Remove the entry at `key`, shifting later array entries down.
    pub fn remove(&mut self, key: impl Into<Key>) -> Result<Option<Value>, DraftError> {
        let key = key.into();
        let removed = match self.open()? {
            Entries::Array(items) => {
                let index = key.as_index().ok_or(DraftError::NotAnIndex(key))?;
                (index < items.len()).then(|| items.remove(index))
            }
            Entries::Object(entries) => entries.remove(&key.as_field()),
        };
        Ok(removed.map(|draft| draft.finish()))
    }

    /// Append to an array.
    pub fn push(&mut self, value: impl Into<Value>) -> Result<(), DraftError> {
        match self.open()? {
            Entries::Array(items) => {
                items.push(Draft::new(value.into()));
                Ok(())
            }
            Entries::Object(_) => Err(DraftError::NotAnArray { kind: "object" }),
        }
    }

    /// Remove and return the last array entry.
    pub fn pop(&mut self) -> Result<Option<Value>, DraftError> {
        match self.open()? {
            Entries::Array(items) => Ok(items.pop().map(|draft| draft.finish())),
            Entries::Object(_) => Err(DraftError::NotAnArray { kind: "object" }),
        }
    }

    /// The value this draft stands for now.
    ///
    /// Returns the base allocation itself when every entry still matches it by
    /// identity; otherwise builds a new container around the finished entries.
    pub fn finish(&self) -> Value {
        match &self.state {
            DraftState::Untouched => self.base.clone(),
            DraftState::Replaced(value) => value.clone(),
            DraftState::Array(items) => {
                let next: Vec<Value> = items.iter().map(Draft::finish).collect();
                if let Value::Array(base) = &self.base {
                    let base = base.borrow();
                    if base.len() == next.len() && base.iter().zip(&next).all(|(a, b)| a.same_ref(b)) {
                        return self.base.clone();
                    }
                }
                Value::array(next)
            }
            DraftState::Object(entries) => {
                let next: BTreeMap<String, Value> = entries
                    .iter()
                    .map(|(k, draft)| (k.clone(), draft.finish()))
                    .collect();
                if let Value::Object(base) = &self.base {
                    let base = base.borrow();
                    if base.len() == next.len()
                        && base
                            .iter()
                            .all(|(k, a)| next.get(k).is_some_and(|b| a.same_ref(b)))
                    {
                        return self.base.clone();
                    }
                }
                Value::object(next)
            }
        }
    }

    /// Make the draft hold a shallow, per-entry copy of its container and
    /// hand out the entries.
    fn open(&mut self) -> Result<Entries<'_>, DraftError> {
        if let DraftState::Untouched | DraftState::Replaced(_) = self.state {
            let source = match &self.state {
                DraftState::Replaced(value) => value,
                _ => &self.base,
            };
            let opened = match source {
                Value::Array(items) => {
                    DraftState::Array(items.borrow().iter().cloned().map(Draft::new).collect())
                }
                Value::Object(entries) => DraftState::Object(
                    entries
                        .borrow()
                        .iter()
                        .map(|(k, v)| (k.clone(), Draft::new(v.clone())))
                        .collect(),
                ),
                other => return Err(DraftError::NotAContainer { kind: other.kind() }),
            };
            self.state = opened;
        }
        match &mut self.state {
            DraftState::Array(items) => Ok(Entries::Array(items)),
            DraftState::Object(entries) => Ok(Entries::Object(entries)),
            DraftState::Untouched | DraftState::Replaced(_) => Err(DraftError::NotAContainer {
                kind: self.base.kind(),
            }),
        }
    }
}

/// [`Producer`] for [`Value`] snapshots, editing through a [`Draft`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ValueProducer;

impl Producer<Value> for ValueProducer {
    type Draft = Draft;

    fn produce(&self, base: &Value, recipe: Recipe<Draft>) -> Value {
        let mut draft = Draft::new(base.clone());
        recipe(&mut draft);
        let next = draft.finish();
        if next.same_ref(base) {
            tracing::trace!("recipe left the value unchanged");
        }
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pair() -> Value {
        Value::from(json!([{ "id": 0, "value": "foo" }, { "id": 1, "value": "bar" }]))
    }

    fn produce(base: &Value, recipe: impl FnOnce(&mut Draft) + 'static) -> Value {
        ValueProducer.produce(base, Box::new(recipe))
    }

    #[test]
    fn untouched_draft_returns_base() {
        let base = pair();
        let next = produce(&base, |_| {});
        assert!(next.same_ref(&base));
    }

    #[test]
    fn writing_same_primitive_is_noop() {
        let base = pair();
        let next = produce(&base, |d| d.set_in("1.value", "bar").unwrap());
        assert!(next.same_ref(&base));
    }

    #[test]
    fn edit_shares_untouched_siblings() {
        let base = pair();
        let next = produce(&base, |d| d.set_in("1.value", "newBar").unwrap());

        assert!(!next.same_ref(&base));
        let (old0, new0) = (base.get(&Key::Index(0)).unwrap(), next.get(&Key::Index(0)).unwrap());
        let (old1, new1) = (base.get(&Key::Index(1)).unwrap(), next.get(&Key::Index(1)).unwrap());
        assert!(old0.same_ref(&new0));
        assert!(!old1.same_ref(&new1));
        assert_eq!(
            next,
            Value::from(json!([{ "id": 0, "value": "foo" }, { "id": 1, "value": "newBar" }]))
        );
        // Base is untouched.
        assert_eq!(base, pair());
    }

    #[test]
    fn nested_get_mut_edits() {
        let base = pair();
        let next = produce(&base, |d| {
            let item = d.get_mut(0usize).unwrap();
            item.set("value", "x").unwrap();
            item.set("extra", true).unwrap();
        });
        assert_eq!(
            next.get_path(&Path::parse("0")).unwrap(),
            Value::from(json!({ "id": 0, "value": "x", "extra": true }))
        );
    }

    #[test]
    fn push_pop_and_remove() {
        let base = pair();
        let next = produce(&base, |d| {
            d.push(json!({ "id": 2 })).unwrap();
            d.remove(0usize).unwrap();
        });
        assert_eq!(next.child_count(), Some(2));
        assert_eq!(next.get_path(&Path::parse("1.id")), Some(Value::from(2)));

        let popped = produce(&base, |d| {
            assert_eq!(d.pop().unwrap().unwrap().get(&Key::field("id")), Some(Value::from(1)));
        });
        assert_eq!(popped.child_count(), Some(1));
    }

    #[test]
    fn replace_then_edit_compares_against_base() {
        let base = pair();
        let next = produce(&base, |d| {
            d.replace(json!([1, 2]));
            d.set(1usize, 3).unwrap();
        });
        assert_eq!(next, Value::from(json!([1, 3])));
    }

    #[test]
    fn reads_reflect_pending_edits() {
        let mut draft = Draft::new(pair());
        draft.set_in("0.value", "pending").unwrap();
        assert_eq!(
            draft.get(0usize).unwrap().get(&Key::field("value")),
            Some(Value::from("pending"))
        );
        assert_eq!(draft.get(Key::Length), Some(Value::from(2)));
        assert_eq!(draft.child_count(), Some(2));
    }

    #[test]
    fn edit_errors() {
        let mut draft = Draft::new(pair());
        assert_eq!(
            draft.set(5usize, 1),
            Err(DraftError::IndexOutOfBounds { index: 5, len: 2 })
        );
        assert_eq!(
            draft.set("name", 1),
            Err(DraftError::NotAnIndex(Key::field("name")))
        );
        assert_eq!(
            draft.set_in("0.value.deeper", 1),
            Err(DraftError::NotAContainer { kind: "string" })
        );
        assert!(matches!(
            draft.set_in("9.value", 1),
            Err(DraftError::PathNotFound(_))
        ));

        let mut scalar = Draft::new(Value::from(1));
        assert_eq!(
            scalar.push(2),
            Err(DraftError::NotAContainer { kind: "number" })
        );
    }

    #[test]
    fn empty_path_replaces_root() {
        let base = pair();
        let next = produce(&base, |d| d.set_in("", "root").unwrap());
        assert_eq!(next, Value::from("root"));
    }
}
