use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use rewind_audit::Reflect;
use rewind_common::{Key, Path};
use rewind_kernel::Snapshot;

type ArrayCell = Rc<RefCell<Vec<Value>>>;
type ObjectCell = Rc<RefCell<BTreeMap<String, Value>>>;

/// A JSON-shaped value whose containers have identity.
///
/// Primitives compare by value. Arrays and objects compare by allocation in
/// [`Snapshot::same_ref`] and by content in `PartialEq`.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    String(Rc<str>),
    Array(ArrayCell),
    Object(ObjectCell),
}

impl Value {
    pub fn array(items: impl IntoIterator<Item = Value>) -> Self {
        Self::Array(Rc::new(RefCell::new(items.into_iter().collect())))
    }

    pub fn object<K: Into<String>>(entries: impl IntoIterator<Item = (K, Value)>) -> Self {
        Self::Object(Rc::new(RefCell::new(
            entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        )))
    }

    /// Type name, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Object(_) => "object",
        }
    }

    pub fn is_container(&self) -> bool {
        matches!(self, Self::Array(_) | Self::Object(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(&**s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Number of entries for containers, `None` for primitives.
    pub fn child_count(&self) -> Option<usize> {
        match self {
            Self::Array(items) => Some(items.borrow().len()),
            Self::Object(entries) => Some(entries.borrow().len()),
            _ => None,
        }
    }

    /// The child under `key`. Arrays answer numeric keys and `length`;
    /// objects answer any key by its field name.
    pub fn get(&self, key: &Key) -> Option<Value> {
        match self {
            Self::Array(items) => {
                let items = items.borrow();
                match key {
                    Key::Length => Some(Self::Number(items.len() as f64)),
                    _ => key.as_index().and_then(|i| items.get(i)).cloned(),
                }
            }
            Self::Object(entries) => entries.borrow().get(&key.as_field()).cloned(),
            _ => None,
        }
    }

    /// The descendant at `path`, or `None` if any step is missing.
    pub fn get_path(&self, path: &Path) -> Option<Value> {
        let mut node = self.clone();
        for key in path {
            node = node.get(key)?;
        }
        Some(node)
    }

    /// Own enumerable keys: indices then `length` for arrays, field names for
    /// objects, nothing for primitives.
    pub fn keys(&self) -> Vec<Key> {
        match self {
            Self::Array(items) => (0..items.borrow().len())
                .map(Key::Index)
                .chain(std::iter::once(Key::Length))
                .collect(),
            Self::Object(entries) => entries.borrow().keys().map(Key::field).collect(),
            _ => Vec::new(),
        }
    }

    /// Overwrite the entry at `path` inside the existing allocation.
    ///
    /// This bypasses copy-on-write: every holder of the container, history
    /// included, sees the change. Returns false if the parent is missing, is
    /// not a container, or the key does not fit it.
    pub fn write_in_place(&self, path: impl Into<Path>, value: Value) -> bool {
        let path = path.into();
        let Some((parent, last)) = path.split_last() else {
            return false;
        };
        let Some(parent) = self.get_path(&Path::from(parent)) else {
            return false;
        };
        match (&parent, last.as_index()) {
            (Self::Array(items), Some(index)) => {
                let mut items = items.borrow_mut();
                if index < items.len() {
                    items[index] = value;
                } else if index == items.len() {
                    items.push(value);
                } else {
                    return false;
                }
                true
            }
            (Self::Object(entries), _) => {
                entries.borrow_mut().insert(last.as_field(), value);
                true
            }
            _ => false,
        }
    }
}

impl Snapshot for Value {
    fn same_ref(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Array(a), Self::Array(b)) => Rc::ptr_eq(a, b),
            (Self::Object(a), Self::Object(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Reflect for Value {
    fn is_leaf(&self) -> bool {
        !self.is_container()
    }

    fn is_nan(&self) -> bool {
        matches!(self, Self::Number(x) if x.is_nan())
    }

    fn own_keys(&self) -> Vec<Key> {
        self.keys()
    }

    fn child(&self, key: &Key) -> Option<Self> {
        self.get(key)
    }
}

/// Deep content equality.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Array(a), Self::Array(b)) => Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow(),
            (Self::Object(a), Self::Object(b)) => Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow(),
            _ => self.same_ref(other),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Self::Number(x)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Number(n as f64)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(Rc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(Rc::from(s))
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::array(items)
    }
}
