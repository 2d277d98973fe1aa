use std::collections::{BTreeMap, BTreeSet};

use rewind_common::{Key, Path};

use crate::reflect::Reflect;

/// Rendered in place of a value whose path no longer resolves.
pub const UNRESOLVED_VALUE: &str = "(unable to retrieve value from path)";

/// A value that was expected to be immutable was edited in place.
///
/// Deliberately its own type: callers must be able to tell "history is
/// corrupt" apart from every other failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("a state mutation was detected in the {object} object at path: {path}. Value: {value}")]
pub struct MutationError {
    /// Name of the audited object, for the message.
    pub object: String,
    /// Keys from the audited root to the node that changed.
    pub path: Path,
    /// Rendering of the value now found at `path`.
    pub value: String,
}

/// Outcome of one audit pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Detection {
    Clean,
    Mutated(Path),
}

impl Detection {
    pub fn was_mutated(&self) -> bool {
        matches!(self, Self::Mutated(_))
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Clean => None,
            Self::Mutated(path) => Some(path),
        }
    }
}

/// One node of the shadow tree: the value as it was seen, plus a shadow for
/// each of its keys at that time.
///
/// Holding the value keeps its allocation alive, so a later identity match can
/// never be a recycled address.
#[derive(Debug)]
struct Shadow<T> {
    value: T,
    children: BTreeMap<Key, Shadow<T>>,
}

impl<T: Reflect> Shadow<T> {
    fn build(value: &T) -> Self {
        let mut children = BTreeMap::new();
        if !value.is_leaf() {
            for key in value.own_keys() {
                if let Some(child) = value.child(&key) {
                    children.insert(key, Shadow::build(&child));
                }
            }
        }
        Self {
            value: value.clone(),
            children,
        }
    }

    fn len(&self) -> usize {
        1 + self.children.values().map(Shadow::len).sum::<usize>()
    }
}

/// Watches one value for in-place edits between checks.
pub struct MutationTracker<T> {
    root: T,
    shadow: Shadow<T>,
}

impl<T: Reflect> MutationTracker<T> {
    /// Start tracking `root` as it is right now.
    pub fn track(root: T) -> Self {
        let shadow = Shadow::build(&root);
        Self { root, shadow }
    }

    /// The value currently being watched.
    pub fn root(&self) -> &T {
        &self.root
    }

    /// Number of nodes in the shadow tree.
    pub fn shadow_len(&self) -> usize {
        self.shadow.len()
    }

    /// Compare the tracked value against its shadow.
    pub fn detect_mutations(&self) -> Detection {
        let mut path = Vec::new();
        match detect(Some(&self.shadow), Some(&self.root), false, &mut path) {
            Some(found) => Detection::Mutated(Path::from(found)),
            None => Detection::Clean,
        }
    }

    /// Audit the tracked value, then start tracking `latest`.
    ///
    /// On detection the shadow is left as it was, so the error repeats on
    /// every later check until the container is rebuilt.
    pub fn check(&mut self, latest: T, object: &str) -> Result<(), MutationError> {
        if let Detection::Mutated(path) = self.detect_mutations() {
            let value = value_at_path(&self.root, &path);
            tracing::error!(object, %path, %value, "state mutation detected");
            return Err(MutationError {
                object: object.to_owned(),
                path,
                value,
            });
        }
        self.retrack(latest);
        Ok(())
    }

    /// Rebuild the shadow from `latest` without auditing.
    pub fn retrack(&mut self, latest: T) {
        self.shadow = Shadow::build(&latest);
        self.root = latest;
    }
}

fn identical<T: Reflect>(prev: Option<&T>, current: Option<&T>) -> bool {
    match (prev, current) {
        (None, None) => true,
        (Some(prev), Some(current)) => prev.same_ref(current),
        _ => false,
    }
}

/// Walk shadow and current value in lockstep. Returns the path of the first
/// node that changed identity underneath a parent that did not.
fn detect<T: Reflect>(
    shadow: Option<&Shadow<T>>,
    current: Option<&T>,
    same_parent_ref: bool,
    path: &mut Vec<Key>,
) -> Option<Vec<Key>> {
    let prev = shadow.map(|s| &s.value);
    let same = identical(prev, current);

    if same_parent_ref && !same && !current.is_some_and(|c| c.is_nan()) {
        return Some(path.clone());
    }

    let (Some(shadow), Some(current)) = (shadow, current) else {
        return None;
    };
    if shadow.value.is_leaf() || current.is_leaf() {
        return None;
    }

    // Keys present on either side: removed keys and added keys both count.
    let keys: BTreeSet<Key> = shadow
        .children
        .keys()
        .cloned()
        .chain(current.own_keys())
        .collect();

    for key in keys {
        let child = current.child(&key);
        let child_shadow = shadow.children.get(&key);
        path.push(key);
        let found = detect(child_shadow, child.as_ref(), same, path);
        path.pop();
        if found.is_some() {
            return found;
        }
    }
    None
}

/// Best-effort rendering of the value at `path` below `root`.
///
/// Never fails: a path that does not resolve yields [`UNRESOLVED_VALUE`].
pub fn value_at_path<T: Reflect>(root: &T, path: &Path) -> String {
    let mut node = root.clone();
    for key in path {
        match node.child(key) {
            Some(child) => node = child,
            None => return UNRESOLVED_VALUE.to_owned(),
        }
    }
    format!("{node:?}")
}
