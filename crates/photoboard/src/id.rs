use std::fmt;
use std::sync::Arc;

/// Opaque key of a fetchable remote resource (a locator URL).
///
/// Cloning is cheap; equality and hashing follow the locator string.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceId(Arc<str>);

impl ResourceId {
    pub fn new(locator: impl Into<Arc<str>>) -> Self {
        Self(locator.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ResourceId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// Ordered identifiers currently known to the renderer.
///
/// Grows by appending; a bulk reload replaces the whole sequence.
#[derive(Debug, Clone, Default)]
pub struct IdentifierSet {
    ids: Vec<ResourceId>,
}

impl IdentifierSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ResourceId> {
        self.ids.get(index)
    }

    /// Append an identifier and return its index.
    pub fn push(&mut self, id: ResourceId) -> usize {
        self.ids.push(id);
        self.ids.len() - 1
    }

    /// Replace the whole sequence.
    pub fn replace(&mut self, ids: impl IntoIterator<Item = ResourceId>) {
        self.ids = ids.into_iter().collect();
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResourceId> {
        self.ids.iter()
    }
}
