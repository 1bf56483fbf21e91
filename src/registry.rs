use crate::core::{Address, FoldError};
use crate::outcome::CausalRecord;
use serde::Serialize;
use std::sync::Arc;

pub type IndexPath = Vec<String>;

/// Externally visible identity of a produced entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Handle {
    /// Contract (or entity) kind, e.g. `PriceOracleProxy`.
    pub kind: String,
    pub address: Address,
}

impl Handle {
    pub fn new(kind: impl Into<String>, address: Address) -> Self {
        Self {
            kind: kind.into(),
            address,
        }
    }
}

/// Metadata published under an index path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexedData {
    pub index: IndexPath,
    pub data: serde_json::Value,
}

impl IndexedData {
    pub fn new<I, S>(index: I, data: serde_json::Value) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            index: index.into_iter().map(Into::into).collect(),
            data,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistryEntry {
    pub name: String,
    pub handle: Handle,
    pub record: CausalRecord,
    pub metadata: Vec<IndexedData>,
    /// 1-based position in the registry.
    pub sequence: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct IndexSlot {
    entry: usize,
    metadata: usize,
}

/// Append-only, name-indexed store of produced entities.
///
/// Cloning is cheap: the `im` collections share structure, so every snapshot
/// stays valid after later entries are added to a clone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registry {
    entries: im::Vector<Arc<RegistryEntry>>,
    by_name: im::HashMap<String, usize>,
    by_index: im::HashMap<IndexPath, im::Vector<IndexSlot>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Entry by name. An address literal is matched in its full-width form.
    pub fn get(&self, name: &str) -> Option<&RegistryEntry> {
        let position = match self.by_name.get(name) {
            Some(position) => position,
            None => self.by_name.get(Address::parse(name)?.as_str())?,
        };
        self.entries.get(*position).map(|entry| entry.as_ref())
    }

    /// Entries in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = &RegistryEntry> {
        self.entries.iter().map(|entry| entry.as_ref())
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries().map(|entry| entry.name.as_str()).collect()
    }

    /// Latest entry published under `path`, with the data it published there.
    pub fn lookup_index<S: AsRef<str>>(
        &self,
        path: &[S],
    ) -> Option<(&RegistryEntry, &serde_json::Value)> {
        let slot = self.by_index.get(&to_path(path))?.last()?;
        self.slot(*slot)
    }

    /// Every entry ever published under `path`, oldest first.
    pub fn index_history<S: AsRef<str>>(
        &self,
        path: &[S],
    ) -> Vec<(&RegistryEntry, &serde_json::Value)> {
        self.by_index
            .get(&to_path(path))
            .map(|slots| slots.iter().filter_map(|slot| self.slot(*slot)).collect())
            .unwrap_or_default()
    }

    /// Address for a name: an entry name first, then a one-segment index path.
    pub fn resolve_address(&self, name: &str) -> Option<&Address> {
        if let Some(entry) = self.get(name) {
            return Some(&entry.handle.address);
        }
        self.lookup_index(&[name])
            .map(|(entry, _)| &entry.handle.address)
    }

    /// Return a new registry holding every current entry plus `entry`.
    /// `self` is left untouched.
    pub fn with_entry(&self, entry: RegistryEntry) -> Result<Self, FoldError> {
        if self.by_name.contains_key(&entry.name) {
            return Err(FoldError::DuplicateName(entry.name));
        }
        for indexed in &entry.metadata {
            if indexed.index.is_empty() || indexed.index.iter().any(|seg| seg.trim().is_empty()) {
                return Err(FoldError::MalformedIndex(format!("{:?}", indexed.index)));
            }
        }

        let position = self.entries.len();
        let mut next = self.clone();

        for (metadata, indexed) in entry.metadata.iter().enumerate() {
            next.by_index
                .entry(indexed.index.clone())
                .or_insert_with(im::Vector::new)
                .push_back(IndexSlot {
                    entry: position,
                    metadata,
                });
        }
        next.by_name.insert(entry.name.clone(), position);
        next.entries.push_back(Arc::new(entry));

        Ok(next)
    }

    fn slot(&self, slot: IndexSlot) -> Option<(&RegistryEntry, &serde_json::Value)> {
        let entry = self.entries.get(slot.entry)?;
        let data = &entry.metadata.get(slot.metadata)?.data;
        Some((entry.as_ref(), data))
    }
}

fn to_path<S: AsRef<str>>(path: &[S]) -> IndexPath {
    path.iter().map(|seg| seg.as_ref().to_string()).collect()
}
