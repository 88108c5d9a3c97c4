//! Tool registry: name lookup over the catalog.

use std::collections::HashMap;

use rmcp::model::Tool;

use crate::catalog::{Category, ToolEntry, catalog};

/// Immutable catalog of invocable tools, indexed by name.
#[derive(Debug)]
pub struct Registry {
    entries: Vec<ToolEntry>,
    index: HashMap<&'static str, usize>,
}

impl Registry {
    /// Registry over the full CRM catalog.
    pub fn new() -> Self {
        Self::from_entries(catalog())
    }

    /// Build from arbitrary entries. On duplicate names the first entry wins.
    pub fn from_entries(entries: Vec<ToolEntry>) -> Self {
        let mut index = HashMap::with_capacity(entries.len());
        for (position, entry) in entries.iter().enumerate() {
            index.entry(entry.name).or_insert(position);
        }
        Self { entries, index }
    }

    pub fn get(&self, name: &str) -> Option<&ToolEntry> {
        self.index.get(name).map(|&i| &self.entries[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Entries in catalog order.
    pub fn entries(&self) -> &[ToolEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|e| e.name)
    }

    pub fn in_category(&self, category: Category) -> impl Iterator<Item = &ToolEntry> + '_ {
        self.entries.iter().filter(move |e| e.category == category)
    }

    /// Descriptors for `tools/list`, in catalog order.
    pub fn descriptors(&self) -> Vec<Tool> {
        self.entries.iter().map(ToolEntry::descriptor).collect()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
