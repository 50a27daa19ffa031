use std::collections::HashMap;

/// Run-scoped table of node outputs, keyed by node id.
///
/// Constructed fresh for every `execute()` call and handed by reference
/// to the resolver and executors. Entries are write-once per run: a node
/// executes at most once, so a second `record` for the same id indicates
/// an engine bug.
#[derive(Debug, Clone, Default)]
pub struct OutputTable {
    values: HashMap<String, String>,
}

impl OutputTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a node's output.
    pub fn record(&mut self, node_id: impl Into<String>, value: impl Into<String>) {
        let node_id = node_id.into();
        debug_assert!(
            !self.values.contains_key(&node_id),
            "output for node '{}' recorded twice in one run",
            node_id
        );
        self.values.insert(node_id, value.into());
    }

    pub fn get(&self, node_id: &str) -> Option<&str> {
        self.values.get(node_id).map(String::as_str)
    }

    pub fn contains(&self, node_id: &str) -> bool {
        self.values.contains_key(node_id)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
