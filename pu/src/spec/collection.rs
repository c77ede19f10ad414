//! Insertion-ordered collection of pipeline specs keyed by name

use std::collections::HashMap;

use tracing::{debug, warn};

use super::PipelineSpec;

/// Pipeline specs keyed by pipeline name
///
/// Iteration follows first-insertion order. Inserting a spec whose name is
/// already present replaces the earlier spec in place (last loaded wins).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineCollection {
    specs: Vec<PipelineSpec>,
    index: HashMap<String, usize>,
}

impl PipelineCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a spec, returning the spec it replaced
    pub fn insert(&mut self, spec: PipelineSpec) -> Option<PipelineSpec> {
        debug!(pipeline = %spec.name(), "PipelineCollection::insert: called");
        match self.index.get(spec.name()) {
            Some(&idx) => {
                let previous = std::mem::replace(&mut self.specs[idx], spec);
                warn!(
                    pipeline = %previous.name(),
                    replaced = %previous.source().display(),
                    by = %self.specs[idx].source().display(),
                    "Pipeline declared more than once, keeping the later spec"
                );
                Some(previous)
            }
            None => {
                self.index.insert(spec.name().to_string(), self.specs.len());
                self.specs.push(spec);
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&PipelineSpec> {
        self.index.get(name).map(|&idx| &self.specs[idx])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PipelineSpec> {
        self.specs.iter()
    }

    /// Mutable access for in-place document edits; names cannot change
    pub(crate) fn iter_mut(&mut self) -> std::slice::IterMut<'_, PipelineSpec> {
        self.specs.iter_mut()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.specs.iter().map(PipelineSpec::name)
    }
}

impl FromIterator<PipelineSpec> for PipelineCollection {
    fn from_iter<I: IntoIterator<Item = PipelineSpec>>(iter: I) -> Self {
        let mut collection = Self::new();
        for spec in iter {
            collection.insert(spec);
        }
        collection
    }
}

impl<'a> IntoIterator for &'a PipelineCollection {
    type Item = &'a PipelineSpec;
    type IntoIter = std::slice::Iter<'a, PipelineSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
