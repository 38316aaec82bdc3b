//! Expansion of a requested deliverable set into an ordered execution plan.
//!
//! Resolution is a depth-first post-order walk: dependencies are visited in
//! the order declared on their catalog entry, requested identifiers in the
//! order the caller supplied them, and every identifier is emitted once, the
//! first time it is fully visited. The result is a pure function of the
//! catalog and the input sequence.

use std::collections::HashMap;

use crate::catalog::{Category, DeliverableCatalog, DeliverableId};
use crate::error::CatalogError;

/// Dependency-ordered, deduplicated sequence of deliverables for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionPlan {
    steps: Vec<DeliverableId>,
    requested: Vec<DeliverableId>,
}

impl ExecutionPlan {
    /// Steps in execution order; every dependency precedes its dependents.
    pub fn steps(&self) -> &[DeliverableId] {
        &self.steps
    }

    /// Top-level identifiers in the order the caller asked for them (deduplicated).
    pub fn requested(&self) -> &[DeliverableId] {
        &self.requested
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn contains(&self, id: DeliverableId) -> bool {
        self.steps.contains(&id)
    }

    pub fn position(&self, id: DeliverableId) -> Option<usize> {
        self.steps.iter().position(|s| *s == id)
    }

    pub fn names<'c>(&self, catalog: &'c DeliverableCatalog) -> Vec<&'c str> {
        self.steps.iter().map(|id| catalog.name_of(*id)).collect()
    }

    /// Number of steps of a given category.
    pub fn count_of(&self, catalog: &DeliverableCatalog, category: Category) -> usize {
        self.steps
            .iter()
            .filter(|id| catalog.get(**id).category() == category)
            .count()
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    InProgress,
    Done,
}

pub struct DependencyResolver<'a> {
    catalog: &'a DeliverableCatalog,
}

impl<'a> DependencyResolver<'a> {
    pub fn new(catalog: &'a DeliverableCatalog) -> Self {
        Self { catalog }
    }

    /// Resolves identifiers by name. Unknown names fail before any traversal.
    pub fn resolve<S: AsRef<str>>(&self, requested: &[S]) -> Result<ExecutionPlan, CatalogError> {
        let ids = requested
            .iter()
            .map(|name| self.catalog.lookup(name.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        self.resolve_ids(&ids)
    }

    pub fn resolve_ids(&self, requested: &[DeliverableId]) -> Result<ExecutionPlan, CatalogError> {
        let mut marks: HashMap<DeliverableId, Visit> = HashMap::new();
        let mut path = Vec::new();
        let mut steps = Vec::new();
        let mut top_level = Vec::with_capacity(requested.len());

        for id in requested {
            if !top_level.contains(id) {
                top_level.push(*id);
            }
            self.visit(*id, &mut marks, &mut path, &mut steps)?;
        }

        Ok(ExecutionPlan {
            steps,
            requested: top_level,
        })
    }

    fn visit(
        &self,
        id: DeliverableId,
        marks: &mut HashMap<DeliverableId, Visit>,
        path: &mut Vec<DeliverableId>,
        steps: &mut Vec<DeliverableId>,
    ) -> Result<(), CatalogError> {
        match marks.get(&id) {
            Some(Visit::Done) => return Ok(()),
            Some(Visit::InProgress) => {
                let start = path.iter().position(|p| *p == id).unwrap_or(0);
                let mut cycle: Vec<String> = path[start..]
                    .iter()
                    .map(|p| self.catalog.name_of(*p).to_string())
                    .collect();
                cycle.push(self.catalog.name_of(id).to_string());
                return Err(CatalogError::CyclicDependency { cycle });
            }
            None => {}
        }

        marks.insert(id, Visit::InProgress);
        path.push(id);
        for dependency in self.catalog.get(id).dependencies() {
            self.visit(*dependency, marks, path, steps)?;
        }
        path.pop();
        marks.insert(id, Visit::Done);
        steps.push(id);
        Ok(())
    }
}
