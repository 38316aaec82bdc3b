use std::collections::HashMap;

use crate::error::CatalogError;

use super::deliverable::{Category, Deliverable, DeliverableId};

/// Identifiers of the built-in deliverables.
pub mod names {
    pub const RGB_PRE_FIRE: &str = "RGB_PRE_FIRE";
    pub const RGB_POST_FIRE: &str = "RGB_POST_FIRE";
    pub const NDVI_PRE_FIRE: &str = "NDVI_PRE_FIRE";
    pub const NDVI_POST_FIRE: &str = "NDVI_POST_FIRE";
    pub const NBR_PRE_FIRE: &str = "NBR_PRE_FIRE";
    pub const NBR_POST_FIRE: &str = "NBR_POST_FIRE";
    pub const DNBR: &str = "DNBR";
    pub const RBR: &str = "RBR";
    pub const DNBR_SEVERITY: &str = "DNBR_SEVERITY";
    pub const RBR_SEVERITY: &str = "RBR_SEVERITY";

    pub const RGB_PRE_FIRE_VISUAL: &str = "RGB_PRE_FIRE_VISUAL";
    pub const RGB_POST_FIRE_VISUAL: &str = "RGB_POST_FIRE_VISUAL";
    pub const DNBR_VISUAL: &str = "DNBR_VISUAL";
    pub const RBR_VISUAL: &str = "RBR_VISUAL";
    pub const DNBR_SEVERITY_VISUAL: &str = "DNBR_SEVERITY_VISUAL";
    pub const RBR_SEVERITY_VISUAL: &str = "RBR_SEVERITY_VISUAL";

    pub const DNBR_AREA_STATISTICS: &str = "DNBR_AREA_STATISTICS";
    pub const RBR_AREA_STATISTICS: &str = "RBR_AREA_STATISTICS";
}

struct PendingEntry {
    name: String,
    category: Category,
    dependencies: Vec<String>,
}

/// Collects deliverable definitions and validates them into a [`DeliverableCatalog`].
#[derive(Default)]
pub struct CatalogBuilder {
    entries: Vec<PendingEntry>,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a deliverable. Dependencies may reference entries registered later.
    pub fn register(mut self, name: &str, category: Category, dependencies: &[&str]) -> Self {
        self.entries.push(PendingEntry {
            name: canonical(name),
            category,
            dependencies: dependencies.iter().map(|d| canonical(d)).collect(),
        });
        self
    }

    /// Builds the catalog, rejecting duplicates, dangling edges and cycles.
    pub fn build(self) -> Result<DeliverableCatalog, CatalogError> {
        let catalog = self.intern()?;
        validate_acyclic(&catalog)?;
        Ok(catalog)
    }

    /// Builds without the cycle check so resolver safeguards can be exercised.
    #[cfg(test)]
    pub(crate) fn build_unchecked(self) -> Result<DeliverableCatalog, CatalogError> {
        self.intern()
    }

    fn intern(self) -> Result<DeliverableCatalog, CatalogError> {
        let mut by_name = HashMap::with_capacity(self.entries.len());
        for (index, entry) in self.entries.iter().enumerate() {
            if by_name
                .insert(entry.name.clone(), DeliverableId::from_index(index))
                .is_some()
            {
                return Err(CatalogError::DuplicateDeliverable(entry.name.clone()));
            }
        }

        let mut entries = Vec::with_capacity(self.entries.len());
        for (index, entry) in self.entries.into_iter().enumerate() {
            let mut dependencies = Vec::with_capacity(entry.dependencies.len());
            for dependency in &entry.dependencies {
                let id = by_name.get(dependency).copied().ok_or_else(|| {
                    CatalogError::DanglingDependency {
                        deliverable: entry.name.clone(),
                        dependency: dependency.clone(),
                    }
                })?;
                dependencies.push(id);
            }
            entries.push(Deliverable {
                id: DeliverableId::from_index(index),
                name: entry.name,
                category: entry.category,
                dependencies,
            });
        }

        Ok(DeliverableCatalog { entries, by_name })
    }
}

/// Read-only registry of deliverables, shared by every pipeline in the process.
#[derive(Debug, Clone)]
pub struct DeliverableCatalog {
    entries: Vec<Deliverable>,
    by_name: HashMap<String, DeliverableId>,
}

impl DeliverableCatalog {
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::new()
    }

    /// The built-in burn-severity catalog.
    ///
    /// Visual and statistic products are evaluated lazily by the compute
    /// backend from the request windows, so none of them depends on a
    /// scientific export.
    pub fn standard() -> Result<Self, CatalogError> {
        use names::*;
        use Category::{Scientific, Statistic, Visual};

        CatalogBuilder::new()
            .register(RGB_PRE_FIRE, Scientific, &[])
            .register(RGB_POST_FIRE, Scientific, &[])
            .register(NDVI_PRE_FIRE, Scientific, &[])
            .register(NDVI_POST_FIRE, Scientific, &[])
            .register(NBR_PRE_FIRE, Scientific, &[])
            .register(NBR_POST_FIRE, Scientific, &[])
            .register(DNBR, Scientific, &[NBR_PRE_FIRE, NBR_POST_FIRE])
            .register(RBR, Scientific, &[DNBR, NBR_PRE_FIRE])
            .register(DNBR_SEVERITY, Scientific, &[DNBR])
            .register(RBR_SEVERITY, Scientific, &[RBR])
            .register(RGB_PRE_FIRE_VISUAL, Visual, &[])
            .register(RGB_POST_FIRE_VISUAL, Visual, &[])
            .register(DNBR_VISUAL, Visual, &[])
            .register(RBR_VISUAL, Visual, &[])
            .register(DNBR_SEVERITY_VISUAL, Visual, &[])
            .register(RBR_SEVERITY_VISUAL, Visual, &[])
            .register(DNBR_AREA_STATISTICS, Statistic, &[])
            .register(RBR_AREA_STATISTICS, Statistic, &[])
            .build()
    }

    /// Looks up an identifier (case-insensitive).
    pub fn lookup(&self, name: &str) -> Result<DeliverableId, CatalogError> {
        self.by_name
            .get(&canonical(name))
            .copied()
            .ok_or_else(|| CatalogError::UnknownDeliverable(name.trim().to_string()))
    }

    /// Returns the entry for an id issued by this catalog.
    pub fn get(&self, id: DeliverableId) -> &Deliverable {
        &self.entries[id.index()]
    }

    pub fn name_of(&self, id: DeliverableId) -> &str {
        &self.get(id).name
    }

    pub fn dependencies_of(&self, name: &str) -> Result<Vec<&str>, CatalogError> {
        let id = self.lookup(name)?;
        Ok(self
            .get(id)
            .dependencies
            .iter()
            .map(|dep| self.name_of(*dep))
            .collect())
    }

    pub fn category_of(&self, name: &str) -> Result<Category, CatalogError> {
        let id = self.lookup(name)?;
        Ok(self.get(id).category)
    }

    /// All identifiers in registration order.
    pub fn all_identifiers(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    pub fn deliverables(&self) -> &[Deliverable] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn canonical(name: &str) -> String {
    name.trim().to_ascii_uppercase()
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

fn validate_acyclic(catalog: &DeliverableCatalog) -> Result<(), CatalogError> {
    let mut marks = vec![Mark::Unvisited; catalog.len()];
    let mut path = Vec::new();
    for entry in catalog.deliverables() {
        visit(catalog, entry.id, &mut marks, &mut path)?;
    }
    Ok(())
}

fn visit(
    catalog: &DeliverableCatalog,
    id: DeliverableId,
    marks: &mut [Mark],
    path: &mut Vec<DeliverableId>,
) -> Result<(), CatalogError> {
    match marks[id.index()] {
        Mark::Done => return Ok(()),
        Mark::InProgress => {
            let start = path.iter().position(|p| *p == id).unwrap_or(0);
            let mut cycle: Vec<String> = path[start..]
                .iter()
                .map(|p| catalog.name_of(*p).to_string())
                .collect();
            cycle.push(catalog.name_of(id).to_string());
            return Err(CatalogError::CyclicDependency { cycle });
        }
        Mark::Unvisited => {}
    }

    marks[id.index()] = Mark::InProgress;
    path.push(id);
    for dependency in catalog.get(id).dependencies() {
        visit(catalog, *dependency, marks, path)?;
    }
    path.pop();
    marks[id.index()] = Mark::Done;
    Ok(())
}
