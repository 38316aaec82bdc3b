use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Index of a deliverable inside the catalog that created it.
///
/// Ids are only meaningful for the catalog that issued them; resolving an id
/// against a different catalog is a logic error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeliverableId(u32);

impl DeliverableId {
    pub(crate) fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// What kind of product a deliverable is, which decides how it is dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    /// Raster exported asynchronously to object storage.
    Scientific,
    /// Preview image available synchronously as a retrievable locator.
    Visual,
    /// Numeric summary returned synchronously.
    Statistic,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Scientific => write!(f, "SCIENTIFIC"),
            Category::Visual => write!(f, "VISUAL"),
            Category::Statistic => write!(f, "STATISTIC"),
        }
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "SCIENTIFIC" => Ok(Category::Scientific),
            "VISUAL" => Ok(Category::Visual),
            "STATISTIC" => Ok(Category::Statistic),
            other => Err(format!("unknown deliverable category '{}'", other)),
        }
    }
}

/// A catalog entry. Immutable once the catalog is built.
#[derive(Debug, Clone)]
pub struct Deliverable {
    pub(crate) id: DeliverableId,
    pub(crate) name: String,
    pub(crate) category: Category,
    pub(crate) dependencies: Vec<DeliverableId>,
}

impl Deliverable {
    pub fn id(&self) -> DeliverableId {
        self.id
    }

    /// Canonical (upper-case) identifier.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> Category {
        self.category
    }

    /// Direct dependencies in declaration order.
    pub fn dependencies(&self) -> &[DeliverableId] {
        &self.dependencies
    }

    pub fn is_scientific(&self) -> bool {
        self.category == Category::Scientific
    }
}
