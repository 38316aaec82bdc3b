//! Registry of deliverable definitions and their dependency edges.

pub mod deliverable;
pub mod registry;

pub use deliverable::{Category, Deliverable, DeliverableId};
pub use registry::{names, CatalogBuilder, DeliverableCatalog};
