pub mod resolver;

pub use resolver::{DependencyResolver, ExecutionPlan};
