//! Domain layer for DAHAO governance
//!
//! CDD Principle: Domain Model - Pure business logic for governance aggregation
//! - Contains all core entities, value objects, and the error taxonomy
//! - Independent of infrastructure concerns like file systems or external APIs
//! - Expresses the ubiquitous language of domains, principles, terms, and discussions

pub mod model;

// Re-export main domain types for convenience
pub use model::*;
