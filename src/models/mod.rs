// src/models/mod.rs

pub mod form;
pub mod record;
pub mod report;

// Re-export so the types are reachable as crate::models::TypeName
pub use form::*;
pub use record::*;
pub use report::*;
