//! Extraction of annotated declarations from a parsed translation unit.

pub mod annotation;
pub mod attributes;
pub mod constant;
pub mod description;
pub mod layout;
pub mod scope;
pub mod types;
mod visitor;

pub use visitor::extract;
