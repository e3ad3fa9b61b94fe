//! HTTP handlers for entity CRUD and text generation.

pub mod entity;
pub mod generation;
pub use entity::*;
pub use generation::*;
