//! Entity services: validation, key derivation, CRUD and paged reads over the table store.

mod crud;
pub mod pagination;
mod validation;
pub use crud::EntityService;
pub use pagination::{Page, PageRequest};
pub use validation::RequestValidator;
