//! Vocard: vocabulary modules, topics and cards over a partitioned table store,
//! with generated definitions and vocabulary lists.

pub mod config;
pub mod error;
pub mod extractors;
pub mod generation;
pub mod handlers;
pub mod keys;
pub mod model;
pub mod response;
pub mod routes;
pub mod service;
pub mod state;
pub mod store;

pub use config::{Settings, StorageBackend};
pub use error::{AppError, ConfigError};
pub use generation::{OpenAiGenerator, TextGenerator, UnconfiguredGenerator};
pub use keys::normalize;
pub use model::{Card, Entity, Module, Topic};
pub use routes::{app, common_routes, entity_routes, generation_routes};
pub use service::{EntityService, Page, PageRequest};
pub use state::AppState;
pub use store::{MemoryTableStore, PgTableStore, TableStore};
