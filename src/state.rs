//! Shared application state for all routes. The store and generator are injected at startup.

use crate::generation::TextGenerator;
use crate::model::{Card, Module, Topic};
use crate::service::EntityService;
use crate::store::TableStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn TableStore>,
    pub generator: Arc<dyn TextGenerator>,
    pub modules: EntityService<Module>,
    pub topics: EntityService<Topic>,
    pub cards: EntityService<Card>,
}

impl AppState {
    pub fn new(store: Arc<dyn TableStore>, generator: Arc<dyn TextGenerator>) -> Self {
        AppState {
            modules: EntityService::new(Arc::clone(&store)),
            topics: EntityService::new(Arc::clone(&store)),
            cards: EntityService::new(Arc::clone(&store)),
            store,
            generator,
        }
    }
}
