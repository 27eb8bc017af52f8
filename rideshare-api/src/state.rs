use std::sync::Arc;

use rideshare_core::repository::MarketplaceStore;
use rideshare_core::BookingEngine;

pub struct AppState<S> {
    pub store: Arc<S>,
    pub engine: BookingEngine<S>,
}

impl<S: MarketplaceStore> AppState<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            engine: BookingEngine::new(Arc::clone(&store)),
            store,
        }
    }
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            engine: self.engine.clone(),
        }
    }
}
