pub mod handlers;
pub mod routes;

pub use routes::*;

use crate::core::classifier::ClassifierService;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub classifier: Arc<ClassifierService>,
}

impl AppState {
    pub fn new(classifier: Arc<ClassifierService>) -> Self {
        Self { classifier }
    }
}
