use std::sync::Arc;

use axum::extract::FromRef;
use lateshow_catalog::Catalog;

#[derive(Clone, FromRef)]
pub struct ServerContext {
    pub catalog: Arc<Catalog>,
}

impl ServerContext {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog: Arc::new(catalog),
        }
    }
}
