mod auth;
mod db;
mod token;

use std::sync::Arc;

pub use auth::*;
pub use db::*;
pub use token::*;

/// The Late Show catalog, holding the guests, episodes and appearances along with authentication.
pub struct Catalog {
    database: Arc<dyn Database>,

    pub auth: Auth,
}

impl Catalog {
    pub fn new<Db>(database: Db, settings: AuthSettings) -> Self
    where
        Db: Database + 'static,
    {
        let database: Arc<dyn Database> = Arc::new(database);
        let auth = Auth::new(&database, settings);

        Self { database, auth }
    }

    /// Returns the underlying storage
    pub fn db(&self) -> &dyn Database {
        self.database.as_ref()
    }
}
