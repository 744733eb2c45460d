use crate::errors::MarketError;
use std::fmt::{self, Debug};
use tracing::info;
use turso::{Connection, Database};

pub mod sql;

/// A provider for the marketplace database, backed by Turso.
///
/// This provider holds a `Database` instance. When cloned, it shares the same
/// underlying database, so an in-memory instance can be shared between the
/// server and a test harness by cloning the provider.
#[derive(Clone)]
pub struct SqliteProvider {
    /// The Turso database instance. It's cloneable and thread-safe.
    pub db: Database,
}

impl SqliteProvider {
    /// Opens (or creates) the database at `db_path`. Use ":memory:" for an
    /// isolated in-memory database.
    pub async fn new(db_path: &str) -> Result<Self, MarketError> {
        let db = turso::Builder::new_local(db_path).build().await?;

        // WAL has no effect on in-memory databases but is safe to request.
        // `query` is used because the PRAGMA returns a row.
        let conn = db.connect()?;
        conn.query("PRAGMA journal_mode=WAL;", ()).await?;

        Ok(Self { db })
    }

    /// Ensures that all application tables exist.
    /// This function is idempotent and safe to call on every startup.
    pub async fn initialize_schema(&self) -> Result<(), MarketError> {
        let conn = self.db.connect()?;
        for statement in sql::ALL_TABLE_CREATION_SQL {
            conn.execute(statement, ()).await?;
        }
        info!("Marketplace schema is up to date.");
        Ok(())
    }

    pub fn connect(&self) -> Result<Connection, MarketError> {
        Ok(self.db.connect()?)
    }
}

impl Debug for SqliteProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteProvider").finish_non_exhaustive()
    }
}

impl AsRef<Database> for SqliteProvider {
    fn as_ref(&self) -> &Database {
        &self.db
    }
}
