//! Database initialization and table definitions
//!
//! This module handles the setup of the embedded redb database. It defines
//! the document table and the code index, and the state shared by handlers.

use redb::{Database, TableDefinition};
use std::sync::Arc;

use crate::config::Settings;
use crate::store::UrlStore;

/// One document per user
///
/// Key: user id
/// Value: JSON-serialized UserUrlCollection
///
/// Example:
/// - Key: "user_123"
/// - Value: '{"userId":"user_123","urlArray":[{"shortUrl":"V1StGXR8_Z",...}],...}'
pub const TABLE_COLLECTIONS: TableDefinition<&str, &str> = TableDefinition::new("user_urls_v1");

/// Global index from short code to owning user
///
/// Gives redirects a direct lookup into the right document and acts as the
/// uniqueness constraint on codes.
///
/// Key: short code
/// Value: user id
pub const TABLE_CODE_INDEX: TableDefinition<&str, &str> = TableDefinition::new("code_index_v1");

/// Application state shared across all request handlers
#[derive(Clone)]
pub struct AppState {
    pub store: UrlStore,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(db: Database, settings: Settings) -> Self {
        Self {
            store: UrlStore::new(Arc::new(db)),
            settings: Arc::new(settings),
        }
    }
}

/// Initializes the embedded database and creates required tables
///
/// Creates or opens the database file at `db_path`, then opens both tables
/// inside a write transaction so they exist before the first read.
///
/// # Example
///
/// ```no_run
/// # use urlvault::database::init_db;
/// let db = init_db("data.db").expect("Failed to initialize database");
/// ```
pub fn init_db(db_path: &str) -> Result<Database, redb::Error> {
    let db = Database::create(db_path)?;

    let write_txn = db.begin_write()?;
    {
        write_txn.open_table(TABLE_COLLECTIONS)?;
        write_txn.open_table(TABLE_CODE_INDEX)?;
    }
    write_txn.commit()?;

    Ok(db)
}
