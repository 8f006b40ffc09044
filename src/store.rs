//! Document access for user URL collections
//!
//! Every mutation runs inside a single redb write transaction. redb allows
//! one writer at a time, so reading a collection, changing it in memory and
//! writing it back cannot interleave with another request for the same user.

use redb::{Database, ReadableDatabase, ReadableTable, StorageError, WriteTransaction};
use serde::de::DeserializeOwned;
use std::sync::Arc;

use crate::database::{TABLE_CODE_INDEX, TABLE_COLLECTIONS};
use crate::error::StoreError;
use crate::model::{UrlEntry, UserUrlCollection};

/// How many freshly generated codes to try before giving up on a create
pub const MAX_CODE_ATTEMPTS: usize = 8;

#[derive(Clone)]
pub struct UrlStore {
    db: Arc<Database>,
}

impl UrlStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Loads the collection owned by `user_id`, if the user ever created a URL.
    pub fn find_collection(&self, user_id: &str) -> Result<Option<UserUrlCollection>, StoreError> {
        let read_txn = self.db.begin_read()?;
        let collections = read_txn.open_table(TABLE_COLLECTIONS)?;
        read_json(&collections, user_id)
    }

    /// Finds the entry carrying `code`, whoever owns it.
    pub fn find_entry(&self, code: &str) -> Result<Option<UrlEntry>, StoreError> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(TABLE_CODE_INDEX)?;
        let Some(owner) = read_owner(&index, code)? else {
            return Ok(None);
        };

        let collections = read_txn.open_table(TABLE_COLLECTIONS)?;
        let collection: Option<UserUrlCollection> = read_json(&collections, &owner)?;
        collection
            .and_then(|collection| collection.find(code).cloned())
            .map(Some)
            .ok_or_else(|| StoreError::DanglingIndex(code.to_string()))
    }

    /// Appends a new entry for `original_url` to the user's collection,
    /// creating the collection on first use.
    ///
    /// `next_code` is called until it yields a code that is not in the index,
    /// at most [`MAX_CODE_ATTEMPTS`] times.
    pub fn append_entry(
        &self,
        user_id: &str,
        original_url: &str,
        mut next_code: impl FnMut() -> String,
    ) -> Result<UrlEntry, StoreError> {
        let write_txn = self.db.begin_write()?;
        let entry = append_in(&write_txn, user_id, original_url, &mut next_code)?;
        write_txn.commit()?;
        Ok(entry)
    }

    /// Removes the entry `code` from the collection of `user_id`.
    ///
    /// Returns `false` when the code does not exist or belongs to somebody
    /// else; nothing is written in that case.
    pub fn remove_entry(&self, user_id: &str, code: &str) -> Result<bool, StoreError> {
        let write_txn = self.db.begin_write()?;
        let removed = remove_in(&write_txn, user_id, code)?;
        if removed {
            write_txn.commit()?;
        } else {
            write_txn.abort()?;
        }
        Ok(removed)
    }

    /// Sets the visit count of `code` to `previous_count + 1`, or to the
    /// stored count + 1 if another redirect already moved it further.
    ///
    /// Returns the new count, or `None` if the code vanished in the meantime.
    pub fn increment_visit_count(
        &self,
        code: &str,
        previous_count: u64,
    ) -> Result<Option<u64>, StoreError> {
        let write_txn = self.db.begin_write()?;
        let count = increment_in(&write_txn, code, previous_count)?;
        match count {
            Some(_) => write_txn.commit()?,
            None => write_txn.abort()?,
        }
        Ok(count)
    }
}

fn read_json<T, D>(table: &T, key: &str) -> Result<Option<D>, StoreError>
where
    T: ReadableTable<&'static str, &'static str>,
    D: DeserializeOwned,
{
    let doc = match table.get(key)? {
        Some(value) => Some(serde_json::from_str(value.value())?),
        None => None,
    };
    Ok(doc)
}

fn read_owner<T>(index: &T, code: &str) -> Result<Option<String>, StorageError>
where
    T: ReadableTable<&'static str, &'static str>,
{
    let owner = index.get(code)?.map(|value| value.value().to_string());
    Ok(owner)
}

fn unique_code<T>(index: &T, next_code: &mut impl FnMut() -> String) -> Result<String, StoreError>
where
    T: ReadableTable<&'static str, &'static str>,
{
    for _ in 0..MAX_CODE_ATTEMPTS {
        let code = next_code();
        if index.get(code.as_str())?.is_none() {
            return Ok(code);
        }
        tracing::warn!(code = %code, "short code collision, regenerating");
    }
    Err(StoreError::CodeSpaceExhausted(MAX_CODE_ATTEMPTS))
}

fn append_in(
    txn: &WriteTransaction,
    user_id: &str,
    original_url: &str,
    next_code: &mut impl FnMut() -> String,
) -> Result<UrlEntry, StoreError> {
    let mut index = txn.open_table(TABLE_CODE_INDEX)?;
    let mut collections = txn.open_table(TABLE_COLLECTIONS)?;

    let code = unique_code(&index, next_code)?;
    let mut collection = read_json::<_, UserUrlCollection>(&collections, user_id)?
        .unwrap_or_else(|| UserUrlCollection::new(user_id));

    let entry = UrlEntry::new(code, original_url);
    collection.push(entry.clone());

    let doc = serde_json::to_string(&collection)?;
    collections.insert(user_id, doc.as_str())?;
    index.insert(entry.short_url.as_str(), user_id)?;
    Ok(entry)
}

fn remove_in(txn: &WriteTransaction, user_id: &str, code: &str) -> Result<bool, StoreError> {
    let mut index = txn.open_table(TABLE_CODE_INDEX)?;
    if read_owner(&index, code)?.as_deref() != Some(user_id) {
        return Ok(false);
    }

    let mut collections = txn.open_table(TABLE_COLLECTIONS)?;
    let Some(mut collection) = read_json::<_, UserUrlCollection>(&collections, user_id)? else {
        return Err(StoreError::DanglingIndex(code.to_string()));
    };
    if collection.remove(code).is_none() {
        return Err(StoreError::DanglingIndex(code.to_string()));
    }

    let doc = serde_json::to_string(&collection)?;
    collections.insert(user_id, doc.as_str())?;
    index.remove(code)?;
    Ok(true)
}

fn increment_in(
    txn: &WriteTransaction,
    code: &str,
    previous_count: u64,
) -> Result<Option<u64>, StoreError> {
    let index = txn.open_table(TABLE_CODE_INDEX)?;
    let Some(owner) = read_owner(&index, code)? else {
        return Ok(None);
    };

    let mut collections = txn.open_table(TABLE_COLLECTIONS)?;
    let Some(mut collection) = read_json::<_, UserUrlCollection>(&collections, &owner)? else {
        return Err(StoreError::DanglingIndex(code.to_string()));
    };
    let Some(count) = collection.record_visit(code, previous_count) else {
        return Err(StoreError::DanglingIndex(code.to_string()));
    };

    let doc = serde_json::to_string(&collection)?;
    collections.insert(owner.as_str(), doc.as_str())?;
    Ok(Some(count))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::init_db;
    use crate::shortcode::generate_code;
    use tempfile::NamedTempFile;

    fn setup_store() -> (UrlStore, NamedTempFile) {
        let temp_db = NamedTempFile::new().expect("Failed to create temp file");
        let db = init_db(temp_db.path().to_str().unwrap()).expect("Failed to init db");
        (UrlStore::new(Arc::new(db)), temp_db)
    }

    fn fixed(code: &'static str) -> impl FnMut() -> String {
        move || code.to_string()
    }

    #[test]
    fn append_creates_collection_lazily() {
        let (store, _temp_db) = setup_store();
        assert!(store.find_collection("alice").unwrap().is_none());

        let entry = store
            .append_entry("alice", "https://example.com", generate_code)
            .unwrap();
        assert_eq!(entry.visit_count, 0);

        let collection = store.find_collection("alice").unwrap().unwrap();
        assert_eq!(collection.user_id, "alice");
        assert_eq!(collection.url_array, vec![entry]);
    }

    #[test]
    fn append_keeps_creation_order() {
        let (store, _temp_db) = setup_store();
        store.append_entry("alice", "https://a.example", fixed("aaaaaaaaaa")).unwrap();
        store.append_entry("alice", "https://b.example", fixed("bbbbbbbbbb")).unwrap();
        store.append_entry("alice", "https://c.example", fixed("cccccccccc")).unwrap();

        let codes: Vec<_> = store
            .find_collection("alice")
            .unwrap()
            .unwrap()
            .url_array
            .into_iter()
            .map(|entry| entry.short_url)
            .collect();
        assert_eq!(codes, ["aaaaaaaaaa", "bbbbbbbbbb", "cccccccccc"]);
    }

    #[test]
    fn colliding_code_is_regenerated() {
        let (store, _temp_db) = setup_store();
        store.append_entry("alice", "https://a.example", fixed("taken00000")).unwrap();

        let mut candidates = vec!["fresh00000", "taken00000"];
        let entry = store
            .append_entry("bob", "https://b.example", || candidates.pop().unwrap().to_string())
            .unwrap();
        assert_eq!(entry.short_url, "fresh00000");

        // The original owner keeps the taken code
        let owner = store.find_entry("taken00000").unwrap().unwrap();
        assert_eq!(owner.original_url, "https://a.example");
    }

    #[test]
    fn exhausted_code_space_writes_nothing() {
        let (store, _temp_db) = setup_store();
        store.append_entry("alice", "https://a.example", fixed("taken00000")).unwrap();

        let err = store
            .append_entry("bob", "https://b.example", fixed("taken00000"))
            .unwrap_err();
        assert!(matches!(err, StoreError::CodeSpaceExhausted(MAX_CODE_ATTEMPTS)));
        assert!(store.find_collection("bob").unwrap().is_none());
    }

    #[test]
    fn find_entry_crosses_users() {
        let (store, _temp_db) = setup_store();
        store.append_entry("alice", "https://a.example", fixed("alicecode0")).unwrap();
        store.append_entry("bob", "https://b.example", fixed("bobcode000")).unwrap();

        let entry = store.find_entry("bobcode000").unwrap().unwrap();
        assert_eq!(entry.original_url, "https://b.example");
        assert!(store.find_entry("missing000").unwrap().is_none());
    }

    #[test]
    fn remove_only_touches_matching_entry() {
        let (store, _temp_db) = setup_store();
        store.append_entry("alice", "https://a.example", fixed("aaaaaaaaaa")).unwrap();
        store.append_entry("alice", "https://b.example", fixed("bbbbbbbbbb")).unwrap();
        store.append_entry("alice", "https://c.example", fixed("cccccccccc")).unwrap();

        assert!(store.remove_entry("alice", "bbbbbbbbbb").unwrap());

        let codes: Vec<_> = store
            .find_collection("alice")
            .unwrap()
            .unwrap()
            .url_array
            .into_iter()
            .map(|entry| entry.short_url)
            .collect();
        assert_eq!(codes, ["aaaaaaaaaa", "cccccccccc"]);
        assert!(store.find_entry("bbbbbbbbbb").unwrap().is_none());
    }

    #[test]
    fn remove_refuses_foreign_entries() {
        let (store, _temp_db) = setup_store();
        store.append_entry("alice", "https://a.example", fixed("alicecode0")).unwrap();

        assert!(!store.remove_entry("mallory", "alicecode0").unwrap());
        assert!(store.find_entry("alicecode0").unwrap().is_some());
        assert!(store.find_collection("mallory").unwrap().is_none());
    }

    #[test]
    fn removing_last_entry_keeps_collection() {
        let (store, _temp_db) = setup_store();
        store.append_entry("alice", "https://a.example", fixed("alicecode0")).unwrap();
        assert!(store.remove_entry("alice", "alicecode0").unwrap());
        assert!(!store.remove_entry("alice", "alicecode0").unwrap());

        let collection = store.find_collection("alice").unwrap().unwrap();
        assert!(collection.url_array.is_empty());
    }

    #[test]
    fn serial_increments_count_every_visit() {
        let (store, _temp_db) = setup_store();
        store.append_entry("alice", "https://a.example", fixed("alicecode0")).unwrap();

        for expected in 1..=5 {
            let seen = store.find_entry("alicecode0").unwrap().unwrap().visit_count;
            let count = store.increment_visit_count("alicecode0", seen).unwrap();
            assert_eq!(count, Some(expected));
        }
        let entry = store.find_entry("alicecode0").unwrap().unwrap();
        assert_eq!(entry.visit_count, 5);
    }

    #[test]
    fn stale_previous_count_never_moves_backwards() {
        let (store, _temp_db) = setup_store();
        store.append_entry("alice", "https://a.example", fixed("alicecode0")).unwrap();

        // Two redirects that both observed a count of zero
        assert_eq!(store.increment_visit_count("alicecode0", 0).unwrap(), Some(1));
        assert_eq!(store.increment_visit_count("alicecode0", 0).unwrap(), Some(2));
    }

    #[test]
    fn increment_of_deleted_code_is_none() {
        let (store, _temp_db) = setup_store();
        store.append_entry("alice", "https://a.example", fixed("alicecode0")).unwrap();
        store.remove_entry("alice", "alicecode0").unwrap();

        assert_eq!(store.increment_visit_count("alicecode0", 0).unwrap(), None);
    }
}
