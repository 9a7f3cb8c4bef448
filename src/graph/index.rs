//! Secondary indexes over node attributes.
//!
//! Each key gets its own table, `index_<key>`, created the first time a value
//! is indexed under it. Existing tables are the authoritative list of keys;
//! the manager only caches what it has already confirmed.
//!
//! Keys are case-insensitive, like the table names they become: `Type` and
//! `type` name the same index and are reported in lowercase.
//!
//! # Lookups
//!
//! | Method | Returns |
//! |--------|---------|
//! | [`IndexManager::find`] | Nodes matching every `key = value` pair |
//! | [`IndexManager::find_by`] | Nodes matching one pair |
//! | [`IndexManager::find_one`] | Exactly one node, or [`Error::AmbiguousResult`] |

use super::Shared;
use super::node::Node;
use crate::models::NodeId;
use crate::storage::schema::{INDEX_TABLE_PREFIX, index_table_ddl, index_table_name};
use crate::storage::{SelectBuilder, SqlValue, Statement};
use crate::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::instrument;

/// Index keys become part of a table name, so only ASCII letters and digits
/// are allowed.
static KEY_PATTERN: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9]+$").ok());

/// Returns `true` if `key` can name an index.
#[must_use]
pub fn is_valid_key(key: &str) -> bool {
    KEY_PATTERN.as_ref().is_some_and(|re| re.is_match(key))
}

/// Validates `key` and returns its canonical lowercase form.
fn normalize_key(key: &str) -> Result<String> {
    if is_valid_key(key) {
        Ok(key.to_ascii_lowercase())
    } else {
        Err(Error::InvalidKey {
            key: key.to_string(),
        })
    }
}

#[derive(Debug, Default)]
struct KeyCache {
    keys: BTreeSet<String>,
    /// Set once `keys` holds a full catalog scan.
    complete: bool,
}

/// Creates, fills and queries index tables.
///
/// Obtained from [`Graph::index`](crate::graph::Graph::index). The key cache
/// lives as long as the manager.
pub struct IndexManager {
    shared: Arc<Shared>,
    cache: Mutex<KeyCache>,
}

impl IndexManager {
    pub(crate) fn new(shared: Arc<Shared>) -> Self {
        Self {
            shared,
            cache: Mutex::new(KeyCache::default()),
        }
    }

    fn cache(&self) -> MutexGuard<'_, KeyCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns `true` if an index table exists for `key`.
    ///
    /// Invalid keys never have a table and return `false`.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be read.
    pub fn exists(&self, key: &str) -> Result<bool> {
        let Ok(key) = normalize_key(key) else {
            return Ok(false);
        };
        if self.cache().keys.contains(&key) {
            return Ok(true);
        }

        let found = self.shared.store.table_exists(&index_table_name(&key))?;
        if found {
            self.cache().keys.insert(key);
        }
        Ok(found)
    }

    /// Creates the index table for `key` if it is missing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidKey`] for keys outside `[A-Za-z0-9]+`, or a
    /// storage error if the DDL fails.
    #[instrument(skip(self))]
    pub fn create(&self, key: &str) -> Result<()> {
        let key = normalize_key(key)?;
        if self.exists(&key)? {
            return Ok(());
        }

        self.shared.store.exec_batch(&index_table_ddl(&key))?;
        self.cache().keys.insert(key.clone());

        metrics::counter!("graph_index_tables_created_total").increment(1);
        tracing::info!(key = %key, "created index table");
        Ok(())
    }

    /// Records `node` under `key = value`, creating the table if needed.
    ///
    /// Duplicate entries are kept.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidKey`] for a bad key, [`Error::InvalidInput`] if
    /// `value` is longer than the configured maximum, or a storage error.
    #[instrument(skip(self, value), fields(node_id = %node))]
    pub fn add_entry(&self, node: NodeId, key: &str, value: &str) -> Result<()> {
        let limit = self.shared.config.max_index_value_len;
        let len = value.chars().count();
        if len > limit {
            return Err(Error::InvalidInput(format!(
                "index value for {key:?} is {len} characters, maximum is {limit}"
            )));
        }

        let key = normalize_key(key)?;
        self.create(&key)?;
        self.shared.store.execute(
            &format!("INSERT INTO {} (node_id, value) VALUES (?, ?)", index_table_name(&key)),
            &[SqlValue::from(node.get()), SqlValue::from(value)],
        )?;
        Ok(())
    }

    /// Nodes indexed under every `key = value` pair in `criteria`.
    ///
    /// Each node appears once, ordered by its first matching entry under the
    /// first key. If a key is repeated the last value wins. A key with no
    /// index table matches nothing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for empty criteria, [`Error::InvalidKey`]
    /// for a bad key, or a storage error.
    #[instrument(skip(self, criteria))]
    pub fn find<K, V>(&self, criteria: impl IntoIterator<Item = (K, V)>) -> Result<Vec<Node>>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        // Keep first-seen key order so the first key drives result order.
        let mut order = Vec::new();
        let mut values = BTreeMap::new();
        for (key, value) in criteria {
            let key = normalize_key(key.as_ref())?;
            if !values.contains_key(&key) {
                order.push(key.clone());
            }
            values.insert(key, value.as_ref().to_string());
        }

        if order.is_empty() {
            return Err(Error::InvalidInput(
                "index lookup needs at least one criterion".to_string(),
            ));
        }

        for key in &order {
            if !self.exists(key)? {
                tracing::debug!(key = %key, "no index table, lookup is empty");
                return Ok(Vec::new());
            }
        }

        let pairs: Vec<(&str, &str)> = order
            .iter()
            .filter_map(|k| values.get(k).map(|v| (k.as_str(), v.as_str())))
            .collect();
        let stmt = conjunctive_lookup(&pairs);
        tracing::debug!(sql = %stmt.sql, "index lookup");

        self.shared
            .store
            .query(&stmt.sql, &stmt.params)?
            .iter()
            .map(|row| Ok(Node::attach(&self.shared, NodeId::new(row.i64(0)?))))
            .collect()
    }

    /// Nodes indexed under `key = value`.
    ///
    /// # Errors
    ///
    /// See [`find`](Self::find).
    pub fn find_by(&self, key: &str, value: &str) -> Result<Vec<Node>> {
        self.find([(key, value)])
    }

    /// The single node matching `criteria`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AmbiguousResult`] unless exactly one node matches,
    /// plus any error from [`find`](Self::find).
    pub fn find_one<K, V>(&self, criteria: impl IntoIterator<Item = (K, V)>) -> Result<Node>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut nodes = self.find(criteria)?;
        match nodes.len() {
            1 => Ok(nodes.remove(0)),
            count => Err(Error::AmbiguousResult { count }),
        }
    }

    /// Every index key, sorted.
    ///
    /// The first call scans the store's catalog; later calls on the same
    /// manager answer from the cache.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be read.
    pub fn all_indexes(&self) -> Result<Vec<String>> {
        {
            let cache = self.cache();
            if cache.complete {
                return Ok(cache.keys.iter().cloned().collect());
            }
        }

        let tables = self.shared.store.list_tables(INDEX_TABLE_PREFIX)?;
        let mut cache = self.cache();
        cache.keys.extend(
            tables
                .iter()
                .filter_map(|t| t.strip_prefix(INDEX_TABLE_PREFIX))
                .filter_map(|k| normalize_key(k).ok()),
        );
        cache.complete = true;
        Ok(cache.keys.iter().cloned().collect())
    }

    /// Deletes every entry from every index table. Tables are kept.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog scan or a delete fails.
    #[instrument(skip(self))]
    pub fn truncate_all(&self) -> Result<()> {
        for key in self.all_indexes()? {
            self.shared
                .store
                .execute(&format!("DELETE FROM {}", index_table_name(&key)), &[])?;
        }
        Ok(())
    }
}

/// Renders one join per key on `node_id`, one equality predicate per key,
/// grouped to distinct nodes in first-entry order.
fn conjunctive_lookup(pairs: &[(&str, &str)]) -> Statement {
    let mut builder = SelectBuilder::new().select("t0.node_id");

    for (idx, (key, value)) in pairs.iter().enumerate() {
        let table = index_table_name(key);
        builder = if idx == 0 {
            builder.from(format!("{table} t0"))
        } else {
            builder.inner_join(format!("{table} t{idx} ON t{idx}.node_id = t0.node_id"), [])
        };
        builder = builder.and_where(format!("t{idx}.value = ?"), [SqlValue::from(*value)]);
    }

    builder.group_by("t0.node_id").order_by("MIN(t0.id)").build()
}
