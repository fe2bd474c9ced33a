// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! SQLite backend: one `entries(key BLOB PRIMARY KEY, value BLOB)` table.

use std::{ops::Bound, sync::Arc};

use parking_lot::Mutex;
use rollup_core::{Error, Result};
use rusqlite::{Connection, params, params_from_iter, types::Value};
use tracing::{debug, instrument};

use crate::{Delta, RangeBatch, RangeCursor, RawEntry, StoreBackend, is_empty_range, resume_from};

mod config;

pub use config::{DbPath, JournalMode, SqliteConfig, SynchronousMode};

fn sqlite_error(err: rusqlite::Error) -> Error {
	Error::storage(format!("sqlite: {err}"))
}

#[derive(Clone)]
pub struct SqliteStore {
	inner: Arc<SqliteStoreInner>,
}

struct SqliteStoreInner {
	conn: Mutex<Connection>,
}

impl SqliteStore {
	#[instrument(name = "store::sqlite::new", level = "info", skip(config), fields(
		db_path = ?config.path,
		journal_mode = %config.journal_mode.as_str(),
		synchronous = %config.synchronous_mode.as_str()
	))]
	pub fn new(config: SqliteConfig) -> Result<Self> {
		let conn = match &config.path {
			DbPath::File(path) => {
				if let Some(parent) = path.parent() {
					std::fs::create_dir_all(parent).map_err(Error::storage)?;
				}
				Connection::open(path)
			}
			DbPath::Memory => Connection::open_in_memory(),
		}
		.map_err(sqlite_error)?;

		// auto_vacuum only takes effect when set before the first table exists
		conn.pragma_update(None, "auto_vacuum", "INCREMENTAL").map_err(sqlite_error)?;
		conn.pragma_update(None, "journal_mode", config.journal_mode.as_str()).map_err(sqlite_error)?;
		conn.pragma_update(None, "synchronous", config.synchronous_mode.as_str()).map_err(sqlite_error)?;
		conn.execute_batch("CREATE TABLE IF NOT EXISTS entries (key BLOB PRIMARY KEY, value BLOB NOT NULL) WITHOUT ROWID;")
			.map_err(sqlite_error)?;

		Ok(Self {
			inner: Arc::new(SqliteStoreInner {
				conn: Mutex::new(conn),
			}),
		})
	}

	pub fn in_memory() -> Result<Self> {
		Self::new(SqliteConfig::in_memory())
	}
}

impl StoreBackend for SqliteStore {
	#[instrument(name = "store::sqlite::get", level = "trace", skip(self, key), fields(key_len = key.len()))]
	fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
		let conn = self.inner.conn.lock();
		let result = conn.query_row("SELECT value FROM entries WHERE key = ?1", params![key], |row| {
			row.get::<_, Vec<u8>>(0)
		});
		match result {
			Ok(value) => Ok(Some(value)),
			Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
			Err(e) => Err(sqlite_error(e)),
		}
	}

	#[instrument(name = "store::sqlite::contains", level = "trace", skip(self, key), fields(key_len = key.len()), ret)]
	fn contains(&self, key: &[u8]) -> Result<bool> {
		let conn = self.inner.conn.lock();
		conn.query_row("SELECT EXISTS(SELECT 1 FROM entries WHERE key = ?1)", params![key], |row| row.get(0))
			.map_err(sqlite_error)
	}

	#[instrument(name = "store::sqlite::commit", level = "debug", skip(self, deltas), fields(deltas = deltas.len()))]
	fn commit(&self, deltas: Vec<Delta>) -> Result<()> {
		let mut conn = self.inner.conn.lock();
		let tx = conn.transaction().map_err(sqlite_error)?;
		{
			let mut upsert = tx
				.prepare_cached("INSERT OR REPLACE INTO entries (key, value) VALUES (?1, ?2)")
				.map_err(sqlite_error)?;
			let mut delete = tx.prepare_cached("DELETE FROM entries WHERE key = ?1").map_err(sqlite_error)?;
			for delta in &deltas {
				match delta {
					Delta::Set {
						key,
						value,
					} => {
						upsert.execute(params![key, value]).map_err(sqlite_error)?;
					}
					Delta::Remove {
						key,
					} => {
						delete.execute(params![key]).map_err(sqlite_error)?;
					}
				}
			}
		}
		tx.commit().map_err(sqlite_error)
	}

	#[instrument(name = "store::sqlite::range_next", level = "trace", skip(self, cursor, start, end), fields(batch_size = batch_size))]
	fn range_next(
		&self,
		cursor: &mut RangeCursor,
		start: Bound<&[u8]>,
		end: Bound<&[u8]>,
		batch_size: usize,
	) -> Result<RangeBatch> {
		if cursor.exhausted {
			return Ok(RangeBatch::empty());
		}

		let effective_start = resume_from(cursor, start);
		if is_empty_range(effective_start, end) {
			cursor.exhausted = true;
			return Ok(RangeBatch::empty());
		}

		let mut conditions = Vec::with_capacity(2);
		let mut values: Vec<Value> = Vec::with_capacity(3);
		match effective_start {
			Bound::Included(k) => {
				values.push(Value::Blob(k.to_vec()));
				conditions.push(format!("key >= ?{}", values.len()));
			}
			Bound::Excluded(k) => {
				values.push(Value::Blob(k.to_vec()));
				conditions.push(format!("key > ?{}", values.len()));
			}
			Bound::Unbounded => {}
		}
		match end {
			Bound::Included(k) => {
				values.push(Value::Blob(k.to_vec()));
				conditions.push(format!("key <= ?{}", values.len()));
			}
			Bound::Excluded(k) => {
				values.push(Value::Blob(k.to_vec()));
				conditions.push(format!("key < ?{}", values.len()));
			}
			Bound::Unbounded => {}
		}
		values.push(Value::Integer(batch_size as i64 + 1));
		let limit = values.len();

		let filter = if conditions.is_empty() {
			String::new()
		} else {
			format!("WHERE {}", conditions.join(" AND "))
		};
		let query = format!("SELECT key, value FROM entries {filter} ORDER BY key ASC LIMIT ?{limit}");

		let mut entries = {
			let conn = self.inner.conn.lock();
			let mut stmt = conn.prepare_cached(&query).map_err(sqlite_error)?;
			let rows = stmt
				.query_map(params_from_iter(values.iter()), |row| {
					Ok(RawEntry {
						key: row.get(0)?,
						value: row.get(1)?,
					})
				})
				.map_err(sqlite_error)?;
			rows.collect::<std::result::Result<Vec<_>, _>>().map_err(sqlite_error)?
		};

		let has_more = entries.len() > batch_size;
		entries.truncate(batch_size);

		if let Some(last) = entries.last() {
			cursor.last_key = Some(last.key.clone());
		}
		if !has_more {
			cursor.exhausted = true;
		}

		Ok(RangeBatch {
			entries,
			has_more,
		})
	}

	#[instrument(name = "store::sqlite::compact", level = "debug", skip(self))]
	fn compact(&self) -> Result<()> {
		let conn = self.inner.conn.lock();
		conn.execute_batch("PRAGMA incremental_vacuum; PRAGMA optimize;").map_err(sqlite_error)?;
		debug!("compacted sqlite store");
		Ok(())
	}

	fn len(&self) -> Result<usize> {
		let conn = self.inner.conn.lock();
		let count: i64 = conn.query_row("SELECT COUNT(*) FROM entries", [], |row| row.get(0)).map_err(sqlite_error)?;
		Ok(count as usize)
	}
}
