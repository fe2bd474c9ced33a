// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::ops::Bound;

use rollup_core::Result;

use crate::{Delta, MemoryStore, RangeBatch, RangeCursor, SqliteConfig, SqliteStore, StoreBackend};

/// Which backend to open.
#[derive(Debug, Clone, Default)]
pub enum BackendConfig {
	#[default]
	Memory,
	Sqlite(SqliteConfig),
}

/// Dispatches to either the memory or the SQLite backend.
#[derive(Clone)]
#[repr(u8)]
pub enum Storage {
	/// In-memory storage (non-persistent)
	Memory(MemoryStore) = 0,
	/// SQLite-based persistent storage
	Sqlite(SqliteStore) = 1,
}

impl Storage {
	pub fn open(config: &BackendConfig) -> Result<Self> {
		match config {
			BackendConfig::Memory => Ok(Self::memory()),
			BackendConfig::Sqlite(config) => Ok(Self::Sqlite(SqliteStore::new(config.clone())?)),
		}
	}

	pub fn memory() -> Self {
		Self::Memory(MemoryStore::new())
	}

	pub fn sqlite_in_memory() -> Result<Self> {
		Ok(Self::Sqlite(SqliteStore::in_memory()?))
	}

	pub fn kind(&self) -> &'static str {
		match self {
			Self::Memory(_) => "memory",
			Self::Sqlite(_) => "sqlite",
		}
	}
}

impl StoreBackend for Storage {
	#[inline]
	fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
		match self {
			Self::Memory(s) => s.get(key),
			Self::Sqlite(s) => s.get(key),
		}
	}

	#[inline]
	fn contains(&self, key: &[u8]) -> Result<bool> {
		match self {
			Self::Memory(s) => s.contains(key),
			Self::Sqlite(s) => s.contains(key),
		}
	}

	#[inline]
	fn commit(&self, deltas: Vec<Delta>) -> Result<()> {
		match self {
			Self::Memory(s) => s.commit(deltas),
			Self::Sqlite(s) => s.commit(deltas),
		}
	}

	#[inline]
	fn range_next(
		&self,
		cursor: &mut RangeCursor,
		start: Bound<&[u8]>,
		end: Bound<&[u8]>,
		batch_size: usize,
	) -> Result<RangeBatch> {
		match self {
			Self::Memory(s) => s.range_next(cursor, start, end, batch_size),
			Self::Sqlite(s) => s.range_next(cursor, start, end, batch_size),
		}
	}

	#[inline]
	fn compact(&self) -> Result<()> {
		match self {
			Self::Memory(s) => s.compact(),
			Self::Sqlite(s) => s.compact(),
		}
	}

	#[inline]
	fn len(&self) -> Result<usize> {
		match self {
			Self::Memory(s) => s.len(),
			Self::Sqlite(s) => s.len(),
		}
	}
}
