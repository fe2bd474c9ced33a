// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Ordered key-value storage backing the map-reduce tables.
//!
//! Backends only see encoded keys and opaque values. Table layout, auxiliary
//! orderings and transactions live in the layers above.

use std::ops::Bound;

use rollup_core::Result;

pub mod memory;
pub mod sqlite;
mod storage;

pub use memory::MemoryStore;
pub use sqlite::{DbPath, JournalMode, SqliteConfig, SqliteStore, SynchronousMode};
pub use storage::{BackendConfig, Storage};

/// A single mutation applied atomically with the rest of its commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delta {
	Set {
		key: Vec<u8>,
		value: Vec<u8>,
	},
	Remove {
		key: Vec<u8>,
	},
}

/// A live entry returned by a range fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
	pub key: Vec<u8>,
	pub value: Vec<u8>,
}

/// Resume position of a batched range scan.
#[derive(Debug, Clone, Default)]
pub struct RangeCursor {
	pub last_key: Option<Vec<u8>>,
	pub exhausted: bool,
}

impl RangeCursor {
	pub fn new() -> Self {
		Self::default()
	}
}

#[derive(Debug, Clone, Default)]
pub struct RangeBatch {
	pub entries: Vec<RawEntry>,
	pub has_more: bool,
}

impl RangeBatch {
	pub fn empty() -> Self {
		Self::default()
	}
}

pub trait StoreBackend: Send + Sync + Clone + 'static {
	fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

	fn contains(&self, key: &[u8]) -> Result<bool>;

	/// Applies all deltas or none of them.
	fn commit(&self, deltas: Vec<Delta>) -> Result<()>;

	/// Fetches the next batch of live entries in ascending key order,
	/// resuming after `cursor.last_key`.
	fn range_next(
		&self,
		cursor: &mut RangeCursor,
		start: Bound<&[u8]>,
		end: Bound<&[u8]>,
		batch_size: usize,
	) -> Result<RangeBatch>;

	/// Physical cleanup only. Never changes what reads observe.
	fn compact(&self) -> Result<()>;

	/// Number of live entries.
	fn len(&self) -> Result<usize>;

	fn is_empty(&self) -> Result<bool> {
		Ok(self.len()? == 0)
	}
}

/// The effective lower bound for the next batch of a cursor.
pub(crate) fn resume_from<'a>(cursor: &'a RangeCursor, start: Bound<&'a [u8]>) -> Bound<&'a [u8]> {
	match &cursor.last_key {
		Some(last) => Bound::Excluded(last.as_slice()),
		None => start,
	}
}

/// True when no key can satisfy both bounds.
pub fn is_empty_range(start: Bound<&[u8]>, end: Bound<&[u8]>) -> bool {
	match (start, end) {
		(Bound::Included(s), Bound::Included(e)) => s > e,
		(Bound::Included(s), Bound::Excluded(e))
		| (Bound::Excluded(s), Bound::Included(e))
		| (Bound::Excluded(s), Bound::Excluded(e)) => s >= e,
		_ => false,
	}
}
