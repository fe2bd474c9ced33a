// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! In-memory backend. Removals drop the entry under the same write lock
//! that applies the rest of the commit.

use std::{collections::BTreeMap, ops::Bound, sync::Arc};

use parking_lot::RwLock;
use rollup_core::Result;
use tracing::{debug, instrument};

use crate::{Delta, RangeBatch, RangeCursor, RawEntry, StoreBackend, is_empty_range, resume_from};

#[derive(Clone, Default)]
pub struct MemoryStore {
	inner: Arc<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
	entries: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl MemoryStore {
	#[instrument(name = "store::memory::new", level = "debug")]
	pub fn new() -> Self {
		Self::default()
	}

	/// Entries held in memory.
	pub fn physical_len(&self) -> usize {
		self.inner.entries.read().len()
	}
}

impl StoreBackend for MemoryStore {
	#[instrument(name = "store::memory::get", level = "trace", skip(self, key), fields(key_len = key.len()))]
	fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
		Ok(self.inner.entries.read().get(key).cloned())
	}

	#[instrument(name = "store::memory::contains", level = "trace", skip(self, key), fields(key_len = key.len()), ret)]
	fn contains(&self, key: &[u8]) -> Result<bool> {
		Ok(self.inner.entries.read().contains_key(key))
	}

	#[instrument(name = "store::memory::commit", level = "debug", skip(self, deltas), fields(deltas = deltas.len()))]
	fn commit(&self, deltas: Vec<Delta>) -> Result<()> {
		let mut entries = self.inner.entries.write();
		for delta in deltas {
			match delta {
				Delta::Set {
					key,
					value,
				} => {
					entries.insert(key, value);
				}
				Delta::Remove {
					key,
				} => {
					entries.remove(&key);
				}
			}
		}
		Ok(())
	}

	#[instrument(name = "store::memory::range_next", level = "trace", skip(self, cursor, start, end), fields(batch_size = batch_size))]
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

		let entries = self.inner.entries.read();

		// Fetch one extra entry to learn whether more remain
		let mut batch: Vec<RawEntry> = entries
			.range::<[u8], _>((effective_start, end))
			.map(|(k, v)| RawEntry {
				key: k.clone(),
				value: v.clone(),
			})
			.take(batch_size + 1)
			.collect();

		let has_more = batch.len() > batch_size;
		batch.truncate(batch_size);

		if let Some(last) = batch.last() {
			cursor.last_key = Some(last.key.clone());
		}
		if !has_more {
			cursor.exhausted = true;
		}

		Ok(RangeBatch {
			entries: batch,
			has_more,
		})
	}

	#[instrument(name = "store::memory::compact", level = "debug", skip(self))]
	fn compact(&self) -> Result<()> {
		let entries = self.inner.entries.read();
		debug!(entries = entries.len(), "memory store holds no dead entries");
		Ok(())
	}

	fn len(&self) -> Result<usize> {
		Ok(self.inner.entries.read().len())
	}
}
