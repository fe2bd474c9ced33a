// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{cell::Cell, collections::BTreeMap, sync::Arc};

use parking_lot::{MutexGuard, RwLockReadGuard};
use rollup_core::{EncodedKey, EncodedKeyRange, Result};
use rollup_store::{StoreBackend, is_empty_range};
use tracing::{debug, instrument, trace};

use crate::{CommitHook, Pending, RangeIter, TransactionId, TransactionMetrics, TransactionalStorage};

/// The single active write transaction of a [`TransactionalStorage`].
///
/// Writes are buffered until commit; reads see them immediately. Dropping the
/// transaction without committing discards everything it buffered.
pub struct CommandTransaction<'a> {
	storage: &'a TransactionalStorage,
	id: TransactionId,
	pending: BTreeMap<EncodedKey, Pending>,
	hooks: Vec<CommitHook>,
	metrics: Cell<TransactionMetrics>,
	_writer: MutexGuard<'a, ()>,
	_lifecycle: RwLockReadGuard<'a, bool>,
}

impl<'a> CommandTransaction<'a> {
	pub(crate) fn new(
		storage: &'a TransactionalStorage,
		lifecycle: RwLockReadGuard<'a, bool>,
		writer: MutexGuard<'a, ()>,
	) -> Self {
		let id = TransactionId::generate();
		trace!(txn = %id, "began write transaction");
		Self {
			storage,
			id,
			pending: BTreeMap::new(),
			hooks: Vec::new(),
			metrics: Cell::new(TransactionMetrics::new()),
			_writer: writer,
			_lifecycle: lifecycle,
		}
	}

	pub fn id(&self) -> TransactionId {
		self.id
	}

	pub fn metrics(&self) -> TransactionMetrics {
		self.metrics.get()
	}

	/// Number of buffered writes and removes.
	pub fn pending_len(&self) -> usize {
		self.pending.len()
	}

	pub(crate) fn belongs_to(&self, storage: &TransactionalStorage) -> bool {
		Arc::ptr_eq(&self.storage.inner, &storage.inner)
	}

	fn record(&self, f: impl FnOnce(&mut TransactionMetrics)) {
		let mut metrics = self.metrics.get();
		f(&mut metrics);
		self.metrics.set(metrics);
	}

	#[instrument(name = "transaction::command::get", level = "trace", skip(self, key), fields(key_len = key.len()))]
	pub fn get(&self, key: &EncodedKey) -> Result<Option<Vec<u8>>> {
		self.record(TransactionMetrics::increment_reads);
		match self.pending.get(key) {
			Some(Pending::Set(value)) => Ok(Some(value.clone())),
			Some(Pending::Remove) => Ok(None),
			None => self.storage.inner.store.get(key.as_slice()),
		}
	}

	pub fn contains(&self, key: &EncodedKey) -> Result<bool> {
		self.record(TransactionMetrics::increment_reads);
		match self.pending.get(key) {
			Some(Pending::Set(_)) => Ok(true),
			Some(Pending::Remove) => Ok(false),
			None => self.storage.inner.store.contains(key.as_slice()),
		}
	}

	/// Set a value, buffering it in pending writes
	pub fn set(&mut self, key: &EncodedKey, value: Vec<u8>) -> Result<()> {
		self.record(TransactionMetrics::increment_writes);
		self.pending.insert(key.clone(), Pending::Set(value));
		Ok(())
	}

	/// Remove a key, buffering the deletion in pending operations
	pub fn remove(&mut self, key: &EncodedKey) -> Result<()> {
		self.record(TransactionMetrics::increment_removes);
		self.pending.insert(key.clone(), Pending::Remove);
		Ok(())
	}

	/// Ordered scan over committed rows overlaid with this transaction's
	/// pending writes.
	pub fn range(&self, range: EncodedKeyRange) -> RangeIter<'_> {
		self.record(TransactionMetrics::increment_range_scans);
		let store = &self.storage.inner.store;
		let (start, end) = range.as_bytes();
		if is_empty_range(start, end) {
			return RangeIter::empty(store);
		}
		let pending = self.pending.range(range.clone());
		RangeIter::new(store, range, Some(pending), self.storage.inner.range_batch_size)
	}

	pub fn prefix(&self, prefix: &EncodedKey) -> RangeIter<'_> {
		self.range(EncodedKeyRange::prefix(prefix.as_slice()))
	}

	/// Registers `hook` to run after a successful commit, outside the writer
	/// lock. Hooks of a rolled back transaction never run.
	pub fn defer_until_commit<F>(&mut self, hook: F)
	where
		F: FnOnce() + Send + 'static,
	{
		self.hooks.push(Box::new(hook));
	}

	#[instrument(name = "transaction::command::commit", level = "debug", skip(self), fields(
		txn = %self.id,
		pending = self.pending.len(),
		hooks = self.hooks.len()
	))]
	pub(crate) fn commit(self) -> Result<Vec<CommitHook>> {
		let metrics = self.metrics.get();
		if !self.pending.is_empty() {
			let deltas = self.pending.into_iter().map(|(key, pending)| pending.into_delta(key.0)).collect();
			self.storage.inner.store.commit(deltas)?;
		}
		debug!(
			reads = metrics.reads,
			writes = metrics.writes,
			removes = metrics.removes,
			range_scans = metrics.range_scans,
			"committed transaction"
		);
		Ok(self.hooks)
	}

	pub(crate) fn rollback(self) {
		debug!(txn = %self.id, discarded = self.pending.len(), "rolled back transaction");
	}
}

#[cfg(test)]
mod tests {
	use rollup_core::Error;

	use super::*;

	fn key(s: &str) -> EncodedKey {
		EncodedKey::new(s.as_bytes().to_vec())
	}

	fn collect(iter: RangeIter<'_>) -> Vec<(String, String)> {
		iter.map(|entry| {
			let (k, v) = entry.unwrap();
			(String::from_utf8(k.0).unwrap(), String::from_utf8(v).unwrap())
		})
		.collect()
	}

	fn seeded() -> TransactionalStorage {
		let storage = TransactionalStorage::memory().unwrap();
		storage
			.batch(|txn| {
				for (k, v) in [("a", "1"), ("c", "3"), ("e", "5"), ("g", "7")] {
					txn.set(&key(k), v.as_bytes().to_vec())?;
				}
				Ok(())
			})
			.unwrap();
		storage
	}

	#[test]
	fn test_reads_see_own_writes() {
		let storage = seeded();
		storage
			.batch(|txn| {
				assert_eq!(txn.get(&key("a"))?, Some(b"1".to_vec()));
				txn.set(&key("a"), b"10".to_vec())?;
				assert_eq!(txn.get(&key("a"))?, Some(b"10".to_vec()));

				txn.remove(&key("c"))?;
				assert_eq!(txn.get(&key("c"))?, None);
				assert!(!txn.contains(&key("c"))?);
				assert!(txn.contains(&key("e"))?);
				Ok(())
			})
			.unwrap();
	}

	#[test]
	fn test_range_merges_pending_over_committed() {
		let storage = seeded();
		storage
			.batch(|txn| {
				txn.set(&key("b"), b"2".to_vec())?;
				txn.set(&key("e"), b"50".to_vec())?;
				txn.remove(&key("c"))?;
				txn.set(&key("h"), b"8".to_vec())?;

				let entries = collect(txn.range(EncodedKeyRange::all()));
				assert_eq!(
					entries,
					vec![
						("a".to_string(), "1".to_string()),
						("b".to_string(), "2".to_string()),
						("e".to_string(), "50".to_string()),
						("g".to_string(), "7".to_string()),
						("h".to_string(), "8".to_string()),
					]
				);
				Ok(())
			})
			.unwrap();
	}

	#[test]
	fn test_range_spans_backend_batches() {
		let storage = TransactionalStorage::new(crate::StorageConfig::memory().with_range_batch_size(2)).unwrap();
		storage
			.batch(|txn| {
				for i in 0u8..9 {
					txn.set(&EncodedKey::new(vec![i]), vec![i])?;
				}
				Ok(())
			})
			.unwrap();

		storage
			.batch(|txn| {
				txn.remove(&EncodedKey::new(vec![4]))?;
				txn.set(&EncodedKey::new(vec![5]), vec![50])?;
				let values: Vec<u8> = txn.range(EncodedKeyRange::all()).map(|e| e.unwrap().1[0]).collect();
				assert_eq!(values, vec![0, 1, 2, 3, 50, 6, 7, 8]);
				Ok(())
			})
			.unwrap();
	}

	#[test]
	fn test_prefix_scan() {
		let storage = TransactionalStorage::memory().unwrap();
		storage
			.batch(|txn| {
				txn.set(&key("ab1"), b"x".to_vec())?;
				txn.set(&key("ab2"), b"y".to_vec())?;
				txn.set(&key("ac"), b"z".to_vec())?;
				Ok(())
			})
			.unwrap();

		storage
			.batch(|txn| {
				txn.set(&key("ab3"), b"w".to_vec())?;
				let keys: Vec<String> = collect(txn.prefix(&key("ab"))).into_iter().map(|(k, _)| k).collect();
				assert_eq!(keys, vec!["ab1", "ab2", "ab3"]);
				Ok(())
			})
			.unwrap();
	}

	#[test]
	fn test_empty_range_yields_nothing() {
		let storage = seeded();
		storage
			.batch(|txn| {
				txn.set(&key("b"), b"2".to_vec())?;
				let range = EncodedKeyRange::start_end(Some(key("e")), Some(key("c")));
				assert_eq!(txn.range(range).count(), 0);
				Ok(())
			})
			.unwrap();
	}

	#[test]
	fn test_metrics_track_operations() {
		let storage = seeded();
		let metrics = storage
			.batch(|txn| {
				txn.get(&key("a"))?;
				txn.contains(&key("b"))?;
				txn.set(&key("x"), vec![])?;
				txn.remove(&key("a"))?;
				let _ = txn.range(EncodedKeyRange::all()).count();
				Ok(txn.metrics())
			})
			.unwrap();
		assert_eq!(metrics.reads, 2);
		assert_eq!(metrics.writes, 1);
		assert_eq!(metrics.removes, 1);
		assert_eq!(metrics.range_scans, 1);
	}

	#[test]
	fn test_dropped_transaction_discards_writes() {
		let storage = TransactionalStorage::memory().unwrap();
		{
			let mut txn = storage.begin_command().unwrap();
			txn.set(&key("a"), b"1".to_vec()).unwrap();
			assert_eq!(txn.pending_len(), 1);
		}
		let query = storage.begin_query().unwrap();
		assert_eq!(query.get(&key("a")).unwrap(), None);
	}

	#[test]
	fn test_failed_batch_leaves_committed_rows() {
		let storage = seeded();
		let result: Result<()> = storage.batch(|txn| {
			txn.remove(&key("a"))?;
			Err(Error::storage("boom"))
		});
		assert!(result.is_err());
		let query = storage.begin_query().unwrap();
		assert_eq!(query.get(&key("a")).unwrap(), Some(b"1".to_vec()));
	}
}
