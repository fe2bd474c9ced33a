// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::sync::Arc;

use rollup_core::{CodecChain, EncodedKey, EncodedKeyRange, Result, SequenceCategory, SequenceGenerator, SequenceId};
use rollup_transaction::{CommandTransaction, TransactionalStorage};
use tracing::instrument;

use crate::{BucketAssignment, EngineBuilder, EngineConfig, row::Row};

pub(crate) struct EngineShared {
	pub(crate) codecs: CodecChain,
	pub(crate) sequences: SequenceGenerator,
	pub(crate) buckets: BucketAssignment,
	pub(crate) single_step_limit: usize,
}

/// Owns the storage and everything the map-reduce operations share: codecs,
/// the sequence generator and bucket assignment.
///
/// All reads and writes go through [`Self::batch`], which hands out a
/// [`MapReduceActions`] bound to one write transaction.
#[derive(Clone)]
pub struct MapReduceEngine {
	storage: TransactionalStorage,
	shared: Arc<EngineShared>,
}

impl MapReduceEngine {
	pub fn new(config: EngineConfig) -> Result<Self> {
		EngineBuilder::new(config).build()
	}

	pub fn memory() -> Result<Self> {
		Self::new(EngineConfig::memory())
	}

	pub fn builder(config: EngineConfig) -> EngineBuilder {
		EngineBuilder::new(config)
	}

	pub(crate) fn from_parts(storage: TransactionalStorage, shared: EngineShared) -> Self {
		Self {
			storage,
			shared: Arc::new(shared),
		}
	}

	pub fn storage(&self) -> &TransactionalStorage {
		&self.storage
	}

	pub fn buckets(&self) -> BucketAssignment {
		self.shared.buckets
	}

	pub fn bucket_of(&self, document_id: &str) -> i32 {
		self.shared.buckets.bucket_of(document_id)
	}

	pub fn parent_bucket(&self, bucket: i32) -> i32 {
		self.shared.buckets.parent_bucket(bucket)
	}

	pub fn single_step_limit(&self) -> usize {
		self.shared.single_step_limit
	}

	/// Runs `f` in one write transaction. Any `Err` discards every change the
	/// closure made.
	pub fn batch<T, F>(&self, f: F) -> Result<T>
	where
		F: FnOnce(&mut MapReduceActions<'_, '_>) -> Result<T>,
	{
		self.storage.batch(|txn| f(&mut MapReduceActions::new(txn, &self.shared)))
	}

	/// Reuses the transaction of `outer` when given, otherwise starts a batch.
	pub fn batch_within<T, F>(&self, outer: Option<&mut MapReduceActions<'_, '_>>, f: F) -> Result<T>
	where
		F: FnOnce(&mut MapReduceActions<'_, '_>) -> Result<T>,
	{
		let outer = outer.map(|actions| &mut *actions.txn);
		self.storage.batch_within(outer, |txn| f(&mut MapReduceActions::new(txn, &self.shared)))
	}

	pub fn dispose(&self) {
		self.storage.dispose();
	}

	pub fn is_disposed(&self) -> bool {
		self.storage.is_disposed()
	}
}

/// Map-reduce operations scoped to one write transaction.
///
/// Every mutation lands in the same transaction, so result rows, auxiliary
/// index entries, schedules and statistics commit or roll back together.
pub struct MapReduceActions<'t, 'a> {
	pub(crate) txn: &'t mut CommandTransaction<'a>,
	pub(crate) shared: &'t EngineShared,
}

impl<'t, 'a> MapReduceActions<'t, 'a> {
	pub(crate) fn new(txn: &'t mut CommandTransaction<'a>, shared: &'t EngineShared) -> Self {
		Self {
			txn,
			shared,
		}
	}

	pub fn transaction(&mut self) -> &mut CommandTransaction<'a> {
		self.txn
	}

	pub fn bucket_of(&self, document_id: &str) -> i32 {
		self.shared.buckets.bucket_of(document_id)
	}

	pub fn parent_bucket(&self, bucket: i32) -> i32 {
		self.shared.buckets.parent_bucket(bucket)
	}

	pub(crate) fn next_sequence(&self, category: SequenceCategory) -> SequenceId {
		self.shared.sequences.next(category)
	}

	pub(crate) fn read_row<R: Row>(&self, key: &EncodedKey) -> Result<Option<R>> {
		match self.txn.get(key)? {
			Some(bytes) => Ok(Some(R::from_bytes(&bytes)?)),
			None => Ok(None),
		}
	}

	pub(crate) fn write_row<R: Row>(&mut self, key: &EncodedKey, row: &R) -> Result<()> {
		let bytes = row.to_bytes()?;
		self.txn.set(key, bytes)
	}

	/// Collects the keys of a range so the caller can mutate afterwards.
	#[instrument(name = "engine::scan_keys", level = "trace", skip(self, range))]
	pub(crate) fn scan_keys(&self, range: EncodedKeyRange) -> Result<Vec<EncodedKey>> {
		self.txn.range(range).map(|entry| entry.map(|(key, _)| key)).collect()
	}
}
