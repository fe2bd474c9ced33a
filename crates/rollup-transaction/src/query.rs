// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use parking_lot::RwLockReadGuard;
use rollup_core::{EncodedKey, EncodedKeyRange, Result};
use rollup_store::{StoreBackend, is_empty_range};

use crate::{RangeIter, TransactionalStorage};

/// Read-only view of committed state. Does not take the writer lock.
pub struct QueryTransaction<'a> {
	storage: &'a TransactionalStorage,
	_lifecycle: RwLockReadGuard<'a, bool>,
}

impl<'a> QueryTransaction<'a> {
	pub(crate) fn new(storage: &'a TransactionalStorage, lifecycle: RwLockReadGuard<'a, bool>) -> Self {
		Self {
			storage,
			_lifecycle: lifecycle,
		}
	}

	pub fn get(&self, key: &EncodedKey) -> Result<Option<Vec<u8>>> {
		self.storage.inner.store.get(key.as_slice())
	}

	pub fn contains(&self, key: &EncodedKey) -> Result<bool> {
		self.storage.inner.store.contains(key.as_slice())
	}

	pub fn range(&self, range: EncodedKeyRange) -> RangeIter<'_> {
		let store = &self.storage.inner.store;
		let (start, end) = range.as_bytes();
		if is_empty_range(start, end) {
			return RangeIter::empty(store);
		}
		RangeIter::new(store, range, None, self.storage.inner.range_batch_size)
	}

	pub fn prefix(&self, prefix: &EncodedKey) -> RangeIter<'_> {
		self.range(EncodedKeyRange::prefix(prefix.as_slice()))
	}
}
