// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{
	thread,
	time::{Duration, Instant},
};

use rollup_core::EncodedKey;
use rollup_store::{Storage, StoreBackend};
use rollup_transaction::{IdleConfig, StorageConfig, TransactionalStorage};

fn idle_storage() -> TransactionalStorage {
	let idle = IdleConfig::new(Duration::from_millis(20)).with_poll_interval(Duration::from_millis(5));
	TransactionalStorage::new(StorageConfig::memory().with_idle(idle)).unwrap()
}

fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
	let deadline = Instant::now() + Duration::from_secs(5);
	while Instant::now() < deadline {
		if condition() {
			return true;
		}
		thread::sleep(Duration::from_millis(5));
	}
	false
}

#[test]
fn test_idle_compaction_keeps_live_rows() {
	let storage = idle_storage();
	storage
		.batch(|txn| {
			txn.set(&EncodedKey::new(b"a".to_vec()), b"1".to_vec())?;
			txn.set(&EncodedKey::new(b"b".to_vec()), b"2".to_vec())
		})
		.unwrap();
	storage.batch(|txn| txn.remove(&EncodedKey::new(b"a".to_vec()))).unwrap();

	assert!(wait_for(|| storage.idle_compactions() > 0));

	let Storage::Memory(memory) = storage.store() else {
		panic!("expected memory backend");
	};
	assert_eq!(memory.physical_len(), 1);
	assert_eq!(storage.store().len().unwrap(), 1);

	let query = storage.begin_query().unwrap();
	assert_eq!(query.get(&EncodedKey::new(b"b".to_vec())).unwrap(), Some(b"2".to_vec()));
}

#[test]
fn test_idle_compaction_runs_once_per_idle_period() {
	let storage = idle_storage();
	assert!(wait_for(|| storage.idle_compactions() > 0));
	thread::sleep(Duration::from_millis(60));
	assert_eq!(storage.idle_compactions(), 1);

	storage.batch(|txn| txn.set(&EncodedKey::new(b"c".to_vec()), vec![])).unwrap();
	assert!(wait_for(|| storage.idle_compactions() > 1));
}

#[test]
fn test_dispose_stops_worker() {
	let storage = idle_storage();
	storage.dispose();
	assert_eq!(storage.idle_compactions(), 0);
	assert!(storage.is_disposed());
}
