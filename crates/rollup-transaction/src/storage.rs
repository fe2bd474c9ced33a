// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::sync::{
	Arc,
	atomic::{AtomicU64, Ordering},
};

use parking_lot::{Mutex, RwLock};
use rollup_core::{Error, Result, Timestamp};
use rollup_store::Storage;
use tracing::{debug, instrument, warn};

use crate::{CommandTransaction, QueryTransaction, StorageConfig, idle::IdleWorker};

/// Work registered to run once the owning transaction has committed.
pub type CommitHook = Box<dyn FnOnce() + Send + 'static>;

type OnCommit = Arc<dyn Fn() + Send + Sync + 'static>;

/// Shared handle to a transactional store. Cloning is cheap and every clone
/// talks to the same backend.
///
/// At most one [`CommandTransaction`] is alive at a time. Every batch and
/// query holds the teardown lock shared; [`Self::dispose`] takes it
/// exclusively, so it waits for in-flight work and rejects everything after.
#[derive(Clone)]
pub struct TransactionalStorage {
	pub(crate) inner: Arc<TransactionalStorageInner>,
}

pub(crate) struct TransactionalStorageInner {
	pub(crate) store: Storage,
	pub(crate) writer: Mutex<()>,
	pub(crate) lifecycle: RwLock<bool>,
	pub(crate) range_batch_size: usize,
	last_usage: Arc<AtomicU64>,
	idle: Mutex<Option<IdleWorker>>,
	on_commit: RwLock<Option<OnCommit>>,
}

impl TransactionalStorage {
	#[instrument(name = "transaction::storage::new", level = "debug", skip(config), fields(
		backend = ?config.backend,
		idle = config.idle.is_some()
	))]
	pub fn new(config: StorageConfig) -> Result<Self> {
		let store = Storage::open(&config.backend)?;
		let last_usage = Arc::new(AtomicU64::new(Timestamp::now().as_millis()));

		let idle = match config.idle {
			Some(idle) => Some(IdleWorker::new(idle, store.clone(), Arc::clone(&last_usage))?),
			None => None,
		};

		debug!(kind = store.kind(), "opened transactional storage");

		Ok(Self {
			inner: Arc::new(TransactionalStorageInner {
				store,
				writer: Mutex::new(()),
				lifecycle: RwLock::new(false),
				range_batch_size: config.range_batch_size.max(1),
				last_usage,
				idle: Mutex::new(idle),
				on_commit: RwLock::new(None),
			}),
		})
	}

	pub fn memory() -> Result<Self> {
		Self::new(StorageConfig::memory())
	}

	/// The backend, for diagnostics. Writes must go through a batch.
	pub fn store(&self) -> &Storage {
		&self.inner.store
	}

	/// Called after every successful commit, once the transaction's own
	/// hooks have run.
	pub fn set_on_commit(&self, callback: impl Fn() + Send + Sync + 'static) {
		*self.inner.on_commit.write() = Some(Arc::new(callback));
	}

	pub fn is_disposed(&self) -> bool {
		*self.inner.lifecycle.read_recursive()
	}

	pub fn begin_command(&self) -> Result<CommandTransaction<'_>> {
		let lifecycle = self.inner.lifecycle.read_recursive();
		if *lifecycle {
			warn!("rejected write transaction on disposed storage");
			return Err(Error::Disposed);
		}
		let writer = self.inner.writer.lock();
		self.touch();
		Ok(CommandTransaction::new(self, lifecycle, writer))
	}

	pub fn begin_query(&self) -> Result<QueryTransaction<'_>> {
		let lifecycle = self.inner.lifecycle.read_recursive();
		if *lifecycle {
			warn!("rejected query transaction on disposed storage");
			return Err(Error::Disposed);
		}
		self.touch();
		Ok(QueryTransaction::new(self, lifecycle))
	}

	/// Runs `f` in a new transaction. `Ok` commits and then runs the
	/// on-commit hooks outside the writer lock; `Err` discards every pending
	/// write.
	#[instrument(name = "transaction::storage::batch", level = "trace", skip(self, f))]
	pub fn batch<T, F>(&self, f: F) -> Result<T>
	where
		F: FnOnce(&mut CommandTransaction<'_>) -> Result<T>,
	{
		let mut txn = self.begin_command()?;
		match f(&mut txn) {
			Ok(value) => {
				let hooks = txn.commit()?;
				self.after_commit(hooks);
				Ok(value)
			}
			Err(err) => {
				txn.rollback();
				Err(err)
			}
		}
	}

	/// Like [`Self::batch`], but reuses `outer` when it is an active
	/// transaction of this storage. The outer transaction commits later; no
	/// nested commit happens here.
	pub fn batch_within<T, F>(&self, outer: Option<&mut CommandTransaction<'_>>, f: F) -> Result<T>
	where
		F: FnOnce(&mut CommandTransaction<'_>) -> Result<T>,
	{
		match outer {
			Some(txn) if txn.belongs_to(self) => f(txn),
			Some(_) => {
				warn!("outer transaction belongs to another storage, starting a new batch");
				self.batch(f)
			}
			None => self.batch(f),
		}
	}

	/// Runs `action` now, or after `txn` commits when one is given.
	pub fn execute_immediately_or_defer<F>(&self, txn: Option<&mut CommandTransaction<'_>>, action: F)
	where
		F: FnOnce() + Send + 'static,
	{
		match txn {
			Some(txn) => txn.defer_until_commit(action),
			None => action(),
		}
	}

	/// Rejects all future batches and queries and stops the idle worker.
	/// Waits for in-flight work; calling it from inside a batch deadlocks.
	#[instrument(name = "transaction::storage::dispose", level = "debug", skip(self))]
	pub fn dispose(&self) {
		{
			let mut disposed = self.inner.lifecycle.write();
			if *disposed {
				return;
			}
			*disposed = true;
		}
		if let Some(mut worker) = self.inner.idle.lock().take() {
			worker.stop();
		}
		debug!("disposed transactional storage");
	}

	/// Number of idle compactions run so far.
	pub fn idle_compactions(&self) -> u64 {
		self.inner.idle.lock().as_ref().map(|w| w.compactions()).unwrap_or(0)
	}

	fn touch(&self) {
		self.inner.last_usage.store(Timestamp::now().as_millis(), Ordering::Release);
	}

	fn after_commit(&self, hooks: Vec<CommitHook>) {
		for hook in hooks {
			hook();
		}
		let callback = self.inner.on_commit.read().clone();
		if let Some(callback) = callback {
			callback();
		}
	}
}

impl Drop for TransactionalStorageInner {
	fn drop(&mut self) {
		if let Some(mut worker) = self.idle.get_mut().take() {
			worker.stop();
		}
	}
}

#[cfg(test)]
mod tests {
	use std::sync::atomic::AtomicUsize;

	use rollup_core::EncodedKey;
	use rollup_store::StoreBackend;

	use super::*;

	fn key(s: &str) -> EncodedKey {
		EncodedKey::new(s.as_bytes().to_vec())
	}

	#[test]
	fn test_batch_commits_on_ok() {
		let storage = TransactionalStorage::memory().unwrap();
		storage
			.batch(|txn| {
				txn.set(&key("a"), b"1".to_vec())?;
				txn.set(&key("b"), b"2".to_vec())
			})
			.unwrap();

		let query = storage.begin_query().unwrap();
		assert_eq!(query.get(&key("a")).unwrap(), Some(b"1".to_vec()));
		assert_eq!(query.get(&key("b")).unwrap(), Some(b"2".to_vec()));
	}

	#[test]
	fn test_batch_discards_on_err() {
		let storage = TransactionalStorage::memory().unwrap();
		let result: Result<()> = storage.batch(|txn| {
			txn.set(&key("a"), b"1".to_vec())?;
			Err(Error::InvalidLevel {
				level: 7,
			})
		});
		assert_eq!(
			result,
			Err(Error::InvalidLevel {
				level: 7
			})
		);

		let query = storage.begin_query().unwrap();
		assert_eq!(query.get(&key("a")).unwrap(), None);
	}

	#[test]
	fn test_hooks_run_after_commit_only() {
		let storage = TransactionalStorage::memory().unwrap();
		let counter = Arc::new(AtomicUsize::new(0));

		let c = Arc::clone(&counter);
		storage
			.batch(|txn| {
				txn.defer_until_commit(move || {
					c.fetch_add(1, Ordering::SeqCst);
				});
				Ok(())
			})
			.unwrap();
		assert_eq!(counter.load(Ordering::SeqCst), 1);

		let c = Arc::clone(&counter);
		let _: Result<()> = storage.batch(|txn| {
			txn.defer_until_commit(move || {
				c.fetch_add(1, Ordering::SeqCst);
			});
			Err(Error::Disposed)
		});
		assert_eq!(counter.load(Ordering::SeqCst), 1);
	}

	#[test]
	fn test_hooks_can_start_new_batch() {
		let storage = TransactionalStorage::memory().unwrap();
		let inner = storage.clone();
		storage
			.batch(|txn| {
				txn.defer_until_commit(move || {
					inner.batch(|txn| txn.set(&key("hook"), b"ran".to_vec())).unwrap();
				});
				Ok(())
			})
			.unwrap();

		let query = storage.begin_query().unwrap();
		assert_eq!(query.get(&key("hook")).unwrap(), Some(b"ran".to_vec()));
	}

	#[test]
	fn test_on_commit_callback() {
		let storage = TransactionalStorage::memory().unwrap();
		let counter = Arc::new(AtomicUsize::new(0));
		let c = Arc::clone(&counter);
		storage.set_on_commit(move || {
			c.fetch_add(1, Ordering::SeqCst);
		});

		storage.batch(|txn| txn.set(&key("a"), vec![])).unwrap();
		storage.batch(|_| Ok(())).unwrap();
		assert_eq!(counter.load(Ordering::SeqCst), 2);
	}

	#[test]
	fn test_batch_within_reuses_outer() {
		let storage = TransactionalStorage::memory().unwrap();
		storage
			.batch(|outer| {
				let outer_id = outer.id();
				outer.set(&key("outer"), b"1".to_vec())?;
				storage.batch_within(Some(&mut *outer), |inner| {
					assert_eq!(inner.id(), outer_id);
					assert_eq!(inner.get(&key("outer"))?, Some(b"1".to_vec()));
					inner.set(&key("inner"), b"2".to_vec())
				})?;
				assert_eq!(outer.get(&key("inner"))?, Some(b"2".to_vec()));
				Ok(())
			})
			.unwrap();

		let query = storage.begin_query().unwrap();
		assert_eq!(query.get(&key("inner")).unwrap(), Some(b"2".to_vec()));
	}

	#[test]
	fn test_batch_within_without_outer() {
		let storage = TransactionalStorage::memory().unwrap();
		storage.batch_within(None, |txn| txn.set(&key("a"), b"1".to_vec())).unwrap();
		assert_eq!(storage.store().len().unwrap(), 1);
	}

	#[test]
	fn test_execute_immediately_or_defer() {
		let storage = TransactionalStorage::memory().unwrap();
		let counter = Arc::new(AtomicUsize::new(0));

		let c = Arc::clone(&counter);
		storage.execute_immediately_or_defer(None, move || {
			c.fetch_add(1, Ordering::SeqCst);
		});
		assert_eq!(counter.load(Ordering::SeqCst), 1);

		let c = Arc::clone(&counter);
		let observed = Arc::clone(&counter);
		storage
			.batch(|txn| {
				storage.execute_immediately_or_defer(Some(txn), move || {
					c.fetch_add(1, Ordering::SeqCst);
				});
				assert_eq!(observed.load(Ordering::SeqCst), 1);
				Ok(())
			})
			.unwrap();
		assert_eq!(counter.load(Ordering::SeqCst), 2);
	}

	#[test]
	fn test_dispose_rejects_new_work() {
		let storage = TransactionalStorage::memory().unwrap();
		storage.batch(|txn| txn.set(&key("a"), b"1".to_vec())).unwrap();

		storage.dispose();
		storage.dispose();
		assert!(storage.is_disposed());

		assert_eq!(storage.batch(|_| Ok(())), Err(Error::Disposed));
		assert!(matches!(storage.begin_query(), Err(Error::Disposed)));
	}

	#[test]
	fn test_writers_are_serialized() {
		let storage = TransactionalStorage::memory().unwrap();
		let handles: Vec<_> = (0..4)
			.map(|_| {
				let storage = storage.clone();
				std::thread::spawn(move || {
					for _ in 0..50 {
						storage.batch(|txn| {
							let current = txn
								.get(&key("counter"))?
								.map(|v| u64::from_be_bytes(v.try_into().unwrap()))
								.unwrap_or(0);
							txn.set(&key("counter"), (current + 1).to_be_bytes().to_vec())
						})
						.unwrap();
					}
				})
			})
			.collect();
		for handle in handles {
			handle.join().unwrap();
		}

		let query = storage.begin_query().unwrap();
		let value = query.get(&key("counter")).unwrap().unwrap();
		assert_eq!(u64::from_be_bytes(value.try_into().unwrap()), 200);
	}
}
