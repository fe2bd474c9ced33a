// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Background worker that compacts the backend once the storage goes idle.
//!
//! Compaction only changes physical layout; logical rows are never touched.

use std::{
	sync::{
		Arc,
		atomic::{AtomicBool, AtomicU64, Ordering},
	},
	thread::{self, JoinHandle},
	time::Duration,
};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, bounded};
use rollup_core::{Error, Result, Timestamp};
use rollup_store::{Storage, StoreBackend};
use tracing::{debug, error, trace};

use crate::IdleConfig;

#[derive(Debug)]
enum IdleMessage {
	Shutdown,
}

pub(crate) struct IdleWorker {
	sender: Sender<IdleMessage>,
	running: Arc<AtomicBool>,
	compactions: Arc<AtomicU64>,
	worker: Option<JoinHandle<()>>,
}

impl IdleWorker {
	pub(crate) fn new(config: IdleConfig, store: Storage, last_usage: Arc<AtomicU64>) -> Result<Self> {
		let (sender, receiver) = bounded(1);
		let running = Arc::new(AtomicBool::new(true));
		let compactions = Arc::new(AtomicU64::new(0));

		let worker_running = Arc::clone(&running);
		let worker_compactions = Arc::clone(&compactions);
		let worker = thread::Builder::new()
			.name("idle-compaction".to_string())
			.spawn(move || {
				Self::worker_loop(receiver, store, config, last_usage, worker_running, worker_compactions);
			})
			.map_err(|e| Error::Worker(format!("failed to spawn idle compaction thread: {e}")))?;

		Ok(Self {
			sender,
			running,
			compactions,
			worker: Some(worker),
		})
	}

	pub(crate) fn compactions(&self) -> u64 {
		self.compactions.load(Ordering::Acquire)
	}

	/// Stop the worker gracefully.
	pub(crate) fn stop(&mut self) {
		if !self.running.swap(false, Ordering::AcqRel) {
			return;
		}

		let _ = self.sender.send(IdleMessage::Shutdown);

		if let Some(worker) = self.worker.take() {
			let _ = worker.join();
		}
	}

	fn worker_loop(
		receiver: Receiver<IdleMessage>,
		store: Storage,
		config: IdleConfig,
		last_usage: Arc<AtomicU64>,
		running: Arc<AtomicBool>,
		compactions: Arc<AtomicU64>,
	) {
		debug!("Idle compaction worker started");

		let idle_after = config.idle_after.as_millis() as u64;
		let poll_interval = config.poll_interval.max(Duration::from_millis(1));
		// usage stamp that the last compaction already covered
		let mut compacted_at: Option<u64> = None;

		while running.load(Ordering::Acquire) {
			match receiver.recv_timeout(poll_interval) {
				Ok(IdleMessage::Shutdown) => {
					debug!("Idle compaction worker received shutdown signal");
					break;
				}
				Err(RecvTimeoutError::Disconnected) => {
					debug!("Idle compaction worker channel disconnected");
					break;
				}
				Err(RecvTimeoutError::Timeout) => {}
			}

			let last = last_usage.load(Ordering::Acquire);
			if compacted_at == Some(last) {
				continue;
			}
			let now = Timestamp::now().as_millis();
			if now.saturating_sub(last) < idle_after {
				continue;
			}

			trace!(idle_ms = now.saturating_sub(last), "storage idle, compacting");
			match store.compact() {
				Ok(()) => {
					compactions.fetch_add(1, Ordering::AcqRel);
				}
				Err(err) => error!(%err, "idle compaction failed"),
			}
			compacted_at = Some(last);
		}

		debug!("Idle compaction worker stopped");
	}
}

impl Drop for IdleWorker {
	fn drop(&mut self) {
		self.stop();
	}
}
